use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::{
    actions,
    error::ApiError,
    jwt::SessionData,
    permissions::ActionType,
    schema::{TagPayload, Uuid},
};

pub async fn list_tags(pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tags = actions::fetch_tags(&pool).await?;
    Ok(warp::reply::json(&tags))
}

pub async fn get_tag(tag_id: Uuid, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tag = actions::get_tag(tag_id, &pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No tag exists with specified id"))?;
    Ok(warp::reply::json(&tag))
}

pub async fn create_tag(
    session: SessionData,
    payload: TagPayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;

    let tag = actions::create_tag(&payload, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&tag),
        StatusCode::CREATED,
    ))
}
