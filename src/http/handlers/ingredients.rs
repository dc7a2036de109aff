use serde::Deserialize;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::{
    actions,
    error::ApiError,
    jwt::SessionData,
    permissions::ActionType,
    schema::{IngredientPayload, Uuid},
};

#[derive(Debug, Default, Deserialize)]
pub struct IngredientListQuery {
    pub name: Option<String>,
}

pub async fn list_ingredients(
    query: IngredientListQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let ingredients = actions::fetch_ingredients(query.name, &pool).await?;
    Ok(warp::reply::json(&ingredients))
}

pub async fn get_ingredient(
    ingredient_id: Uuid,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let ingredient = actions::get_ingredient(ingredient_id, &pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No ingredient exists with specified id"))?;
    Ok(warp::reply::json(&ingredient))
}

pub async fn create_ingredient(
    session: SessionData,
    payload: IngredientPayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;

    let ingredient = actions::create_ingredient(&payload, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&ingredient),
        StatusCode::CREATED,
    ))
}
