use serde::Deserialize;
use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::{
    actions,
    constants::SESSION_COOKIE,
    cryptography::hash_password,
    error::ApiError,
    jwt::SessionData,
    permissions::ActionType,
    schema::{LoginPayload, RegisterPayload, UserProfile, Uuid},
    validation::{validate_email, validate_username},
};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub offset: Option<i64>,
    pub search: Option<String>,
}

pub async fn register(
    payload: RegisterPayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("password", "This field is required").into());
    }

    let password_hash =
        hash_password(&payload.password).map_err(|e| ApiError::Config(format!("{e}")))?;
    let user = actions::register_user(&payload, &password_hash, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&UserProfile::from_user(user, false)),
        StatusCode::CREATED,
    ))
}

/// Exchanges credentials for a session cookie. The token also travels in the
/// body so non-browser clients can store it themselves.
pub async fn login(payload: LoginPayload, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let token = actions::login_user(&payload.username, &payload.password, &pool).await?;

    let reply = warp::reply::json(&json!({ "auth_token": token }));
    Ok(warp::reply::with_header(
        reply,
        "set-cookie",
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age=86400"),
    ))
}

pub async fn logout(_session: SessionData) -> Result<impl Reply, Rejection> {
    let reply = warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT);
    Ok(warp::reply::with_header(
        reply,
        "set-cookie",
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0"),
    ))
}

pub async fn me(session: SessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let profile = actions::get_user_profile(session.user_id, Some(session.user_id), &pool).await?;
    Ok(warp::reply::json(&profile))
}

pub async fn list_users(
    _session: SessionData,
    query: UserListQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let pattern = format!("%{}%", query.search.unwrap_or_default());
    let page = actions::fetch_users(query.offset.unwrap_or(0).max(0), pattern, &pool).await?;
    Ok(warp::reply::json(&page))
}

pub async fn get_user(
    user_id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let profile = actions::get_user_profile(user_id, viewer, &pool).await?;
    Ok(warp::reply::json(&profile))
}

pub async fn list_subscriptions(
    session: SessionData,
    query: UserListQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let page =
        actions::fetch_subscriptions(session.user_id, query.offset.unwrap_or(0).max(0), &pool)
            .await?;
    Ok(warp::reply::json(&page))
}

pub async fn subscribe(
    author_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = actions::subscribe(session.user_id, author_id, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&author),
        StatusCode::CREATED,
    ))
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    actions::unsubscribe(session.user_id, author_id, &pool).await?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}
