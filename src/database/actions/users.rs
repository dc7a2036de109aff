use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography::verify_password, jwt::generate_jwt_session},
    constants::USER_COUNT_PER_PAGE,
    error::ApiError,
    pagination::PageContext,
    schema::{RegisterPayload, User, UserProfile, UserRow, Uuid},
};

use super::subscriptions::is_subscribed;

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user from a registration payload. The password arrives in the
/// clear and is stored as an argon2 hash; email and username conflicts are
/// pre-checked so each yields its own message.
pub async fn register_user(
    payload: &RegisterPayload,
    password_hash: &str,
    pool: &Pool<Postgres>,
) -> Result<User, ApiError> {
    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    if get_user(pool, &payload.username).await?.is_some() {
        return Err(ApiError::conflict(
            "A user with this username already exists",
        ));
    }

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn login_user(
    username: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = match get_user(pool, username).await? {
        Some(user) => user,
        None => return Err(ApiError::InvalidSession(String::from("Invalid credentials"))),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|e| ApiError::Config(format!("Stored password hash is unreadable: {e}")))?;
    if !authenticated {
        return Err(ApiError::InvalidSession(String::from("Invalid credentials")));
    }

    Ok(generate_jwt_session(&user))
}

pub async fn fetch_users(
    offset: i64,
    search: String,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM users u
        WHERE u.username ILIKE $1 OR u.email ILIKE $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(search)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|u| u.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);
    Ok(page)
}

/// Public profile of a user as seen by an (optional) viewer.
pub async fn get_user_profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user exists with specified id"))?;

    let subscribed = match viewer {
        Some(viewer) => is_subscribed(viewer, user.id, pool).await?,
        None => false,
    };

    Ok(UserProfile::from_user(user, subscribed))
}
