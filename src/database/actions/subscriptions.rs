use sqlx::{Pool, Postgres};

use crate::{
    constants::USER_COUNT_PER_PAGE,
    error::ApiError,
    pagination::PageContext,
    schema::{RecipeSummary, SubscriptionAuthor, UserRow, Uuid},
};

use super::users::get_user_by_id;

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// The self-subscription check runs before the author lookup, so subscribing
/// to your own missing id still reads as a self-subscription error.
pub fn ensure_not_self(user_id: Uuid, author_id: Uuid) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(ApiError::conflict("Cannot subscribe to yourself"));
    }
    Ok(())
}

pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionAuthor, ApiError> {
    ensure_not_self(user_id, author_id)?;

    let author = get_user_by_id(pool, author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user exists with specified id"))?;

    let result = sqlx::query(
        "
        INSERT INTO subscriptions (user_id, author_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::conflict("Already subscribed to this author"));
    }

    let recipes = list_author_recipes(author_id, pool).await?;
    let recipes_count = recipes.len() as i64;

    Ok(SubscriptionAuthor {
        email: author.email,
        id: author.id,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes,
        recipes_count,
    })
}

pub async fn unsubscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::not_found("Not subscribed to this author"));
    }

    Ok(())
}

pub async fn list_author_recipes(
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeSummary>, ApiError> {
    let rows: Vec<RecipeSummary> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY id
    ",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Authors the user follows, each carrying their recipes, newest page first.
pub async fn fetch_subscriptions(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionAuthor>, ApiError> {
    let authors: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = authors.first().map(|a| a.count).unwrap_or(0);

    let mut rows = Vec::with_capacity(authors.len());
    for author in authors {
        let recipes = list_author_recipes(author.id, pool).await?;
        let recipes_count = recipes.len() as i64;
        rows.push(SubscriptionAuthor {
            email: author.email,
            id: author.id,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: true,
            recipes,
            recipes_count,
        });
    }

    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::super::testing::seed_user;
    use super::*;

    #[test]
    fn subscribing_to_yourself_is_rejected() {
        assert!(matches!(ensure_not_self(3, 3), Err(ApiError::Conflict(_))));
        assert!(ensure_not_self(3, 4).is_ok());
    }

    #[sqlx::test]
    async fn self_subscription_wins_over_unknown_author(pool: PgPool) {
        // No user with id 42 exists; the self check still fires first.
        let err = subscribe(42, 42, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[sqlx::test]
    async fn subscribe_twice_conflicts_unsubscribe_twice_not_found(pool: PgPool) {
        let follower = seed_user(&pool, "follower").await;
        let author = seed_user(&pool, "author").await;

        let sub = subscribe(follower.id, author.id, &pool).await.unwrap();
        assert!(sub.is_subscribed);
        assert_eq!(sub.id, author.id);

        let err = subscribe(follower.id, author.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        unsubscribe(follower.id, author.id, &pool).await.unwrap();
        let err = unsubscribe(follower.id, author.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[sqlx::test]
    async fn unknown_author_is_not_found(pool: PgPool) {
        let follower = seed_user(&pool, "follower").await;
        let err = subscribe(follower.id, follower.id + 1, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
