use sqlx::{Pool, Postgres};

use crate::{
    error::ApiError,
    schema::{RecipeSummary, Uuid},
};

use super::recipes::get_recipe_summary;

pub async fn is_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE recipe_id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// Adds a recipe to the caller's favorites. Adding twice is a conflict, not
/// a no-op; the compact recipe form is returned on success.
pub async fn add_to_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ApiError> {
    let recipe = get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    let result = sqlx::query(
        "
        INSERT INTO favorites (recipe_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(recipe_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::conflict("Recipe is already in favorites"));
    }

    Ok(recipe)
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM favorites WHERE recipe_id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::not_found("Recipe is not in favorites"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::super::testing::{seed_catalog, seed_recipe, seed_user};
    use super::*;
    use crate::schema::QuantityPayload;

    #[sqlx::test]
    async fn add_twice_conflicts_remove_twice_not_found(pool: PgPool) {
        let user = seed_user(&pool, "cook").await;
        let (tag, flour) = seed_catalog(&pool).await;
        let recipe_id = seed_recipe(
            &pool,
            user.id,
            "Pancakes",
            tag.id,
            &[QuantityPayload {
                id: flour.id,
                amount: 200,
            }],
        )
        .await;

        let summary = add_to_favorites(recipe_id, user.id, &pool).await.unwrap();
        assert_eq!(summary.id, recipe_id);
        assert!(is_favorite(recipe_id, user.id, &pool).await.unwrap());

        let err = add_to_favorites(recipe_id, user.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        remove_from_favorites(recipe_id, user.id, &pool).await.unwrap();
        let err = remove_from_favorites(recipe_id, user.id, &pool)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[sqlx::test]
    async fn favoriting_an_unknown_recipe_is_not_found(pool: PgPool) {
        let user = seed_user(&pool, "cook").await;
        let err = add_to_favorites(4242, user.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
