use sqlx::{Pool, Postgres};

use crate::{
    error::ApiError,
    schema::{CartQuantity, RecipeSummary, Uuid},
};

use super::recipes::get_recipe_summary;

pub async fn in_shopping_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM shopping_carts WHERE recipe_id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn add_to_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ApiError> {
    let recipe = get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    let result = sqlx::query(
        "
        INSERT INTO shopping_carts (recipe_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(recipe_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::conflict("Recipe is already in shopping cart"));
    }

    Ok(recipe)
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM shopping_carts WHERE recipe_id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::not_found("Recipe is not in shopping cart"));
    }

    Ok(())
}

pub async fn count_cart_recipes(user_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shopping_carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Every quantity row of every recipe in the user's cart, ordered by when
/// the recipe entered the cart and then by the recipe's own row order. The
/// aggregator depends on this ordering.
pub async fn list_cart_quantities(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartQuantity>, ApiError> {
    let rows: Vec<CartQuantity> = sqlx::query_as(
        "
        SELECT i.name, i.measurement_unit, q.amount
        FROM shopping_carts sc
        INNER JOIN recipe_ingredients q ON q.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = q.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.id, q.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
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

        let summary = add_to_cart(recipe_id, user.id, &pool).await.unwrap();
        assert_eq!(summary.id, recipe_id);
        assert_eq!(count_cart_recipes(user.id, &pool).await.unwrap(), 1);

        let err = add_to_cart(recipe_id, user.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        remove_from_cart(recipe_id, user.id, &pool).await.unwrap();
        assert_eq!(count_cart_recipes(user.id, &pool).await.unwrap(), 0);

        let err = remove_from_cart(recipe_id, user.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[sqlx::test]
    async fn cart_quantities_follow_cart_insertion_order(pool: PgPool) {
        let user = seed_user(&pool, "cook").await;
        let (tag, flour) = seed_catalog(&pool).await;

        let pancakes = seed_recipe(
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
        let bread = seed_recipe(
            &pool,
            user.id,
            "Bread",
            tag.id,
            &[QuantityPayload {
                id: flour.id,
                amount: 500,
            }],
        )
        .await;

        add_to_cart(bread, user.id, &pool).await.unwrap();
        add_to_cart(pancakes, user.id, &pool).await.unwrap();

        let rows = list_cart_quantities(user.id, &pool).await.unwrap();
        let amounts: Vec<i32> = rows.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![500, 200]);
    }
}
