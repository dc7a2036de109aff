use sqlx::{Pool, Postgres};

use crate::{
    error::ApiError,
    schema::{Ingredient, IngredientPayload, QuantityPayload, Uuid},
};

/// Lists the ingredient catalog, optionally narrowed by a case-insensitive
/// substring match on the name. Unpaginated, the catalog is served whole.
pub async fn fetch_ingredients(
    search: Option<String>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let pattern = format!("%{}%", search.unwrap_or_default());

    let rows: Vec<Ingredient> = sqlx::query_as(
        "
        SELECT * FROM ingredients
        WHERE name ILIKE $1
        ORDER BY name
    ",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_ingredient(
    ingredient_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(ingredient_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a catalog ingredient. The same name may appear under several
/// measurement units, so uniqueness covers the (name, unit) pair.
pub async fn create_ingredient(
    payload: &IngredientPayload,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    let taken: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM ingredients WHERE LOWER(name) = LOWER($1) AND LOWER(measurement_unit) = LOWER($2)",
    )
    .bind(&payload.name)
    .bind(&payload.measurement_unit)
    .fetch_optional(pool)
    .await?;
    if taken.is_some() {
        return Err(ApiError::conflict(
            "An ingredient with this name and measurement unit already exists",
        ));
    }

    let ingredient: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING *
    ",
    )
    .bind(&payload.name)
    .bind(&payload.measurement_unit)
    .fetch_one(pool)
    .await?;

    Ok(ingredient)
}

/// Verifies that every ingredient referenced by a recipe write exists.
pub async fn ingredients_exist(
    quantities: &[QuantityPayload],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let ids: Vec<Uuid> = quantities.iter().map(|q| q.id).collect();

    let (found,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_one(pool)
        .await?;

    if found != ids.len() as i64 {
        return Err(ApiError::validation(
            "ingredients",
            "One or more referenced ingredients do not exist",
        ));
    }
    Ok(())
}
