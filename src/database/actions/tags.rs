use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::ApiError,
    schema::{Tag, TagPayload, Uuid},
    validation::validate_hex_color,
};

pub async fn fetch_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn get_tag(tag_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(tag_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a tag. Name, color and slug are each unique across the catalog,
/// pre-checked one by one so the caller learns which field collided.
pub async fn create_tag(payload: &TagPayload, pool: &Pool<Postgres>) -> Result<Tag, ApiError> {
    validate_hex_color(&payload.color)?;

    let name_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE LOWER(name) = LOWER($1)")
        .bind(&payload.name)
        .fetch_optional(pool)
        .await?;
    if name_taken.is_some() {
        return Err(ApiError::conflict("A tag with this name already exists"));
    }

    let color_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE LOWER(color) = LOWER($1)")
        .bind(&payload.color)
        .fetch_optional(pool)
        .await?;
    if color_taken.is_some() {
        return Err(ApiError::conflict("A tag with this color already exists"));
    }

    let slug_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(&payload.slug)
        .fetch_optional(pool)
        .await?;
    if slug_taken.is_some() {
        return Err(ApiError::conflict("A tag with this slug already exists"));
    }

    let tag: Tag = sqlx::query_as(
        "
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        RETURNING *
    ",
    )
    .bind(&payload.name)
    .bind(&payload.color)
    .bind(&payload.slug)
    .fetch_one(pool)
    .await?;

    Ok(tag)
}

/// Verifies that every referenced tag id exists before a recipe write.
pub async fn tags_exist(tag_ids: &[Uuid], pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let (found,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_one(pool)
        .await?;

    if found != tag_ids.len() as i64 {
        return Err(ApiError::validation(
            "tags",
            "One or more referenced tags do not exist",
        ));
    }
    Ok(())
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Replaces the tag set of a recipe inside an open transaction.
pub async fn replace_recipe_tags(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await?;

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tr)
            .await?;
    }

    Ok(())
}
