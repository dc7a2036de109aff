use std::path::PathBuf;

use serde::Deserialize;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::{
    actions,
    actions::RecipeFilters,
    constants::{SHOPCART_FILENAME, TEXT_CSV},
    jwt::SessionData,
    media::{discard_image, resolve_image},
    pagination::PageContext,
    permissions::ActionType,
    schema::{Recipe, RecipePayload, Uuid},
    shopping_list::{aggregate_quantities, render_csv},
    validation::{validate_recipe_create, validate_recipe_update},
};

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub offset: Option<i64>,
    /// Comma-separated tag slugs.
    pub tags: Option<String>,
    pub author: Option<Uuid>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

impl RecipeListQuery {
    fn filters(&self) -> RecipeFilters {
        RecipeFilters {
            tags: self
                .tags
                .as_deref()
                .map(|tags| tags.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            author: self.author,
            is_favorited: self.is_favorited.unwrap_or(0) == 1,
            is_in_shopping_cart: self.is_in_shopping_cart.unwrap_or(0) == 1,
        }
    }
}

pub async fn list_recipes(
    session: Option<SessionData>,
    query: RecipeListQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let page = actions::fetch_recipes(
        &query.filters(),
        query.offset.unwrap_or(0).max(0),
        viewer,
        &pool,
    )
    .await?;

    let PageContext {
        rows,
        total_rows,
        next_offset,
        prev_offset,
        message,
    } = page;

    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        details.push(actions::build_recipe_detail(Recipe::from(row), viewer, &pool).await?);
    }

    Ok(warp::reply::json(&PageContext {
        rows: details,
        total_rows,
        next_offset,
        prev_offset,
        message,
    }))
}

pub async fn get_recipe(
    recipe_id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let detail = actions::get_recipe_detail(recipe_id, viewer, &pool).await?;
    Ok(warp::reply::json(&detail))
}

pub async fn create_recipe(
    session: SessionData,
    payload: RecipePayload,
    pool: Pool<Postgres>,
    media_root: PathBuf,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_recipe_create(&payload)?;

    // Presence is guaranteed by the validator above.
    let raw_image = payload.image.as_deref().unwrap_or_default();
    let image = resolve_image(&media_root, raw_image)?;
    let freshly_stored = raw_image.starts_with("data:image");

    let recipe_id = match actions::create_recipe(session.user_id, &payload, &image, &pool).await {
        Ok(recipe_id) => recipe_id,
        Err(e) => {
            // The database checks rejected the write after the image landed
            // on disk; do not leave the file orphaned.
            if freshly_stored {
                discard_image(&media_root, &image);
            }
            return Err(e.into());
        }
    };

    let detail = actions::get_recipe_detail(recipe_id, Some(session.user_id), &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&detail),
        StatusCode::CREATED,
    ))
}

pub async fn update_recipe(
    recipe_id: Uuid,
    session: SessionData,
    payload: RecipePayload,
    pool: Pool<Postgres>,
    media_root: PathBuf,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::get_recipe_mut(recipe_id, &session, &pool).await?;
    validate_recipe_update(&payload)?;

    let image = match payload.image.as_deref() {
        Some(value) => Some(resolve_image(&media_root, value)?),
        None => None,
    };
    let freshly_stored = payload
        .image
        .as_deref()
        .is_some_and(|value| value.starts_with("data:image"));

    if let Err(e) = actions::update_recipe(&recipe, &payload, image.as_deref(), &pool).await {
        if freshly_stored {
            if let Some(image) = image.as_deref() {
                discard_image(&media_root, image);
            }
        }
        return Err(e.into());
    }

    let detail = actions::get_recipe_detail(recipe_id, Some(session.user_id), &pool).await?;
    Ok(warp::reply::json(&detail))
}

pub async fn delete_recipe(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::get_recipe_mut(recipe_id, &session, &pool).await?;
    actions::delete_recipe(recipe.id, &pool).await?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn add_favorite(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;

    let summary = actions::add_to_favorites(recipe_id, session.user_id, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&summary),
        StatusCode::CREATED,
    ))
}

pub async fn remove_favorite(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;

    actions::remove_from_favorites(recipe_id, session.user_id, &pool).await?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn add_to_cart(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let summary = actions::add_to_cart(recipe_id, session.user_id, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&summary),
        StatusCode::CREATED,
    ))
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    actions::remove_from_cart(recipe_id, session.user_id, &pool).await?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

/// Aggregates the caller's cart into a CSV attachment. An empty cart yields
/// 204 with no body.
pub async fn download_shopping_cart(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<warp::reply::Response, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    if actions::count_cart_recipes(session.user_id, &pool).await? == 0 {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let quantities = actions::list_cart_quantities(session.user_id, &pool).await?;
    let csv = render_csv(&aggregate_quantities(quantities));

    let reply = warp::reply::with_header(csv, "content-type", TEXT_CSV);
    let reply = warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename={SHOPCART_FILENAME}"),
    );
    Ok(reply.into_response())
}
