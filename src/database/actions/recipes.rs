use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    error::ApiError,
    jwt::SessionData,
    pagination::PageContext,
    permissions::ActionType,
    schema::{
        QuantityPayload, Recipe, RecipeDetail, RecipePayload, RecipeQuantity, RecipeRow,
        RecipeSummary, Uuid,
    },
};

use super::{
    carts::in_shopping_cart,
    favorites::is_favorite,
    ingredients::ingredients_exist,
    tags::{list_recipe_tags, replace_recipe_tags, tags_exist},
    users::get_user_profile,
};

/// Listing filters, all optional and freely combined. The favorite and cart
/// filters only apply when the caller is logged in.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilters {
    pub tags: Vec<String>,
    pub author: Option<Uuid>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn fetch_recipes(
    filters: &RecipeFilters,
    offset: i64,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE 1 = 1");

    if !filters.tags.is_empty() {
        query.push(
            "
            AND r.id IN (
                SELECT rt.recipe_id FROM recipe_tags rt
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE t.slug = ANY(",
        );
        query.push_bind(filters.tags.clone());
        query.push("))");
    }

    if let Some(author_id) = filters.author {
        query.push(" AND r.author_id = ");
        query.push_bind(author_id);
    }

    if let Some(viewer_id) = viewer {
        if filters.is_favorited {
            query.push(" AND r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ");
            query.push_bind(viewer_id);
            query.push(")");
        }
        if filters.is_in_shopping_cart {
            query.push(" AND r.id IN (SELECT recipe_id FROM shopping_carts WHERE user_id = ");
            query.push_bind(viewer_id);
            query.push(")");
        }
    }

    query.push(" ORDER BY r.id DESC LIMIT ");
    query.push_bind(RECIPE_COUNT_PER_PAGE);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_recipe(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_recipe_summary(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeSummary>, ApiError> {
    let row: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    Ok(row)
}

/// Case-insensitive lookup by name, used for the uniqueness check on create.
pub async fn find_recipe(name: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM recipes WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(id,)| id))
}

/// Fetches a recipe for modification. Authors manage their own recipes,
/// admins manage everyone's.
pub async fn get_recipe_mut(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    if recipe.author_id == session.user_id {
        session.authenticate(ActionType::ManageOwnRecipes)?;
    } else {
        session.authenticate(ActionType::ManageAllRecipes)?;
    }

    Ok(recipe)
}

pub async fn list_recipe_quantities(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeQuantity>, ApiError> {
    let rows: Vec<RecipeQuantity> = sqlx::query_as(
        "
        SELECT q.recipe_id, q.ingredient_id, i.name, i.measurement_unit, q.amount
        FROM recipe_ingredients q
        INNER JOIN ingredients i ON i.id = q.ingredient_id
        WHERE q.recipe_id = $1
        ORDER BY q.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn replace_recipe_quantities(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    quantities: &[QuantityPayload],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await?;

    for quantity in quantities {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(quantity.id)
        .bind(quantity.amount)
        .execute(&mut **tr)
        .await?;
    }

    Ok(())
}

/// Creates a recipe with its tag and ingredient associations in one
/// transaction. The payload has passed field validation and the image has
/// already been stored; `image` is the servable path.
pub async fn create_recipe(
    author_id: Uuid,
    payload: &RecipePayload,
    image: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let missing = |field| ApiError::validation(field, "This field is required");

    let name = payload.name.as_deref().ok_or_else(|| missing("name"))?;
    let text = payload.text.as_deref().ok_or_else(|| missing("text"))?;
    let cooking_time = payload.cooking_time.ok_or_else(|| missing("cooking_time"))?;
    let tags = payload.tags.as_deref().ok_or_else(|| missing("tags"))?;
    let quantities = payload
        .ingredients
        .as_deref()
        .ok_or_else(|| missing("ingredients"))?;

    if find_recipe(name, pool).await?.is_some() {
        return Err(ApiError::conflict("A recipe with this name already exists"));
    }
    tags_exist(tags, pool).await?;
    ingredients_exist(quantities, pool).await?;

    let mut tr = pool.begin().await?;

    let (recipe_id,): (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(name)
    .bind(image)
    .bind(text)
    .bind(cooking_time)
    .fetch_one(&mut *tr)
    .await?;

    replace_recipe_tags(&mut tr, recipe_id, tags).await?;
    replace_recipe_quantities(&mut tr, recipe_id, quantities).await?;

    tr.commit().await?;
    Ok(recipe_id)
}

/// Partial update. Supplied scalars overwrite, omitted ones keep their
/// stored values; a supplied tag or ingredient list replaces the whole set.
pub async fn update_recipe(
    recipe: &Recipe,
    payload: &RecipePayload,
    image: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if let Some(tags) = payload.tags.as_deref() {
        tags_exist(tags, pool).await?;
    }
    if let Some(quantities) = payload.ingredients.as_deref() {
        ingredients_exist(quantities, pool).await?;
    }

    let mut tr = pool.begin().await?;

    sqlx::query(
        "
        UPDATE recipes
        SET name = COALESCE($1, name),
            text = COALESCE($2, text),
            cooking_time = COALESCE($3, cooking_time),
            image = COALESCE($4, image)
        WHERE id = $5
    ",
    )
    .bind(payload.name.as_deref())
    .bind(payload.text.as_deref())
    .bind(payload.cooking_time)
    .bind(image)
    .bind(recipe.id)
    .execute(&mut *tr)
    .await?;

    if let Some(tags) = payload.tags.as_deref() {
        replace_recipe_tags(&mut tr, recipe.id, tags).await?;
    }
    if let Some(quantities) = payload.ingredients.as_deref() {
        replace_recipe_quantities(&mut tr, recipe.id, quantities).await?;
    }

    tr.commit().await?;
    Ok(())
}

pub async fn delete_recipe(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Assembles the full detail view of a recipe as seen by an optional viewer.
pub async fn build_recipe_detail(
    recipe: Recipe,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let author = get_user_profile(recipe.author_id, viewer, pool).await?;
    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_quantities(recipe.id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => (
            is_favorite(recipe.id, viewer_id, pool).await?,
            in_shopping_cart(recipe.id, viewer_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn get_recipe_detail(
    recipe_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    build_recipe_detail(recipe, viewer, pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::super::ingredients::create_ingredient;
    use super::super::testing::{seed_catalog, seed_recipe, seed_user};
    use super::*;
    use crate::schema::IngredientPayload;

    #[sqlx::test]
    async fn update_replaces_the_whole_quantity_set(pool: PgPool) {
        let user = seed_user(&pool, "cook").await;
        let (tag, flour) = seed_catalog(&pool).await;
        let sugar = create_ingredient(
            &IngredientPayload {
                name: String::from("sugar"),
                measurement_unit: String::from("g"),
            },
            &pool,
        )
        .await
        .unwrap();

        let recipe_id = seed_recipe(
            &pool,
            user.id,
            "Pancakes",
            tag.id,
            &[
                QuantityPayload {
                    id: flour.id,
                    amount: 200,
                },
                QuantityPayload {
                    id: sugar.id,
                    amount: 50,
                },
            ],
        )
        .await;

        let recipe = get_recipe(recipe_id, &pool).await.unwrap().unwrap();
        let patch = RecipePayload {
            ingredients: Some(vec![QuantityPayload {
                id: sugar.id,
                amount: 75,
            }]),
            ..RecipePayload::default()
        };
        update_recipe(&recipe, &patch, None, &pool).await.unwrap();

        // Persisted quantities equal exactly the supplied list.
        let quantities = list_recipe_quantities(recipe_id, &pool).await.unwrap();
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities[0].ingredient_id, sugar.id);
        assert_eq!(quantities[0].amount, 75);
        assert_eq!(quantities[0].name, "sugar");

        // Omitted scalars keep their stored values.
        let after = get_recipe(recipe_id, &pool).await.unwrap().unwrap();
        assert_eq!(after.name, "Pancakes");
        assert_eq!(after.cooking_time, 20);
    }

    #[sqlx::test]
    async fn create_rejects_a_duplicate_name(pool: PgPool) {
        let user = seed_user(&pool, "cook").await;
        let (tag, flour) = seed_catalog(&pool).await;
        let quantities = [QuantityPayload {
            id: flour.id,
            amount: 200,
        }];
        seed_recipe(&pool, user.id, "Pancakes", tag.id, &quantities).await;

        let payload = RecipePayload {
            name: Some(String::from("pancakes")),
            text: Some(String::from("Again.")),
            cooking_time: Some(15),
            image: Some(String::from("media/fixture.png")),
            tags: Some(vec![tag.id]),
            ingredients: Some(quantities.to_vec()),
        };
        let err = create_recipe(user.id, &payload, "media/fixture.png", &pool)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
