use sqlx::{Pool, Postgres};

use crate::schema::{
    Ingredient, IngredientPayload, QuantityPayload, RecipePayload, RegisterPayload, Tag,
    TagPayload, User, Uuid,
};

use super::{create_ingredient, create_recipe, create_tag, register_user};

pub async fn seed_user(pool: &Pool<Postgres>, username: &str) -> User {
    let payload = RegisterPayload {
        email: format!("{username}@example.org"),
        username: username.to_string(),
        first_name: String::from("Anna"),
        last_name: String::from("Petrova"),
        password: String::from("hunter2"),
    };

    register_user(&payload, "<hash>", pool).await.unwrap()
}

pub async fn seed_catalog(pool: &Pool<Postgres>) -> (Tag, Ingredient) {
    let tag = create_tag(
        &TagPayload {
            name: String::from("Breakfast"),
            color: String::from("#AABBCC"),
            slug: String::from("breakfast"),
        },
        pool,
    )
    .await
    .unwrap();

    let ingredient = create_ingredient(
        &IngredientPayload {
            name: String::from("flour"),
            measurement_unit: String::from("g"),
        },
        pool,
    )
    .await
    .unwrap();

    (tag, ingredient)
}

pub async fn seed_recipe(
    pool: &Pool<Postgres>,
    author_id: Uuid,
    name: &str,
    tag_id: Uuid,
    quantities: &[QuantityPayload],
) -> Uuid {
    let payload = RecipePayload {
        name: Some(name.to_string()),
        text: Some(String::from("Mix and fry.")),
        cooking_time: Some(20),
        image: Some(String::from("media/fixture.png")),
        tags: Some(vec![tag_id]),
        ingredients: Some(quantities.to_vec()),
    };

    create_recipe(author_id, &payload, "media/fixture.png", pool)
        .await
        .unwrap()
}
