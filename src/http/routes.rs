use std::convert::Infallible;
use std::path::PathBuf;

use sqlx::{Pool, Postgres};
use warp::reject::Rejection;
use warp::reply::Reply;
use warp::Filter;

use crate::middleware::{with_possible_session, with_session};

use super::handlers::{ingredients, recipes, tags, users};

fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

fn with_media_root(
    media_root: PathBuf,
) -> impl Filter<Extract = (PathBuf,), Error = Infallible> + Clone {
    warp::any().map(move || media_root.clone())
}

/// The full filter tree of the API. Rejection recovery is applied by the
/// caller so tests can assert on raw rejections.
pub fn routes(
    pool: Pool<Postgres>,
    media_root: PathBuf,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(users::register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(users::login);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_session())
        .and_then(users::logout);

    let user_list = warp::path!("users")
        .and(warp::get())
        .and(with_session())
        .and(warp::query::<users::UserListQuery>())
        .and(with_pool(pool.clone()))
        .and_then(users::list_users);

    let user_me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(users::me);

    let user_subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session())
        .and(warp::query::<users::UserListQuery>())
        .and(with_pool(pool.clone()))
        .and_then(users::list_subscriptions);

    let user_get = warp::path!("users" / i32)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool(pool.clone()))
        .and_then(users::get_user);

    let user_subscribe = warp::path!("users" / i32 / "subscribe")
        .and(warp::post())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(users::subscribe);

    let user_unsubscribe = warp::path!("users" / i32 / "subscribe")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(users::unsubscribe);

    let tag_list = warp::path!("tags")
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(tags::list_tags);

    let tag_get = warp::path!("tags" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(tags::get_tag);

    let tag_create = warp::path!("tags")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(tags::create_tag);

    let ingredient_list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<ingredients::IngredientListQuery>())
        .and(with_pool(pool.clone()))
        .and_then(ingredients::list_ingredients);

    let ingredient_get = warp::path!("ingredients" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(ingredients::get_ingredient);

    let ingredient_create = warp::path!("ingredients")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(ingredients::create_ingredient);

    let recipe_download_cart = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::download_shopping_cart);

    let recipe_list = warp::path!("recipes")
        .and(warp::get())
        .and(with_possible_session())
        .and(warp::query::<recipes::RecipeListQuery>())
        .and(with_pool(pool.clone()))
        .and_then(recipes::list_recipes);

    let recipe_get = warp::path!("recipes" / i32)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::get_recipe);

    let recipe_create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and(with_media_root(media_root.clone()))
        .and_then(recipes::create_recipe);

    let recipe_update = warp::path!("recipes" / i32)
        .and(warp::patch())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and(with_media_root(media_root.clone()))
        .and_then(recipes::update_recipe);

    let recipe_delete = warp::path!("recipes" / i32)
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::delete_recipe);

    let favorite_add = warp::path!("recipes" / i32 / "favorite")
        .and(warp::post())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::add_favorite);

    let favorite_remove = warp::path!("recipes" / i32 / "favorite")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::remove_favorite);

    let cart_add = warp::path!("recipes" / i32 / "shopping_cart")
        .and(warp::post())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(recipes::add_to_cart);

    let cart_remove = warp::path!("recipes" / i32 / "shopping_cart")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool))
        .and_then(recipes::remove_from_cart);

    let media = warp::path("media").and(warp::fs::dir(media_root));

    register
        .or(login)
        .or(logout)
        .or(user_me)
        .or(user_subscriptions)
        .or(user_list)
        .or(user_get)
        .or(user_subscribe)
        .or(user_unsubscribe)
        .or(tag_list)
        .or(tag_get)
        .or(tag_create)
        .or(ingredient_list)
        .or(ingredient_get)
        .or(ingredient_create)
        .or(recipe_download_cart)
        .or(recipe_list)
        .or(recipe_get)
        .or(recipe_create)
        .or(recipe_update)
        .or(recipe_delete)
        .or(favorite_add)
        .or(favorite_remove)
        .or(cart_add)
        .or(cart_remove)
        .or(media)
    .map(|reply| -> Box<dyn Reply> { Box::new(reply) })
}
