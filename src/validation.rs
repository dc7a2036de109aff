use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{
    HEX_COLOR_PATTERN, MAX_COOKING_TIME, MAX_INGREDIENT_AMOUNT, MIN_COOKING_TIME,
    MIN_INGREDIENT_AMOUNT, USERNAME_PATTERN,
};
use crate::error::ApiError;
use crate::schema::{QuantityPayload, RecipePayload};

fn hex_color() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEX_COLOR_PATTERN).unwrap())
}

fn username() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(USERNAME_PATTERN).unwrap())
}

fn email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn validate_hex_color(value: &str) -> Result<(), ApiError> {
    if !hex_color().is_match(value) {
        return Err(ApiError::validation(
            "color",
            "Enter a valid color in #RRGGBB format",
        ));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Result<(), ApiError> {
    if !username().is_match(value) {
        return Err(ApiError::validation(
            "username",
            "Only letters, digits and . @ + - are allowed",
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ApiError> {
    if !email().is_match(value) {
        return Err(ApiError::validation("email", "Enter a valid email address"));
    }
    Ok(())
}

pub fn validate_cooking_time(value: i32) -> Result<(), ApiError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&value) {
        return Err(ApiError::validation(
            "cooking_time",
            format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"),
        ));
    }
    Ok(())
}

/// Per-submission ingredient rules: at least one entry, every amount inside
/// the configured bounds, no ingredient referenced twice. A duplicate is a
/// hard error here even though the shopping list aggregator merges duplicates
/// across recipes.
pub fn validate_quantities(entries: &[QuantityPayload]) -> Result<(), ApiError> {
    if entries.is_empty() {
        return Err(ApiError::validation(
            "ingredients",
            "Add at least one ingredient",
        ));
    }

    let mut seen: Vec<i32> = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.amount < MIN_INGREDIENT_AMOUNT {
            return Err(ApiError::validation(
                "ingredients",
                format!("Amount must be at least {MIN_INGREDIENT_AMOUNT}"),
            ));
        }
        if entry.amount > MAX_INGREDIENT_AMOUNT {
            return Err(ApiError::validation(
                "ingredients",
                format!("Amount must be at most {MAX_INGREDIENT_AMOUNT}"),
            ));
        }
        if seen.contains(&entry.id) {
            return Err(ApiError::validation(
                "ingredients",
                "Ingredient is already on the list",
            ));
        }
        seen.push(entry.id);
    }

    Ok(())
}

/// Field presence and range checks for a recipe create. Tag existence and
/// name uniqueness are database checks and live in the recipe actions.
pub fn validate_recipe_create(payload: &RecipePayload) -> Result<(), ApiError> {
    let missing = |field| ApiError::validation(field, "This field is required");

    if payload.name.as_deref().unwrap_or("").is_empty() {
        return Err(missing("name"));
    }
    if payload.text.as_deref().unwrap_or("").is_empty() {
        return Err(missing("text"));
    }
    if payload.image.as_deref().unwrap_or("").is_empty() {
        return Err(missing("image"));
    }
    let cooking_time = payload.cooking_time.ok_or_else(|| missing("cooking_time"))?;
    validate_cooking_time(cooking_time)?;

    if payload.tags.as_deref().unwrap_or_default().is_empty() {
        return Err(missing("tags"));
    }
    let ingredients = payload.ingredients.as_deref().ok_or_else(|| missing("ingredients"))?;
    validate_quantities(ingredients)?;

    Ok(())
}

/// Partial-update checks: only supplied fields are validated, omitted fields
/// keep their stored values. Name uniqueness is deliberately not re-checked
/// on update.
pub fn validate_recipe_update(payload: &RecipePayload) -> Result<(), ApiError> {
    if let Some(cooking_time) = payload.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(ingredients) = payload.ingredients.as_deref() {
        validate_quantities(ingredients)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, amount: i32) -> QuantityPayload {
        QuantityPayload { id, amount }
    }

    fn create_payload() -> RecipePayload {
        RecipePayload {
            name: Some(String::from("Pancakes")),
            text: Some(String::from("Mix and fry.")),
            cooking_time: Some(20),
            image: Some(String::from("data:image/png;base64,aGk=")),
            tags: Some(vec![1]),
            ingredients: Some(vec![entry(1, 200)]),
        }
    }

    #[test]
    fn five_digit_hex_color_is_rejected() {
        assert!(validate_hex_color("#12345").is_err());
        assert!(validate_hex_color("#123456").is_ok());
    }

    #[test]
    fn hex_color_needs_leading_hash() {
        assert!(validate_hex_color("123456").is_err());
        assert!(validate_hex_color("#12g456").is_err());
    }

    #[test]
    fn username_allows_word_chars_and_special_four() {
        assert!(validate_username("anna.petrova@site+1-x").is_ok());
        assert!(validate_username("not valid").is_err());
        assert!(validate_username("no#hash").is_err());
    }

    #[test]
    fn amount_below_minimum_is_rejected_at_minimum_accepted() {
        let below = vec![entry(1, MIN_INGREDIENT_AMOUNT - 1)];
        let at = vec![entry(1, MIN_INGREDIENT_AMOUNT)];
        assert!(validate_quantities(&below).is_err());
        assert!(validate_quantities(&at).is_ok());
    }

    #[test]
    fn duplicate_ingredient_in_submission_is_rejected() {
        let entries = vec![entry(7, 100), entry(7, 50)];
        assert!(validate_quantities(&entries).is_err());
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        assert!(validate_quantities(&[]).is_err());
    }

    #[test]
    fn create_requires_all_fields() {
        assert!(validate_recipe_create(&create_payload()).is_ok());

        let mut no_ingredients = create_payload();
        no_ingredients.ingredients = None;
        assert!(validate_recipe_create(&no_ingredients).is_err());

        let mut no_name = create_payload();
        no_name.name = None;
        assert!(validate_recipe_create(&no_name).is_err());
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let partial = RecipePayload {
            cooking_time: Some(30),
            ..RecipePayload::default()
        };
        assert!(validate_recipe_update(&partial).is_ok());

        let bad = RecipePayload {
            cooking_time: Some(MAX_COOKING_TIME + 1),
            ..RecipePayload::default()
        };
        assert!(validate_recipe_update(&bad).is_err());
    }
}
