pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 1440;

pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 10000;

pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const USER_COUNT_PER_PAGE: i64 = 10;

pub const SHOPCART_FILENAME: &str = "shopping_cart.csv";
pub const TEXT_CSV: &str = "text/csv";

pub const HEX_COLOR_PATTERN: &str = r"^#[0-9A-Fa-f]{6}$";
pub const USERNAME_PATTERN: &str = r"^[\w.@+-]+$";

pub const SESSION_COOKIE: &str = "session";
