mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;
mod media;
mod shopping_list;
mod validation;

mod http {
    pub mod handlers {
        pub mod ingredients;
        pub mod recipes;
        pub mod tags;
        pub mod users;
    }
    pub mod rejection;
    pub mod routes;
}

pub mod config;

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use http::*;
pub use media::*;
pub use shopping_list::*;
pub use validation::*;
