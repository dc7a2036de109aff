use std::convert::Infallible;

use serde_json::json;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::error::ApiError;

/// Turns every rejection the filter tree can produce into a JSON error
/// reply. Internal errors are logged here and reported without detail.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<ApiError>() {
        match e {
            ApiError::Query(_) | ApiError::Config(_) => {
                log::error!("{e}");
                (e.status(), String::from("Internal server error"))
            }
            _ => (e.status(), format!("{e}")),
        }
    } else if err.find::<warp::reject::MissingCookie>().is_some() {
        (
            StatusCode::UNAUTHORIZED,
            String::from("Authentication required"),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string"))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    let reply = warp::reply::json(&json!({ "error": message }));
    Ok(warp::reply::with_status(reply, status))
}
