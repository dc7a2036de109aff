use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData};

/// Requires a valid `session` cookie and hands the decoded session to the
/// handler.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>(SESSION_COOKIE).and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(e) => Err(warp::reject::custom(e)),
        }
    })
}

/// Like `with_session`, but anonymous callers pass through with `None`.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = std::convert::Infallible> + Copy {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(|session: Option<String>| {
        session
            .and_then(|session| verify_jwt_session(session).ok())
            .map(SessionData::from)
    })
}
