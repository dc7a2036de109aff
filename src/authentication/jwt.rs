use chrono::{Duration, Local};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ApiError;
use crate::schema::{User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub user_role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(24)).timestamp();

        Self {
            user_id: id,
            username,
            user_role: role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub user_role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Unauthorized(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.user_role == UserRole::Admin,
            user_role: value.user_role,
        }
    }
}

fn signing_key() -> Hmac<Sha256> {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| String::from("secret"));
    Hmac::new_from_slice(secret.as_bytes()).unwrap()
}

pub fn generate_jwt_session(user: &User) -> String {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&signing_key()).unwrap()
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, ApiError> {
    token
        .verify_with_key(&signing_key())
        .map_err(|_| ApiError::InvalidSession(String::from("Invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::InvalidSession(String::from("Token expired")));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.org"),
            username: String::from("cook"),
            first_name: String::from("Anna"),
            last_name: String::from("Petrova"),
            password: String::from("<hash>"),
            role: UserRole::User,
        }
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let token = generate_jwt_session(&user());
        let session = verify_jwt_session(token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert_eq!(session.user_role, UserRole::User);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = JwtSessionData::new(7, String::from("cook"), UserRole::User);
        claims.exp = Local::now().timestamp() - 60;
        let token = claims.sign_with_key(&signing_key()).unwrap();

        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_jwt_session(String::from("not.a.token")).is_err());
    }
}
