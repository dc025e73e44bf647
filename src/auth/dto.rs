use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::users::dto::UserView;
use crate::users::repo::Role;

/// JWT payload. Besides the standard claims it embeds the username and
/// role so handlers never have to trust a client-declared role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,    // user ID
    pub username: String,
    pub role: Role,
    pub iat: usize,   // issued at (unix timestamp)
    pub exp: usize,   // expires at (unix timestamp)
    pub iss: String,  // issuer
    pub aud: String,  // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for password change.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub user_id: Uuid,
    pub current_password: String,
    pub new_password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginBody {
    pub message: String,
    pub token: String,
    pub user: UserView,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn login_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<LoginRequest>(
            r#"{"username": "alice", "password": "secret", "role": "admin"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("role"));
    }

    #[test]
    fn login_request_parses_expected_fields() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username": "alice", "password": "secret"}"#).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.password, "secret");
    }
}
