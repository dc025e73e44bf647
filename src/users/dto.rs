use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::{Role, User, UserStatus};

/// Request body for registration and administrative user creation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

/// Sanitized user view: never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            status: user.status,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListBody {
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub message: String,
    pub user: UserView,
}

#[cfg(test)]
mod view_tests {
    use super::*;

    #[test]
    fn view_never_exposes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Student,
            status: UserStatus::Active,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("alice"));
    }

    #[test]
    fn view_uses_camel_case_fields() {
        let user = User {
            id: Uuid::new_v4(),
            username: "bob".into(),
            password_hash: "h".into(),
            role: Role::Admin,
            status: UserStatus::Active,
            login_attempts: 0,
            locked_until: None,
            last_login: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
        };
        let v = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(v.get("lastLogin").is_some());
        assert!(v.get("createdAt").is_some());
        assert_eq!(v["role"], "admin");
    }
}
