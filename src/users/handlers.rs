use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{jwt::AdminUser, password::hash_password},
    error::{message, ok, ApiError, MessageBody, Success},
    state::AppState,
    users::{
        dto::{CreateUserRequest, UserBody, UserListBody, UserView},
        repo::{Role, User, UserStatus, PROTECTED_USERNAMES},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", delete(delete_user))
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

async fn insert_user(
    state: &AppState,
    payload: CreateUserRequest,
) -> Result<(StatusCode, Json<Success<UserBody>>), ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".into(),
        ));
    }

    if !is_valid_username(&payload.username) {
        return Err(ApiError::Validation(
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'".into(),
        ));
    }

    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already exists");
        return Err(ApiError::Validation("Username already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.username,
        &hash,
        payload.role.unwrap_or(Role::Student),
        payload.status.unwrap_or(UserStatus::Active),
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((
        StatusCode::CREATED,
        ok(UserBody {
            message: "User created successfully".into(),
            user: UserView::from(&user),
        }),
    ))
}

/// Public self-registration; always a plain student account.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Success<UserBody>>), ApiError> {
    payload.role = Some(Role::Student);
    payload.status = Some(UserStatus::Active);
    insert_user(&state, payload).await
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Success<UserBody>>), ApiError> {
    insert_user(&state, payload).await
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Success<UserListBody>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(ok(UserListBody {
        users: users.iter().map(UserView::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if PROTECTED_USERNAMES.contains(&user.username.as_str()) {
        warn!(username = %user.username, admin = %admin.username, "refused to delete default user");
        return Err(ApiError::Forbidden(
            "Cannot delete default system users".into(),
        ));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(user_id = %id, admin = %admin.username, "user deleted");
    Ok(message("User deleted successfully"))
}

#[cfg(test)]
mod username_tests {
    use super::*;

    #[test]
    fn accepts_typical_usernames() {
        for name in ["KAB", "student", "alice.b", "bob_99", "x-y-z"] {
            assert!(is_valid_username(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_short_long_and_odd_characters() {
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username(&"a".repeat(33)));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("semi;colon"));
        assert!(!is_valid_username(""));
    }
}
