use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, JwtKeys, LoginBody, LoginRequest},
        lockout::{self, Gate, LockoutPolicy},
        password::{hash_password, verify_password},
    },
    error::{message, ok, ApiError, MessageBody, Success},
    state::AppState,
    users::{dto::UserView, repo::User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/change-password", post(change_password))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Success<LoginBody>>, ApiError> {
    let user = User::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| {
            // Same message as a wrong password so usernames cannot be
            // enumerated.
            warn!(username = %payload.username, "login unknown username");
            ApiError::InvalidCredentials
        })?;

    let now = OffsetDateTime::now_utc();
    match lockout::gate(&user, now) {
        Gate::Suspended => {
            warn!(user_id = %user.id, "login on suspended account");
            return Err(ApiError::Suspended);
        }
        Gate::Locked => {
            warn!(user_id = %user.id, "login on locked account");
            return Err(ApiError::Locked);
        }
        Gate::Open => {}
    }

    let password_ok = verify_password(&payload.password, &user.password_hash)?;

    if !password_ok {
        let policy = LockoutPolicy::from(&state.config.lockout);
        let failure = lockout::record_failure(user.login_attempts, now, &policy);
        User::record_failure(&state.db, user.id, failure.attempts, failure.locked_until).await?;

        return Err(match failure.locked_until {
            Some(_) => {
                warn!(user_id = %user.id, attempts = failure.attempts, "account locked");
                ApiError::JustLocked {
                    minutes: policy.lock_duration.whole_minutes(),
                    max: policy.max_attempts,
                }
            }
            None => {
                warn!(user_id = %user.id, attempts = failure.attempts, "login invalid password");
                ApiError::BadPassword {
                    attempts: failure.attempts as u32,
                    max: policy.max_attempts,
                }
            }
        });
    }

    User::record_login(&state.db, user.id, now).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(ok(LoginBody {
        message: "Authentication successful".into(),
        token,
        user: UserView::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let user = User::find_by_id(&state.db, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let current_ok = verify_password(&payload.current_password, &user.password_hash)?;
    if !current_ok {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::Unauthorized("Current password is incorrect".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    let updated = User::set_password(&state.db, user.id, &hash).await?;
    if !updated {
        return Err(ApiError::Internal(anyhow::anyhow!(
            "password update matched no rows"
        )));
    }

    info!(user_id = %user.id, "password changed");
    Ok(message("Password changed successfully"))
}
