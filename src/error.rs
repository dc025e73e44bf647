use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Everything a handler can fail with, mapped onto the wire envelope
/// `{"success": false, "message": ...}`. Locked variants additionally
/// carry `"lockout": true` so clients can distinguish lockout from a
/// plain credential failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid credentials ({attempts}/{max} attempts)")]
    BadPassword { attempts: u32, max: u32 },
    #[error("Account is suspended")]
    Suspended,
    #[error("Account temporarily locked due to failed login attempts")]
    Locked,
    #[error("Account locked for {minutes} minutes after {max} failed attempts")]
    JustLocked { minutes: i64, max: u32 },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::BadPassword { .. }
            | ApiError::Suspended
            | ApiError::Locked
            | ApiError::JustLocked { .. }
            | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_lockout(&self) -> bool {
        matches!(self, ApiError::Locked | ApiError::JustLocked { .. })
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal detail goes to the log, never to the caller.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({ "success": false, "message": message });
        if self.is_lockout() {
            body["lockout"] = json!(true);
        }

        (status, Json(body)).into_response()
    }
}

/// Success envelope: `{"success": true, ...body}`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

pub fn ok<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn message(msg: &str) -> Json<Success<MessageBody>> {
    ok(MessageBody {
        message: msg.to_string(),
    })
}

#[cfg(test)]
mod envelope_tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        count: u32,
    }

    #[test]
    fn success_flattens_body() {
        let v = serde_json::to_value(Success {
            success: true,
            body: Payload { count: 3 },
        })
        .unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["count"], json!(3));
    }

    #[test]
    fn lockout_variants_flagged() {
        assert!(ApiError::Locked.is_lockout());
        assert!(ApiError::JustLocked {
            minutes: 15,
            max: 5
        }
        .is_lockout());
        assert!(!ApiError::InvalidCredentials.is_lockout());
    }

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn attempt_counter_in_message() {
        let e = ApiError::BadPassword {
            attempts: 2,
            max: 5,
        };
        assert_eq!(e.to_string(), "Invalid credentials (2/5 attempts)");
    }
}
