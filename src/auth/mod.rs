use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod lockout;
pub mod password;

pub fn router() -> Router<AppState> {
    handlers::router()
}
