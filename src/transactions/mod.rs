use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod range;

pub fn router() -> Router<AppState> {
    handlers::transaction_routes()
}
