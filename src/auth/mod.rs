use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extractors::{AuthUser, MaybeAuthUser};
pub use jwt::{Claims, JwtKeys, TokenKind};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
