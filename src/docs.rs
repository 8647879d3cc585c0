//! OpenAPI description of the JSON API, served as Swagger UI and ReDoc to signed-in callers.
use axum::{middleware, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{self, AuthUser},
    state::AppState,
    transactions::{self, dto as transaction_dto},
    users::{self, dto as user_dto},
};

pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "spendtrack API", version = "v1"),
    paths(
        auth::handlers::login,
        auth::handlers::refresh,
        users::handlers::create_user,
        users::handlers::get_current_user,
        users::handlers::get_user,
        users::handlers::update_user,
        users::handlers::delete_user,
        transactions::handlers::list_transactions,
        transactions::handlers::create_transaction,
        transactions::handlers::get_transaction,
        transactions::handlers::update_transaction,
        transactions::handlers::delete_transaction,
        transactions::handlers::sort_transactions_by_date,
        transactions::handlers::view_sum_of_transactions_by_date,
    ),
    components(schemas(
        auth::dto::LoginRequest,
        auth::dto::RefreshRequest,
        auth::dto::AuthResponse,
        user_dto::PublicUser,
        user_dto::CreateUserRequest,
        user_dto::UpdateUserRequest,
        transaction_dto::CreateTransactionRequest,
        transaction_dto::UpdateTransactionRequest,
        transaction_dto::DateRangeRequest,
        transaction_dto::TransactionOutput,
        transaction_dto::TransactionSumOutput,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Token pairs"),
        (name = "user", description = "Accounts"),
        (name = "transaction", description = "Money transactions of the caller"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// `/swagger/`, `/redoc/` and the raw document, all behind an access token.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger").url(OPENAPI_JSON, ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc/", ApiDoc::openapi()))
        .route_layer(middleware::from_extractor_with_state::<AuthUser, AppState>(
            state,
        ))
}
