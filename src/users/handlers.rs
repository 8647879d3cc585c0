use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
    validation::{validate_create_user, validate_update_user, EMAIL_TAKEN},
};
use crate::{
    auth::{password::hash_password, AuthUser, MaybeAuthUser},
    error::AppError,
    extract::JsonOrDefault,
    repo::{RepoError, User},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(create_user))
        .route("/user/get_current_user", get(get_current_user))
        .route(
            "/user/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Load the target user, then make sure the caller is that user.
///
/// Missing targets are reported before anything about the caller.
async fn owned_user(
    state: &AppState,
    caller: Option<User>,
    id: Uuid,
) -> Result<User, AppError> {
    let target = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    let Some(caller) = caller else {
        return Err(AppError::Unauthorized(
            "Authentication credentials were not provided".into(),
        ));
    };
    if caller.id != target.id {
        warn!(caller = %caller.id, target = %target.id, "user ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(target)
}

#[utoipa::path(
    post,
    path = "/api/user",
    tag = "user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Registered", body = PublicUser),
        (status = 400, description = "Every problem with the input", body = [String]),
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let sign_up = validate_create_user(state.users.as_ref(), payload).await?;

    let hash = hash_password(&sign_up.password)?;
    let user = match state.users.create(sign_up.into_new_user(hash)).await {
        Ok(user) => user,
        Err(RepoError::Conflict) => {
            warn!("email registered concurrently");
            return Err(AppError::validation(EMAIL_TAKEN));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/user/get_current_user",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PublicUser),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "No credentials"),
    )
)]
#[instrument(skip_all)]
pub async fn get_current_user(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "user",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, body = PublicUser),
        (status = 401, description = "Anonymous caller"),
        (status = 403, description = "Someone else's account"),
        (status = 404, description = "No such user"),
    )
)]
#[instrument(skip(state, caller))]
pub async fn get_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    let user = owned_user(&state, caller, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}",
    tag = "user",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body(content = UpdateUserRequest, description = "Only the names can change; the body may be omitted"),
    responses(
        (status = 200, body = PublicUser),
        (status = 400, description = "Name too long", body = [String]),
        (status = 401, description = "Anonymous caller"),
        (status = 403, description = "Someone else's account"),
        (status = 404, description = "No such user"),
    )
)]
#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<Uuid>,
    payload: Result<JsonOrDefault<UpdateUserRequest>, AppError>,
) -> Result<Json<PublicUser>, AppError> {
    let user = owned_user(&state, caller, id).await?;
    let JsonOrDefault(payload) = payload?;
    let changes = validate_update_user(payload)?;

    if changes.is_empty() {
        return Ok(Json(user.into()));
    }

    let updated = state
        .users
        .update(user.id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %updated.id, "user updated");
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    tag = "user",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted together with every transaction of the user"),
        (status = 403, description = "Anonymous caller or someone else's account"),
        (status = 404, description = "No such user"),
    )
)]
#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let target = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    match caller {
        Some(caller) if caller.id == target.id => {}
        _ => {
            warn!(target = %target.id, "user delete refused");
            return Err(AppError::Forbidden);
        }
    }

    if !state.users.delete(target.id).await? {
        return Err(AppError::NotFound);
    }
    // Outstanding tokens die with the row: the auth extractors look the user up on every request.
    info!(user_id = %target.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
