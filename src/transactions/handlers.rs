use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        parse_amount, CreateTransactionRequest, DateRangeRequest, TransactionOutput,
        TransactionSumOutput, UpdateTransactionRequest,
    },
    range::{parse_bound, parse_date, DateRange},
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::JsonOrDefault,
    repo::{NewTransaction, Transaction, User},
    state::AppState,
    users::dto::PublicUser,
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transaction",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transaction/sort_transactions_by_date",
            post(sort_transactions_by_date),
        )
        .route(
            "/transaction/view_sum_of_transactions_by_date",
            post(view_sum_of_transactions_by_date),
        )
        .route(
            "/transaction/:id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

/// Fetch a transaction and check that `caller` owns it: 404 first, then 403.
async fn owned_transaction(
    state: &AppState,
    caller: &User,
    id: Uuid,
) -> Result<Transaction, AppError> {
    let transaction = state
        .transactions
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    if transaction.user_id != caller.id {
        warn!(caller = %caller.id, transaction_id = %id, "transaction ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(transaction)
}

fn parse_range(request: &DateRangeRequest) -> Result<DateRange, AppError> {
    let start = parse_bound("start_date", request.start_date.as_deref());
    let end = parse_bound("end_date", request.end_date.as_deref());
    match (start, end) {
        (Ok(start), Ok(end)) => Ok(DateRange::new(start, end)),
        (start, end) => Err(AppError::Validation(
            [start.err(), end.err()].into_iter().flatten().collect(),
        )),
    }
}

fn outputs(transactions: Vec<Transaction>, owner: &PublicUser) -> Vec<TransactionOutput> {
    transactions
        .into_iter()
        .map(|t| TransactionOutput::new(t, owner.clone()))
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/transaction",
    tag = "transaction",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's transactions, oldest first", body = [TransactionOutput]),
        (status = 403, description = "No credentials"),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<TransactionOutput>>, AppError> {
    let rows = state
        .transactions
        .list_by_user(user.id, DateRange::all())
        .await?;
    Ok(Json(outputs(rows, &user.into())))
}

#[utoipa::path(
    post,
    path = "/api/transaction",
    tag = "transaction",
    security(("bearer" = [])),
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Transaction recorded", body = TransactionOutput),
        (status = 400, description = "Missing or invalid amount or date", body = [String]),
        (status = 403, description = "No credentials"),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionOutput>, AppError> {
    let Json(payload) = payload?;
    let amount = parse_amount(payload.amount.as_ref())?;
    let date = match payload.date.as_deref().map(str::trim) {
        None | Some("") => OffsetDateTime::now_utc().date(),
        Some(raw) => parse_date(raw).map_err(|_| {
            AppError::validation(
                "date: Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            )
        })?,
    };

    let transaction = state
        .transactions
        .create(NewTransaction {
            user_id: user.id,
            amount,
            date,
        })
        .await?;
    info!(transaction_id = %transaction.id, %amount, "transaction created");
    Ok(Json(TransactionOutput::new(transaction, user.into())))
}

#[utoipa::path(
    get,
    path = "/api/transaction/{id}",
    tag = "transaction",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, body = TransactionOutput),
        (status = 403, description = "Owned by someone else"),
        (status = 404, description = "No such transaction"),
    )
)]
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionOutput>, AppError> {
    let transaction = owned_transaction(&state, &user, id).await?;
    Ok(Json(TransactionOutput::new(transaction, user.into())))
}

#[utoipa::path(
    patch,
    path = "/api/transaction/{id}",
    tag = "transaction",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, body = TransactionOutput),
        (status = 400, description = "Missing or invalid amount", body = [String]),
        (status = 403, description = "Owned by someone else"),
        (status = 404, description = "No such transaction"),
    )
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionOutput>, AppError> {
    owned_transaction(&state, &user, id).await?;
    let Json(payload) = payload?;
    let amount = parse_amount(payload.amount.as_ref())?;

    let transaction = state
        .transactions
        .update_amount(id, amount)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(transaction_id = %id, %amount, "transaction updated");
    Ok(Json(TransactionOutput::new(transaction, user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/transaction/{id}",
    tag = "transaction",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Owned by someone else"),
        (status = 404, description = "No such transaction"),
    )
)]
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_transaction(&state, &user, id).await?;
    if !state.transactions.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(transaction_id = %id, "transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/transaction/sort_transactions_by_date",
    tag = "transaction",
    security(("bearer" = [])),
    request_body(content = DateRangeRequest, description = "Both bounds optional; the body may be omitted"),
    responses(
        (status = 200, description = "The caller's transactions inside the range", body = [TransactionOutput]),
        (status = 400, description = "Malformed date", body = [String]),
    )
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn sort_transactions_by_date(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonOrDefault(payload): JsonOrDefault<DateRangeRequest>,
) -> Result<Json<Vec<TransactionOutput>>, AppError> {
    let range = parse_range(&payload)?;
    let rows = state.transactions.list_by_user(user.id, range).await?;
    Ok(Json(outputs(rows, &user.into())))
}

#[utoipa::path(
    post,
    path = "/api/transaction/view_sum_of_transactions_by_date",
    tag = "transaction",
    security(("bearer" = [])),
    request_body(content = DateRangeRequest, description = "Both bounds optional; the body may be omitted"),
    responses(
        (status = 200, description = "Sum of the caller's amounts inside the range", body = TransactionSumOutput),
        (status = 400, description = "Malformed date", body = [String]),
    )
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn view_sum_of_transactions_by_date(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonOrDefault(payload): JsonOrDefault<DateRangeRequest>,
) -> Result<Json<TransactionSumOutput>, AppError> {
    let range = parse_range(&payload)?;
    let sum = state.transactions.sum_by_user(user.id, range).await?;
    Ok(Json(TransactionSumOutput {
        start_date: range.start,
        end_date: range.end,
        sum,
    }))
}
