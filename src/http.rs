// 🌐 HTTP adapter - JSON routes over the ledger operations
//
// Thin translation layer: parse the request, call one ledger operation, map
// the typed result to a status code. No business rules live here beyond
// rejecting empty customer fields.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::entities::{AccountId, Customer};
use crate::error::LedgerError;
use crate::ledger::Ledger;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Failure returned by a handler.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Ledger(LedgerError),
    /// The blocking task running a ledger call panicked or was cancelled.
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

// Extractor rejections carry axum's plain-text body; re-wrap them so every
// failure leaves as `{"error": ...}` with 400.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` that rejects with `ApiError`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` that rejects with `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` that rejects with `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Status code for each ledger error kind.
pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAmount { .. }
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::CorruptState { .. }
        | LedgerError::BalanceOverflow { .. }
        | LedgerError::SelfTransfer { .. } => StatusCode::BAD_REQUEST,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::Conflict { .. } => StatusCode::CONFLICT,
        LedgerError::Connection(_) | LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Ledger(err) => {
                let status = status_for(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %err, "request failed");
                }
                (status, err.to_string())
            }
            ApiError::Internal(message) => {
                error!(error = %message, "ledger task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run a ledger call on the blocking pool. Every operation takes the
/// connection mutex and may wait on SQLite's busy timeout, which must not
/// stall the async workers.
async fn with_ledger<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Ledger) -> crate::error::Result<T> + Send + 'static,
{
    let ledger = Arc::clone(&state.ledger);
    let result = tokio::task::spawn_blocking(move || f(&ledger))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(result?)
}

fn validate_customer(customer: &Customer) -> ApiResult<()> {
    match customer.missing_field() {
        Some(field) => Err(ApiError::BadRequest(format!("request has empty {}", field))),
        None => Ok(()),
    }
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BalanceRange {
    #[serde(rename = "min-balance")]
    pub min_balance: Option<f64>,
    #[serde(rename = "max-balance")]
    pub max_balance: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub id: AccountId,
    pub balance: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatementResponse {
    pub statement: String,
}

/// Body of `POST /accounts/:id/transactions`.
#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    /// `deposit`, `withdraw` or `transfer`
    pub class: String,
    pub amount: f64,
    /// Receiver, only for transfers
    #[serde(default)]
    pub to: Option<AccountId>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health
async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    with_ledger(&state, |ledger| ledger.ping()).await?;
    Ok(Json(serde_json::json!({ "status": "OK" })))
}

/// GET /accounts?min-balance=&max-balance=
async fn list_accounts(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<BalanceRange>,
) -> ApiResult<impl IntoResponse> {
    let accounts = with_ledger(&state, move |ledger| {
        ledger.get_accounts(range.min_balance, range.max_balance)
    })
    .await?;
    Ok(Json(accounts))
}

/// GET /accounts/:id
async fn get_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<impl IntoResponse> {
    let account = with_ledger(&state, move |ledger| ledger.get_account(id)).await?;
    Ok(Json(account))
}

/// POST /accounts
async fn create_account(
    State(state): State<AppState>,
    ApiJson(customer): ApiJson<Customer>,
) -> ApiResult<impl IntoResponse> {
    validate_customer(&customer)?;
    let account = with_ledger(&state, move |ledger| ledger.create_account(&customer)).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /accounts/:id
async fn update_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
    ApiJson(customer): ApiJson<Customer>,
) -> ApiResult<impl IntoResponse> {
    validate_customer(&customer)?;
    let account = with_ledger(&state, move |ledger| ledger.update_account(id, &customer)).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// DELETE /accounts/:id
async fn delete_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<impl IntoResponse> {
    with_ledger(&state, move |ledger| ledger.delete_account(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /accounts/:id/balance
async fn get_balance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<impl IntoResponse> {
    let balance = with_ledger(&state, move |ledger| ledger.get_balance(id)).await?;
    Ok(Json(BalanceResponse { id, balance }))
}

/// GET /accounts/:id/statement
async fn get_statement(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<impl IntoResponse> {
    let statement = with_ledger(&state, move |ledger| ledger.statement(id)).await?;
    Ok(Json(StatementResponse { statement }))
}

/// POST /accounts/:id/transactions
async fn post_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AccountId>,
    ApiJson(trade): ApiJson<TradeRequest>,
) -> ApiResult<Response> {
    let amount = trade.amount;
    let response = match trade.class.as_str() {
        "deposit" => {
            let account = with_ledger(&state, move |ledger| ledger.deposit(id, amount)).await?;
            Json(account).into_response()
        }
        "withdraw" => {
            let account = with_ledger(&state, move |ledger| ledger.withdraw(id, amount)).await?;
            Json(account).into_response()
        }
        "transfer" => {
            let to = trade
                .to
                .ok_or_else(|| ApiError::BadRequest("transfer requires 'to'".to_string()))?;
            let pair = with_ledger(&state, move |ledger| ledger.transfer(id, to, amount)).await?;
            Json(pair).into_response()
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "transaction class '{}' is not defined",
                other
            )))
        }
    };

    Ok(response)
}

/// Build the full router over `ledger`.
pub fn router(ledger: Arc<Ledger>) -> Router {
    let state = AppState { ledger };

    let api_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/accounts/:id/balance", get(get_balance))
        .route("/accounts/:id/statement", get(get_statement))
        .route("/accounts/:id/transactions", post(post_transaction))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
