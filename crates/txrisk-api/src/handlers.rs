//! HTTP request handlers
//!
//! Routes:
//! - `GET /` liveness
//! - `POST /analyze` run the pipeline and persist the result
//! - `GET /transactions` ten most recent transactions
//! - `GET /transaction/:id` one transaction with its analysis

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};
use txrisk_analyzer::{AnalysisError, Analyzer, SourceSummary};
use txrisk_domain::traits::AnalysisStore;
use txrisk_domain::{StoredAnalysis, TransactionAnalysis, TransactionInput, TransactionRecord};
use txrisk_store::{SqliteStore, StoreError};

/// Transactions listed by `GET /transactions`
pub const RECENT_LIMIT: usize = 10;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Pipeline facade
    pub analyzer: Analyzer,
    /// Transaction store
    pub store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    /// Create state over an analyzer and a store
    pub fn new(analyzer: Analyzer, store: SqliteStore) -> Self {
        Self {
            analyzer,
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("transaction store lock poisoned".to_string()))
    }
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Uploaded file text; takes precedence over the description
    #[serde(default)]
    pub file_content: Option<String>,
}

/// Body returned by `POST /analyze`
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// The persisted transaction
    pub transaction: TransactionRecord,
    /// The verdict
    pub analysis: TransactionAnalysis,
    /// The model reply had no JSON verdict
    pub degraded: bool,
    /// Evidence counts
    pub sources: SourceSummary,
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always "operational"
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine-readable error kind
    pub kind: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or empty request
    #[error("{0}")]
    BadRequest(String),
    /// Unknown transaction
    #[error("{0}")]
    NotFound(String),
    /// Pipeline failure
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Analysis(e) => match e {
                AnalysisError::RemoteService { .. } => (StatusCode::BAD_GATEWAY, "remote_service"),
                AnalysisError::Inference { timed_out: true, .. } => {
                    (StatusCode::GATEWAY_TIMEOUT, "inference")
                }
                AnalysisError::Inference { .. } => (StatusCode::BAD_GATEWAY, "inference"),
                AnalysisError::Schema(_) => (StatusCode::BAD_GATEWAY, "schema"),
                AnalysisError::Configuration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "configuration")
                }
            },
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(kind, error = %self, "Request failed");
        } else {
            warn!(kind, error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            kind: kind.to_string(),
        });
        (status, body).into_response()
    }
}

/// GET / - Liveness
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "operational".to_string(),
    })
}

/// POST /analyze - Analyze and persist a transaction
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let input = TransactionInput::new(request.description, request.file_content);
    if input.is_blank() {
        return Err(ApiError::BadRequest(
            "description or file_content is required".to_string(),
        ));
    }

    let outcome = state.analyzer.analyze(&input).await?;
    let transaction = TransactionRecord::from_input(&input, chrono::Utc::now().to_rfc3339());
    state
        .store()?
        .save(&transaction, &outcome.analysis, outcome.degraded)?;
    info!(id = %transaction.id, risk_score = outcome.analysis.risk_score, "Transaction stored");

    Ok(Json(AnalyzeResponse {
        transaction,
        analysis: outcome.analysis,
        degraded: outcome.degraded,
        sources: outcome.sources,
    }))
}

/// GET /transactions - Most recent transactions
async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    Ok(Json(state.store()?.recent(RECENT_LIMIT)?))
}

/// GET /transaction/:id - One transaction with its analysis
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredAnalysis>, ApiError> {
    match state.store()?.load(&id) {
        Ok(Some(stored)) => Ok(Json(stored)),
        Ok(None) => Err(ApiError::NotFound(format!("Transaction {} not found", id))),
        Err(StoreError::MissingAnalysis(id)) => {
            Err(ApiError::NotFound(format!("Analysis not found for transaction {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analyze", post(analyze))
        .route("/transactions", get(list_transactions))
        .route("/transaction/:id", get(get_transaction))
        .with_state(state)
}
