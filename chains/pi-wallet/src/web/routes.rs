use autopay_core::{
    AutoSubmitter, Balance, ConfigError, CoreError, KeypairLoader, LedgerGateway, MetricsSnapshot,
    SendConfig, SubmissionOutcome, TxSummary, WalletError, WalletStore,
};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Everything the handlers reach into. Handlers never hold wallet state
/// themselves; they go through the store and the submitter.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WalletStore>,
    pub submitter: Arc<AutoSubmitter>,
    pub loader: Arc<dyn KeypairLoader>,
    pub gateway: Arc<dyn LedgerGateway>,
    pub history_limit: u32,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub public: Option<String>,
    pub armed: bool,
    pub config: Option<SendConfig>,
    pub last_result: Option<SubmissionOutcome>,
}

#[derive(Deserialize)]
pub struct LoadForm {
    #[serde(default)]
    pub mnemonic: String,
}

#[derive(Deserialize)]
pub struct ConfigForm {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub memo: String,
}

#[derive(Deserialize)]
pub struct ArmRequest {
    pub armed: bool,
}

#[derive(Serialize)]
pub struct ArmResponse {
    pub auto_active: bool,
}

fn error_status(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "msg": msg.into() })),
    )
        .into_response()
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.store.snapshot();
    Json(StatusResponse {
        public: snapshot.public_id().map(str::to_string),
        armed: snapshot.armed,
        config: snapshot.send_config,
        last_result: snapshot.last_result,
    })
}

pub async fn load(State(state): State<AppState>, Form(form): Form<LoadForm>) -> Response {
    match state.store.load_phrase(state.loader.as_ref(), &form.mnemonic) {
        Ok(public) => Json(json!({ "status": "ok", "public": public })).into_response(),
        Err(e) => {
            warn!("Rejected wallet load: {}", e);
            error_status("Invalid mnemonic.")
        }
    }
}

pub async fn configure(State(state): State<AppState>, Form(form): Form<ConfigForm>) -> Response {
    match state
        .store
        .configure(&form.destination, &form.amount, &form.memo)
    {
        Ok(_) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => error_status(e.to_string()),
    }
}

/// Flips the armed flag.
pub async fn toggle(State(state): State<AppState>) -> Json<ArmResponse> {
    let armed = state.store.toggle_armed();
    Json(ArmResponse { auto_active: armed })
}

pub async fn arm(State(state): State<AppState>, Json(req): Json<ArmRequest>) -> Json<ArmResponse> {
    let armed = state.store.set_armed(req.armed);
    Json(ArmResponse { auto_active: armed })
}

pub async fn balance(State(state): State<AppState>) -> Response {
    let Some(public) = state.store.snapshot().public_id().map(str::to_string) else {
        return not_loaded();
    };
    match state.gateway.query_balance(&public).await {
        Ok(balances) => Json(BalancesResponse { balances }).into_response(),
        Err(e) => ledger_unavailable(e.to_string()),
    }
}

pub async fn history(State(state): State<AppState>) -> Response {
    let Some(public) = state.store.snapshot().public_id().map(str::to_string) else {
        return not_loaded();
    };
    match state
        .gateway
        .query_recent_history(&public, state.history_limit)
        .await
    {
        Ok(txs) => Json(HistoryResponse { txs }).into_response(),
        Err(e) => ledger_unavailable(e.to_string()),
    }
}

/// Runs one attempt now, armed or not.
pub async fn send(State(state): State<AppState>) -> Response {
    match state.submitter.submit_once().await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(CoreError::Wallet(WalletError::NotLoaded)) => not_loaded(),
        Err(CoreError::Config(ConfigError::MissingField { .. })) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Send configuration is not set" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.submitter.metrics().snapshot())
}

#[derive(Serialize)]
struct BalancesResponse {
    balances: Vec<Balance>,
}

#[derive(Serialize)]
struct HistoryResponse {
    txs: Vec<TxSummary>,
}

fn not_loaded() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": "No wallet loaded" })),
    )
        .into_response()
}

fn ledger_unavailable(msg: String) -> Response {
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": msg }))).into_response()
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(status))
        .route("/load", post(load))
        .route("/config", post(configure))
        .route("/toggle", get(toggle))
        .route("/arm", post(arm))
        .route("/balance", get(balance))
        .route("/txs", get(history))
        .route("/send", post(send))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
