use async_trait::async_trait;
use autopay_core::{
    AccountContext, AutoSubmitter, Balance, Keypair, LedgerError, LedgerGateway, MetricsCollector,
    SignedTx, TxSummary, WalletStore, WorkerConfig,
};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pi_wallet::keys::Sep5KeypairLoader;
use pi_wallet::web::{create_router, AppState};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const PHRASE: &str = "illness+spike+retreat+truth+genius+clock+brain+pass+fit+cave+bargain+toe";
const PUBLIC: &str = "GDRXE2BQUC3AZNPVFSCEZ76NJ3WWL25FYFK6RGZGIEKWE4SOOHSUJUJ6";
const SECRET: &str = "SBGWSG6BTNCKCOB3DIFBGCVMUPQFYPA2G4O34RMTB343OYPXU5DJDVMN";

#[derive(Default)]
struct StubLedger {
    submits: AtomicUsize,
}

#[async_trait]
impl LedgerGateway for StubLedger {
    async fn load_account(&self, public_id: &str) -> Result<AccountContext, LedgerError> {
        Ok(AccountContext {
            account_id: public_id.to_string(),
            sequence: 7,
            base_fee: 100,
        })
    }

    fn build_and_sign(
        &self,
        _account: &AccountContext,
        _destination: &str,
        _amount: &str,
        _memo: &str,
        _keypair: &Keypair,
    ) -> Result<SignedTx, LedgerError> {
        Ok(SignedTx {
            envelope_xdr: "AAAA".into(),
            hash: "feedbeef".into(),
        })
    }

    async fn submit(&self, tx: &SignedTx) -> Result<String, LedgerError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(tx.hash.clone())
    }

    async fn query_balance(&self, _public_id: &str) -> Result<Vec<Balance>, LedgerError> {
        Ok(vec![Balance {
            asset_type: "native".into(),
            asset_code: None,
            balance: "42.0000000".into(),
        }])
    }

    async fn query_recent_history(
        &self,
        _public_id: &str,
        limit: u32,
    ) -> Result<Vec<TxSummary>, LedgerError> {
        Ok((0..limit)
            .map(|i| TxSummary {
                hash: format!("hash{}", i),
                memo: None,
                created_at: "2024-03-01T12:00:00Z".into(),
                successful: true,
            })
            .collect())
    }
}

fn app() -> (Router, Arc<StubLedger>) {
    let ledger = Arc::new(StubLedger::default());
    let store = Arc::new(WalletStore::new());
    let submitter = Arc::new(AutoSubmitter::new(
        store.clone(),
        ledger.clone(),
        WorkerConfig::new(Duration::from_secs(1), Duration::from_secs(5)),
        Arc::new(MetricsCollector::default()),
    ));
    let router = create_router(AppState {
        store,
        submitter,
        loader: Arc::new(Sep5KeypairLoader::default()),
        gateway: ledger.clone(),
        history_limit: 3,
    });
    (router, ledger)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_load_rejects_invalid_mnemonic() {
    let (app, _) = app();

    let (status, body) = call(&app, form("/load", "mnemonic=hello+world")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["msg"], "Invalid mnemonic.");

    let (_, status_body) = call(&app, get("/status")).await;
    assert!(status_body["public"].is_null());
}

#[tokio::test]
async fn test_load_exposes_public_id_only() {
    let (app, _) = app();

    let (status, body) = call(&app, form("/load", &format!("mnemonic={}", PHRASE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["public"], PUBLIC);

    let (_, status_body) = call(&app, get("/status")).await;
    assert_eq!(status_body["public"], PUBLIC);
    assert_eq!(status_body["armed"], false);
    assert!(!status_body.to_string().contains(SECRET));
}

#[tokio::test]
async fn test_config_validates_and_trims() {
    let (app, _) = app();

    let (status, body) = call(&app, form("/config", "destination=GDEST&amount=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, body) = call(
        &app,
        form("/config", "destination=+GDEST+&amount=1.5&memo=rent"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, status_body) = call(&app, get("/status")).await;
    assert_eq!(status_body["config"]["destination"], "GDEST");
    assert_eq!(status_body["config"]["amount"], "1.5");
    assert_eq!(status_body["config"]["memo"], "rent");
}

#[tokio::test]
async fn test_toggle_and_arm() {
    let (app, _) = app();

    let (_, body) = call(&app, get("/toggle")).await;
    assert_eq!(body["auto_active"], true);
    let (_, body) = call(&app, get("/toggle")).await;
    assert_eq!(body["auto_active"], false);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/arm")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"armed":true}"#))
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auto_active"], true);

    let (_, status_body) = call(&app, get("/status")).await;
    assert_eq!(status_body["armed"], true);
}

#[tokio::test]
async fn test_ledger_queries_need_a_wallet() {
    let (app, _) = app();

    let (status, body) = call(&app, get("/balance")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    call(&app, form("/load", &format!("mnemonic={}", PHRASE))).await;

    let (status, body) = call(&app, get("/balance")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"][0]["asset_type"], "native");
    assert_eq!(body["balances"][0]["balance"], "42.0000000");

    let (status, body) = call(&app, get("/txs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["txs"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_manual_send_records_outcome() {
    let (app, ledger) = app();

    let (status, _) = call(&app, empty_post("/send")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(&app, form("/load", &format!("mnemonic={}", PHRASE))).await;
    let (status, _) = call(&app, empty_post("/send")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ledger.submits.load(Ordering::SeqCst), 0);

    call(&app, form("/config", "destination=GDEST&amount=2")).await;
    let (status, body) = call(&app, empty_post("/send")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["tx_hash"], "feedbeef");
    assert_eq!(body["source"], PUBLIC);
    assert_eq!(ledger.submits.load(Ordering::SeqCst), 1);

    let (_, status_body) = call(&app, get("/status")).await;
    assert_eq!(status_body["last_result"]["tx_hash"], "feedbeef");

    let (_, metrics) = call(&app, get("/metrics")).await;
    assert!(metrics.is_object());
}
