//! HTTP routes for submitting claim scores, mining, and reading the chain.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chain::{ForkSelector, Ledger, MineOutcome};
use crate::model::BlockRecord;
use crate::pool::{PendingClaim, Submission};

/// Shared application state passed to Axum handlers. All ledger access goes
/// through the one async mutex; readers wait on it without blocking a runtime
/// worker while `/mine` holds it.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub node_id: String,
}

impl AppState {
    pub fn new(ledger: Ledger, node_id: impl Into<String>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            node_id: node_id.into(),
        }
    }
}

type ApiError = (StatusCode, String);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/mine", get(mine_block))
        .route("/transactions/new", post(new_transaction))
        .route("/transactions/pending", get(pending_transactions))
        .route("/chain", get(full_chain))
        .route("/validate", get(validate_chain))
        .route("/fork/:selector", get(fork_chain))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(state)
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// GET /
#[derive(Serialize)]
pub struct Greeting {
    pub message: &'static str,
    pub node_id: String,
}
pub async fn root(State(state): State<AppState>) -> Json<Greeting> {
    Json(Greeting {
        message: "Welcome to the claim ledger node",
        node_id: state.node_id,
    })
}

/// GET /mine — commit every pending claim. `current_index` is `false` when
/// nothing was committed.
#[derive(Serialize)]
pub struct MineResp {
    pub message: &'static str,
    pub current_index: Value,
    pub committed: Vec<u64>,
    pub skipped: Vec<SkippedResp>,
}

#[derive(Serialize)]
pub struct SkippedResp {
    pub claim: String,
    pub reason: String,
}

pub async fn mine_block(State(state): State<AppState>) -> Result<Json<MineResp>, ApiError> {
    info!("mine requested");
    let ledger = state.ledger.clone();
    // CPU-bound nonce search
    let outcome = tokio::task::spawn_blocking(move || ledger.blocking_lock().mine())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("mining task failed: {e}")))?;

    let current_index = outcome
        .last_index()
        .map(Value::from)
        .unwrap_or(Value::Bool(false));
    let resp = match outcome {
        MineOutcome::NothingToMine => MineResp {
            message: "No transactions to mine",
            current_index,
            committed: vec![],
            skipped: vec![],
        },
        MineOutcome::Mined { committed, skipped } => MineResp {
            message: if committed.is_empty() {
                "No block forged"
            } else {
                "New block forged"
            },
            current_index,
            committed,
            skipped: skipped
                .into_iter()
                .map(|s| SkippedResp {
                    claim: s.label,
                    reason: s.error.to_string(),
                })
                .collect(),
        },
    };
    Ok(Json(resp))
}

/// POST /transactions/new — body is a claim label (JSON string) or a score (JSON number).
pub async fn new_transaction(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let mut guard = state.ledger.lock().await;
    guard.submit(submission).map_err(|e| {
        warn!(error = %e, "transaction rejected");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: "Transaction added and will be mined soon",
        }),
    ))
}

/// GET /transactions/pending
pub async fn pending_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingClaim>>, ApiError> {
    let guard = state.ledger.lock().await;
    Ok(Json(guard.pool().pending().to_vec()))
}

/// GET /chain — committed blocks after genesis.
#[derive(Serialize)]
pub struct ChainResp {
    pub chain: Vec<BlockRecord>,
    pub length: usize,
}
pub async fn full_chain(State(state): State<AppState>) -> Result<Json<ChainResp>, ApiError> {
    let guard = state.ledger.lock().await;
    Ok(Json(ChainResp {
        chain: guard.records_after_genesis(),
        length: guard.chain_length(),
    }))
}

/// GET /validate — re-check linkage and proofs; returns { ok, errors[] }
#[derive(Serialize)]
pub struct ValidateResp {
    pub ok: bool,
    pub errors: Vec<String>,
}
pub async fn validate_chain(State(state): State<AppState>) -> Result<Json<ValidateResp>, ApiError> {
    let guard = state.ledger.lock().await;
    let errors = guard.validate_chain();
    Ok(Json(ValidateResp {
        ok: errors.is_empty(),
        errors,
    }))
}

/// GET /fork/:selector — read-only view of a snapshot (`latest`, `whole`, `all` or an index).
pub async fn fork_chain(
    State(state): State<AppState>,
    Path(selector): Path<String>,
) -> Result<Json<ChainResp>, ApiError> {
    let selector: ForkSelector = selector
        .parse()
        .map_err(|e: crate::error::ForkSelectorError| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let snapshot = state.ledger.lock().await.fork(selector);
    Ok(Json(ChainResp {
        chain: snapshot.records_after_genesis(),
        length: snapshot.chain_length(),
    }))
}

/// GET /health
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET /version
#[derive(Serialize)]
pub struct Version {
    pub version: &'static str,
    pub git_sha: Option<&'static str>,
}
pub async fn version() -> Json<Version> {
    Json(Version {
        version: env!("CARGO_PKG_VERSION"),
        git_sha: option_env!("GIT_SHA"),
    })
}
