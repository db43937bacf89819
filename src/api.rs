//! REST API for the star registry
//!
//! A thin adapter: every handler translates one request into one ledger call
//! and serializes the block, star list or error that comes back.

use axum::{
    extract::{Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, Blockchain};
use crate::config::ServerConfig;
use crate::error::ChainError;

/// Shared handler state.
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<Blockchain>,
    api_stats: Arc<RwLock<ApiStats>>,
}

#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    challenges_issued: u64,
    stars_registered: u64,
    stars_rejected: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    pub fn new(blockchain: Blockchain) -> Self {
        Self::new_shared(Arc::new(blockchain))
    }

    /// Serve a ledger that other parts of the process also hold.
    pub fn new_shared(blockchain: Arc<Blockchain>) -> Self {
        Self {
            blockchain,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            challenges_issued: stats.challenges_issued,
            stars_registered: stats.stars_registered,
            stars_rejected: stats.stars_rejected,
            uptime_seconds: uptime,
            chain_height: self.blockchain.chain_height(),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InvalidInput(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(e) => {
                let status = match &e {
                    ChainError::MalformedMessage(_) | ChainError::Verification(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ChainError::ExpiredChallenge { .. } | ChainError::InvalidSignature => {
                        StatusCode::UNAUTHORIZED
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct ValidationRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct SubmitStarRequest {
    pub address: String,
    pub message: String,
    pub signature: String,
    pub star: serde_json::Value,
}

#[derive(Serialize)]
pub struct ChainValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub challenges_issued: u64,
    pub stars_registered: u64,
    pub stars_rejected: u64,
    pub uptime_seconds: u64,
    pub chain_height: u64,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Ownership endpoints
        .route("/requestValidation", post(request_validation))
        .route("/submitstar", post(submit_star))
        // Query endpoints
        .route("/chain/height", get(get_chain_height))
        .route("/block/hash/:hash", get(get_block_by_hash))
        .route("/block/height/:height", get(get_block_by_height))
        .route("/blocks/:address", get(get_stars_by_address))
        .route("/validate", get(validate_chain))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(
    node: Arc<Node>,
    server: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);

    let addr: SocketAddr = format!("{}:{}", server.host, server.api_port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_chain_height(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.blockchain.chain_height())
}

async fn request_validation(
    State(node): State<Arc<Node>>,
    Json(req): Json<ValidationRequest>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let address = req.address.trim();
    if address.is_empty() {
        return Err(ApiError::InvalidInput("address cannot be empty".to_string()));
    }
    if address.contains(':') {
        return Err(ApiError::InvalidInput("address cannot contain ':'".to_string()));
    }

    let message = node.blockchain.request_ownership_message(address);
    node.api_stats.write().await.challenges_issued += 1;
    Ok(Json(ValidationResponse { message }))
}

async fn submit_star(
    State(node): State<Arc<Node>>,
    Json(req): Json<SubmitStarRequest>,
) -> Result<Json<Block>, ApiError> {
    let result =
        node.blockchain
            .submit_star(&req.address, &req.message, &req.signature, req.star);

    let mut stats = node.api_stats.write().await;
    match result {
        Ok(block) => {
            stats.stars_registered += 1;
            Ok(Json(block))
        }
        Err(e) => {
            stats.stars_rejected += 1;
            Err(e.into())
        }
    }
}

async fn get_block_by_hash(
    State(node): State<Arc<Node>>,
    Path(hash): Path<String>,
) -> Result<Json<Block>, ApiError> {
    node.blockchain
        .get_block_by_hash(&hash)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block with hash {} not found", hash)))
}

async fn get_block_by_height(
    State(node): State<Arc<Node>>,
    Path(height): Path<u64>,
) -> Result<Json<Block>, ApiError> {
    node.blockchain
        .get_block_by_height(height)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block at height {} not found", height)))
}

async fn get_stars_by_address(
    State(node): State<Arc<Node>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    Json(node.blockchain.get_stars_by_wallet_address(&address))
}

async fn validate_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let errors = node.blockchain.validate_chain();
    Json(ChainValidationResponse {
        valid: errors.is_empty(),
        errors,
    })
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
