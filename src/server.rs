//! HTTP query service.
//!
//! Exposes a [`RagSystem`] over HTTP using axum.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness message
//! - `GET /health` - Status with document count and start time
//! - `GET /stats` - Index statistics
//! - `POST /insert` - Embed and store documents
//! - `POST /search` - Retrieve the closest documents for a query
//! - `POST /query` - Retrieve and generate a grounded answer
//! - `POST /save` - Checkpoint the index to its snapshot path
//!
//! # Concurrency Model
//!
//! Handlers share one [`RagSystem`]. Searches take its read lock and run
//! concurrently; inserts and saves serialize on the write/read lock.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::RaglineError;
use crate::rag::{IngestDocument, QueryResponse, RagSystem};
use crate::vector::{IndexStats, SearchHit};

/// Shared application state
pub struct AppState {
    pub rag: Arc<RagSystem>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self {
            rag,
            started_at: Utc::now(),
        }
    }
}

/// Insert request body
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertRequest {
    pub documents: Vec<IngestDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    pub ids: Vec<String>,
    pub count: usize,
}

/// Search request body
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    /// Number of results to return (default from configuration)
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub query_time_ms: f64,
}

/// Query request body
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    #[serde(default)]
    pub k: Option<usize>,

    /// Generation budget in tokens
    #[serde(default)]
    pub max_length: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub total_documents: usize,
    pub dimension: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub path: String,
    pub total_documents: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps library errors onto HTTP responses.
pub struct ApiError(RaglineError);

impl From<RaglineError> for ApiError {
    fn from(err: RaglineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(self.0, RaglineError::Provider(_)) {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// GET / - Liveness message
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "RAG service running".to_string(),
    })
}

/// GET /health - Status and index size
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.rag.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        total_documents: stats.total_documents,
        dimension: stats.dimension,
        started_at: state.started_at,
    })
}

/// GET /stats - Index statistics
async fn stats(State(state): State<Arc<AppState>>) -> Json<IndexStats> {
    Json(state.rag.stats())
}

/// POST /insert - Embed and store documents
async fn insert(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InsertRequest>,
) -> ApiResult<(StatusCode, Json<InsertResponse>)> {
    let ids = state.rag.insert_documents(request.documents).await?;
    Ok((
        StatusCode::CREATED,
        Json(InsertResponse {
            count: ids.len(),
            ids,
        }),
    ))
}

/// POST /search - Retrieve the closest documents
async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let k = request
        .k
        .unwrap_or(state.rag.config().default_search_k);

    let start = Instant::now();
    let results = state.rag.retrieve(&request.query, k).await?;
    let query_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok(Json(SearchResponse {
        query: request.query,
        results,
        query_time_ms,
    }))
}

/// POST /query - Retrieve and generate
async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let config = state.rag.config();
    let k = request.k.unwrap_or(config.default_query_k);
    let max_length = request.max_length.unwrap_or(config.default_max_length);

    Ok(Json(state.rag.query(&request.query, k, max_length).await?))
}

/// POST /save - Checkpoint to the configured snapshot
async fn save(State(state): State<Arc<AppState>>) -> ApiResult<Json<SaveResponse>> {
    let path = state.rag.save().await?;
    Ok(Json(SaveResponse {
        status: "saved".to_string(),
        path: path.display().to_string(),
        total_documents: state.rag.stats().total_documents,
    }))
}

/// Create the axum router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/insert", post(insert))
        .route("/search", post(search))
        .route("/query", post(query))
        .route("/save", post(save))
        .layer(cors)
        .with_state(state)
}

/// Start the server and run until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(state);

    info!("Starting ragline server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::RagConfig;
    use crate::embedding::HashingTextEmbedder;
    use crate::error::Result;
    use crate::generation::TextGenerator;

    struct FixedGenerator;

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: usize) -> Result<String> {
            Ok("grounded answer".to_string())
        }
    }

    fn create_test_state(config: RagConfig) -> Arc<AppState> {
        let embedder = Arc::new(HashingTextEmbedder::new(config.dimension).unwrap());
        let rag = RagSystem::open(config, embedder, Arc::new(FixedGenerator)).unwrap();
        Arc::new(AppState::new(Arc::new(rag)))
    }

    async fn call(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_root_and_stats() {
        let state = create_test_state(RagConfig::default().with_dimension(32));
        let router = create_router(state);

        let (status, body) = call(router.clone(), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "RAG service running");

        let (status, body) = call(router, "GET", "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"total_documents": 0, "dimension": 32, "next_id": 0})
        );
    }

    #[tokio::test]
    async fn test_insert_search_query() {
        let state = create_test_state(RagConfig::default().with_dimension(128));
        let router = create_router(state);

        let (status, body) = call(
            router.clone(),
            "POST",
            "/insert",
            Some(json!({"documents": [
                {"data": "the borrow checker enforces ownership"},
                {"content": "tokio is an async runtime", "source": "docs"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["ids"], json!(["doc_0", "doc_1"]));

        let (status, body) = call(
            router.clone(),
            "POST",
            "/search",
            Some(json!({"query": "async runtime", "k": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "doc_1");
        assert_eq!(body["results"][0]["metadata"]["source"], "docs");

        let (status, body) = call(
            router.clone(),
            "POST",
            "/query",
            Some(json!({"query": "ownership"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "grounded answer");
        assert_eq!(body["retrieved_documents"].as_array().unwrap().len(), 2);

        let (_, body) = call(router, "GET", "/health", None).await;
        assert_eq!(body["total_documents"], 2);
    }

    #[tokio::test]
    async fn test_invalid_document_is_bad_request() {
        let state = create_test_state(RagConfig::default().with_dimension(16));
        let router = create_router(state);

        let (status, body) = call(
            router,
            "POST",
            "/insert",
            Some(json!({"documents": [{"title": "no body"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid document"));
    }

    #[tokio::test]
    async fn test_save_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let state = create_test_state(
            RagConfig::default()
                .with_dimension(16)
                .with_snapshot_path(&path),
        );
        let router = create_router(state);

        let (status, body) = call(router, "POST", "/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "saved");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_without_snapshot_path() {
        let state = create_test_state(RagConfig::default().with_dimension(16));
        let router = create_router(state);

        let (status, _) = call(router, "POST", "/save", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |err: RaglineError| ApiError::from(err).into_response().status();
        assert_eq!(
            status(RaglineError::dimension_mismatch(3, 2)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RaglineError::provider("timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(RaglineError::corrupt_snapshot("truncated")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
