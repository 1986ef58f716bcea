//! In-process DynaRAG test server and shared contract scenarios.
//!
//! The server keeps chunks in memory and scores them by word overlap. It
//! mirrors the observable wire contract of a real deployment: list endpoints
//! answer `null` on an empty store, deletion supports `dry_run`, every request
//! is metered, and asking a question with nothing stored is rejected with 400.

#![allow(dead_code)]


use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dynarag_client::{DynaRagClient, DynaRagConfig};
use serde::Deserialize;
use serde_json::{Value, json};

pub const MODEL_NAME: &str = "fake-embedding-small";

#[derive(Debug, Clone, Default)]
pub struct FakeOptions {
    /// Bearer token every request must carry.
    pub token: Option<String>,
    /// Delay applied before each request is handled.
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone)]
struct StoredChunk {
    id: i64,
    document_id: i64,
    text: String,
    file_path: String,
    created_at: String,
}

#[derive(Debug, Default)]
struct FakeStore {
    next_chunk_id: i64,
    next_document_id: i64,
    documents: Vec<(i64, String)>,
    chunks: Vec<StoredChunk>,
    api_requests: u64,
}

impl FakeStore {
    fn document_for(&mut self, file_path: &str) -> i64 {
        if let Some((id, _)) = self.documents.iter().find(|(_, path)| path == file_path) {
            return *id;
        }
        self.next_document_id += 1;
        self.documents.push((self.next_document_id, file_path.to_string()));
        self.next_document_id
    }

    fn total_bytes(&self) -> u64 {
        self.chunks.iter().map(|c| c.text.len() as u64).sum()
    }

    fn deletion_stats(&self) -> Value {
        let documents: HashSet<i64> = self.chunks.iter().map(|c| c.document_id).collect();
        let paths: BTreeSet<&str> = self.chunks.iter().map(|c| c.file_path.as_str()).collect();
        let paths: Option<Vec<&str>> = if paths.is_empty() {
            None
        } else {
            Some(paths.into_iter().collect())
        };

        json!({
            "EmbeddingCount": self.chunks.len(),
            "DocumentCount": documents.len(),
            "FilePaths": paths,
        })
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<FakeStore>>,
    options: FakeOptions,
}

#[derive(Deserialize)]
struct AddChunkBody {
    chunk: String,
    filepath: String,
}

#[derive(Deserialize)]
struct SimilarBody {
    text: String,
    k: Option<usize>,
}

#[derive(Deserialize)]
struct QueryBody {
    text: String,
}

#[derive(Deserialize)]
struct DeleteParams {
    #[serde(default)]
    dry_run: bool,
}

/// A running in-process server. Aborted on drop.
pub struct FakeServer {
    pub base_url: String,
    store: Arc<Mutex<FakeStore>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeOptions::default()).await
    }

    pub async fn spawn_with(options: FakeOptions) -> Self {
        let store = Arc::new(Mutex::new(FakeStore::default()));
        let state = AppState {
            store: store.clone(),
            options,
        };

        let app = Router::new()
            .route("/api/chunk", post(add_chunk))
            .route("/api/similar", post(similar))
            .route("/api/query", post(query))
            .route("/api/chunks", get(list_chunks).delete(delete_chunks))
            .route("/api/stats", get(stats))
            .layer(middleware::from_fn_with_state(state.clone(), gate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server run");
        });

        Self {
            base_url: format!("http://{}", addr),
            store,
            handle,
        }
    }

    pub fn config(&self) -> DynaRagConfig {
        DynaRagConfig::new(self.base_url.clone())
    }

    pub fn client(&self) -> DynaRagClient {
        DynaRagClient::new(self.config()).expect("client for fake server")
    }

    pub fn api_requests(&self) -> u64 {
        self.store.lock().unwrap().api_requests
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(delay) = state.options.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(token) = &state.options.token {
        let expected = format!("Bearer {}", token);
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected);
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
        }
    }

    state.store.lock().unwrap().api_requests += 1;
    next.run(request).await
}

async fn add_chunk(State(state): State<AppState>, Json(body): Json<AddChunkBody>) -> Response {
    if body.chunk.is_empty() || body.filepath.is_empty() {
        return (StatusCode::BAD_REQUEST, "chunk and filepath are required").into_response();
    }

    let mut store = state.store.lock().unwrap();
    let document_id = store.document_for(&body.filepath);
    store.next_chunk_id += 1;
    let chunk = StoredChunk {
        id: store.next_chunk_id,
        document_id,
        text: body.chunk,
        file_path: body.filepath,
        created_at: format!("2024-05-01T10:00:{:02}Z", store.next_chunk_id % 60),
    };
    store.chunks.push(chunk);

    StatusCode::CREATED.into_response()
}

async fn similar(State(state): State<AppState>, Json(body): Json<SimilarBody>) -> Json<Value> {
    let store = state.store.lock().unwrap();
    if store.chunks.is_empty() {
        return Json(Value::Null);
    }

    let mut scored: Vec<(f64, &StoredChunk)> = store
        .chunks
        .iter()
        .map(|chunk| (word_overlap(&body.text, &chunk.text), chunk))
        .collect();
    // Worst match first unless limited; the client owns the final ordering.
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    if let Some(k) = body.k {
        scored.reverse();
        scored.truncate(k);
    }

    let results: Vec<Value> = scored
        .into_iter()
        .map(|(similarity, chunk)| {
            json!({
                "ID": chunk.id,
                "DocumentID": chunk.document_id,
                "ChunkText": chunk.text,
                "ChunkSize": chunk.text.len(),
                "FilePath": chunk.file_path,
                "Distance": 1.0 - similarity,
                "Similarity": similarity,
            })
        })
        .collect();
    Json(Value::Array(results))
}

async fn query(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    let store = state.store.lock().unwrap();
    let best = store.chunks.iter().max_by(|a, b| {
        word_overlap(&body.text, &a.text).total_cmp(&word_overlap(&body.text, &b.text))
    });

    match best {
        Some(chunk) => Json(json!({
            "answer": format!("According to {}: {}", chunk.file_path, chunk.text),
        }))
        .into_response(),
        None => (StatusCode::BAD_REQUEST, "no chunks available to answer from").into_response(),
    }
}

async fn list_chunks(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.lock().unwrap();
    if store.chunks.is_empty() {
        return Json(Value::Null);
    }

    let chunks: Vec<Value> = store
        .chunks
        .iter()
        .map(|chunk| {
            json!({
                "ID": chunk.id,
                "ChunkText": chunk.text,
                "ChunkSize": chunk.text.len(),
                "ModelName": MODEL_NAME,
                "CreatedAt": chunk.created_at,
                "FilePath": chunk.file_path,
                "DocumentID": chunk.document_id,
            })
        })
        .collect();
    Json(Value::Array(chunks))
}

async fn delete_chunks(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Json<Value> {
    let mut store = state.store.lock().unwrap();
    let stats = store.deletion_stats();
    if !params.dry_run {
        store.chunks.clear();
        store.documents.clear();
    }
    Json(stats)
}

async fn stats(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.lock().unwrap();
    let documents: HashSet<i64> = store.chunks.iter().map(|c| c.document_id).collect();
    Json(json!({
        "total_bytes": store.total_bytes(),
        "api_requests": store.api_requests,
        "document_count": documents.len(),
        "chunk_count": store.chunks.len(),
    }))
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard overlap of lowercase words, in `[0, 1]`.
fn word_overlap(query: &str, text: &str) -> f64 {
    let query = words(query);
    let text = words(text);
    let union = query.union(&text).count();
    if union == 0 {
        return 0.0;
    }
    query.intersection(&text).count() as f64 / union as f64
}
