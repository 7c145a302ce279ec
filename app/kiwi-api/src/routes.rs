//! Route handlers. Every handler takes the engine write lock: retrieval may
//! lazily load the persisted index, which needs `&mut`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::SharedEngine;

/// Upper bound for the optional `limit` query parameter.
const MAX_LIMIT: usize = 20;

fn clamp_limit(limit: Option<usize>) -> Option<usize> {
    limit.map(|l| l.clamp(1, MAX_LIMIT))
}

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ask", post(ask))
        .route("/search/je", get(search_je))
        .route("/search/faq", get(search_faq))
        .route("/search/advanced", get(search_advanced))
        .route("/legal/guidance", post(legal_guidance))
        .route("/reindex", post(reindex))
        .route("/stats", get(stats))
        .route("/health", get(health))
        .with_state(engine)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "kiwi-api",
        "endpoints": [
            "POST /ask",
            "GET /search/je",
            "GET /search/faq",
            "GET /search/advanced",
            "POST /legal/guidance",
            "POST /reindex",
            "GET /stats",
            "GET /health"
        ]
    }))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    debug: Option<bool>,
}

async fn ask(State(engine): State<SharedEngine>, Json(req): Json<AskRequest>) -> Json<Value> {
    let response = engine
        .write()
        .await
        .answer(&req.question, req.debug.unwrap_or(false))
        .await;
    Json(json!(response))
}

#[derive(Deserialize)]
struct JeQuery {
    ville: Option<String>,
    domaine: Option<String>,
    ecole: Option<String>,
    region: Option<String>,
    limit: Option<usize>,
}

async fn search_je(
    State(engine): State<SharedEngine>,
    Query(params): Query<JeQuery>,
) -> Json<Value> {
    let mut hits = engine.write().await.find_organizations(
        params.ville.as_deref(),
        params.domaine.as_deref(),
        params.ecole.as_deref(),
        params.region.as_deref(),
    );
    if let Some(limit) = clamp_limit(params.limit) {
        hits.truncate(limit);
    }
    Json(json!({ "count": hits.len(), "results": hits }))
}

#[derive(Deserialize)]
struct FaqQuery {
    q: String,
    categorie: Option<String>,
    limit: Option<usize>,
}

async fn search_faq(
    State(engine): State<SharedEngine>,
    Query(params): Query<FaqQuery>,
) -> Json<Value> {
    let mut hits = engine
        .write()
        .await
        .find_faq(&params.q, params.categorie.as_deref());
    if let Some(limit) = clamp_limit(params.limit) {
        hits.truncate(limit);
    }
    Json(json!({ "count": hits.len(), "results": hits }))
}

#[derive(Deserialize)]
struct AdvancedQuery {
    q: String,
    /// Comma-separated type labels to prefer.
    types: Option<String>,
    /// Comma-separated categories to boost.
    categories: Option<String>,
    limit: Option<usize>,
}

async fn search_advanced(
    State(engine): State<SharedEngine>,
    Query(params): Query<AdvancedQuery>,
) -> Json<Value> {
    let types: Option<Vec<&str>> = params
        .types
        .as_deref()
        .map(|s| s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect());
    let categories: Option<Vec<&str>> = params
        .categories
        .as_deref()
        .map(|s| s.split(',').map(str::trim).filter(|c| !c.is_empty()).collect());

    let mut results = engine
        .write()
        .await
        .search(&params.q, types.as_deref(), categories.as_deref());
    if let Some(limit) = clamp_limit(params.limit) {
        results.truncate(limit);
    }
    Json(json!({ "count": results.len(), "results": results }))
}

#[derive(Deserialize)]
struct GuidanceRequest {
    situation: String,
    categorie: Option<String>,
}

async fn legal_guidance(
    State(engine): State<SharedEngine>,
    Json(req): Json<GuidanceRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let guidance = engine
        .write()
        .await
        .legal_guidance(&req.situation, req.categorie.as_deref())
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(guidance)))
}

async fn reindex(
    State(engine): State<SharedEngine>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let total = engine
        .write()
        .await
        .rebuild_index()
        .map_err(internal_error)?;
    Ok(Json(json!({ "status": "rebuilt", "chunks": total })))
}

async fn stats(
    State(engine): State<SharedEngine>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = engine.write().await.stats().map_err(internal_error)?;
    Ok(Json(json!(stats)))
}

async fn health(State(engine): State<SharedEngine>) -> Json<Value> {
    let report = engine.read().await.health();
    Json(json!(report))
}

fn internal_error(e: kiwi_rag::RagError) -> (StatusCode, Json<Value>) {
    error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
