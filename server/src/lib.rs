use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use kb_core::config::TOP_K;
use kb_core::{render_context, search_top_k, ContextPage, Index, KnowledgeBase};
use kb_crawler::{crawl, CrawlConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { TOP_K }

#[derive(Deserialize)]
pub struct ContextParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub generation: u64,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub score: f32,
    pub title: String,
    pub body: String,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub generation: u64,
    pub num_docs: usize,
    pub vocabulary: usize,
    pub stem_groups: usize,
}

impl From<&Index> for StatsResponse {
    fn from(index: &Index) -> Self {
        Self {
            generation: index.generation(),
            num_docs: index.len(),
            vocabulary: index.vocabulary().len(),
            stem_groups: index.stem_group_count(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub kb: Arc<KnowledgeBase>,
    pub data_dir: PathBuf,
    pub admin_token: Option<String>,
}

/// Load the corpus from `data_dir` and publish the first index.
pub fn load_state(data_dir: impl Into<PathBuf>) -> Result<AppState> {
    let data_dir = data_dir.into();
    let kb = Arc::new(KnowledgeBase::new());
    kb.reload_from(&data_dir)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(AppState { kb, data_dir, admin_token })
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/context", get(context_handler))
        .route("/stats", get(stats_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Refresh every `every`, keeping the current index when a refresh fails.
///
/// With a crawl config each cycle re-crawls the sources into the data
/// directory before reloading it; without one it only reloads.
pub fn spawn_refresh(state: AppState, every: Duration, recrawl: Option<CrawlConfig>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await; // the first tick fires immediately
        loop {
            ticker.tick().await;
            match refresh(&state, recrawl.as_ref()).await {
                Ok(index) => tracing::info!(generation = index.generation(), recrawl = recrawl.is_some(), "scheduled refresh complete"),
                Err(err) => tracing::warn!(error = %format!("{err:#}"), "scheduled refresh failed"),
            }
        }
    })
}

/// Optionally crawl into the data directory, then reload it.
pub async fn refresh(state: &AppState, recrawl: Option<&CrawlConfig>) -> Result<Arc<Index>> {
    if let Some(cfg) = recrawl {
        match crawl(cfg).await {
            Ok(summary) => tracing::info!(visited = summary.visited, saved = summary.saved, failed = summary.failed, "recrawl complete"),
            // pages written before the failure still get loaded
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "recrawl failed"),
        }
    }
    reload(state).await
}

async fn reload(state: &AppState) -> Result<Arc<Index>> {
    let kb = state.kb.clone();
    let dir = state.data_dir.clone();
    tokio::task::spawn_blocking(move || kb.reload_from(&dir)).await?
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = Instant::now();
    let index = state.kb.snapshot();
    let k = params.k.clamp(1, TOP_K);

    let mut hits = search_top_k(&params.q, &index, usize::MAX);
    let total_hits = hits.len();
    hits.truncate(k);

    let results = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| SearchResult {
            rank: i + 1,
            score: hit.score,
            title: hit.document.title.clone(),
            body: hit.document.body.clone(),
            source: hit.document.source.clone(),
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::info!(query = %params.q, total_hits, took_s = elapsed.as_secs_f64(), "search");
    Json(SearchResponse { query: params.q, generation: index.generation(), took_s: elapsed.as_secs_f64(), total_hits, results })
}

/// The knowledge block for a prompt, as plain text.
pub async fn context_handler(State(state): State<AppState>, Query(params): Query<ContextParams>) -> String {
    let pages: Vec<ContextPage> = state.kb.search(&params.q);
    tracing::info!(query = %params.q, matched = pages.len(), "context");
    render_context(&pages)
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.kb.snapshot().as_ref()))
}

// --- Admin endpoints ---
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let index = reload(&state)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {err:#}")))?;
    Ok(Json(StatsResponse::from(index.as_ref())))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
