use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use score_engine::{
    cache::NoopCache, store::SqliteStore, EngineConfig, GameResult, LeaderboardEntry, ResultPayload,
    ScoreEngine, ScoreEngineError, SubmitOutcome,
};

#[derive(Clone)]
struct AppState {
    engine: Arc<ScoreEngine>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardParams {
    #[serde(default)]
    limit: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
    game_mode: u32,
    entries: Vec<LeaderboardEntry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_engine_server=debug,score_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "scores.db".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8090);

    let config = match std::env::var("SCORE_CONFIG") {
        Ok(path) => EngineConfig::from_yaml_file(&path)?,
        Err(_) => EngineConfig::default(),
    };
    let config = config.overlay(&std::env::vars().collect::<HashMap<_, _>>());

    tracing::info!("🚀 Starting Score Engine Server");
    tracing::info!("📦 Database: {}", db_path);
    tracing::info!("🔌 Port: {}", port);
    tracing::info!("⏱️ Read timeout: {:?}, ranking: {:?}", config.read_timeout(), config.ranking);

    // No client-local cache on the server side
    let store = Arc::new(SqliteStore::new(&db_path).await?);
    let engine = ScoreEngine::with_parts(store, Arc::new(NoopCache), config);

    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/game-results", post(submit_handler))
        .route("/v1/leaderboard/:mode", get(leaderboard_handler))
        .route("/v1/best/:mode/:player", get(best_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("🎮 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: score_engine::VERSION.to_string(),
    })
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResultPayload>,
) -> Result<Response, AppError> {
    let result = GameResult::try_from(payload)?;
    let outcome: SubmitOutcome = state.engine.submit(&result).await?;

    let status = if outcome.accepted {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    tracing::info!(
        "{} {} → new best: {}",
        if outcome.accepted { "✅" } else { "❌" },
        result.display(),
        outcome.is_new_best
    );

    Ok((status, Json(outcome)).into_response())
}

async fn leaderboard_handler(
    State(state): State<AppState>,
    Path(mode): Path<u32>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let entries = state.engine.leaderboard_entries(mode, params.limit).await?;

    Ok(Json(LeaderboardResponse {
        game_mode: mode,
        entries,
    }))
}

async fn best_handler(
    State(state): State<AppState>,
    Path((mode, player)): Path<(u32, String)>,
) -> Result<Json<score_engine::BestRecord>, AppError> {
    match state.engine.best_score(&player, mode).await? {
        Some(record) => Ok(Json(record)),
        None => Err(AppError(ScoreEngineError::NotFound(format!("{} [{}w]", player, mode)))),
    }
}

// Error handling
struct AppError(ScoreEngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScoreEngineError::Validation(_) => StatusCode::BAD_REQUEST,
            ScoreEngineError::NotFound(_) => StatusCode::NOT_FOUND,
            ScoreEngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ScoreEngineError::Store(_) | ScoreEngineError::Database(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.0.to_string();

        tracing::error!("❌ Error: {} - {}", status, message);

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<ScoreEngineError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
