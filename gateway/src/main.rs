use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use perimeter_risk::remote::{AnalysisClient, AnalysisClientConfig};
use perimeter_risk::{JsonFileRepository, MemoryRepository, OfficeRepository};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod routes;

use config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn OfficeRepository>,
    /// Remote analysis and discovery service, if configured
    pub analysis: Option<Arc<AnalysisClient>>,
    pub discovery_radius_m: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "perimeter_gateway=debug,perimeter_risk=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();

    let repo: Arc<dyn OfficeRepository> = match &config.store_path {
        Some(path) => {
            let repo = JsonFileRepository::open(path)?;
            tracing::info!("   Office store at {}", path.display());
            Arc::new(repo)
        }
        None => {
            tracing::warn!("   PERIMETER_STORE_PATH not set, offices are kept in memory only");
            Arc::new(MemoryRepository::new())
        }
    };
    tracing::info!("   Loaded {} offices", repo.list()?.len());

    let analysis = match &config.analysis_url {
        Some(url) => {
            let client = AnalysisClient::new(AnalysisClientConfig {
                timeout_sec: config.remote_timeout_sec,
                ..AnalysisClientConfig::with_base_url(url.as_str())
            })?;
            tracing::info!("   Analysis service at {}", client.base_url());
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("   No analysis service, using local evaluator and simulated POIs");
            None
        }
    };

    let state = AppState {
        repo,
        analysis,
        discovery_radius_m: config.discovery_radius_m,
    };

    let app = Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .nest("/api/v1", routes::office_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Perimeter Gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let offices = state.repo.list().map(|o| o.len()).unwrap_or(0);
    Json(serde_json::json!({
        "status": "healthy",
        "service": "perimeter-gateway",
        "offices": offices,
        "analysis": state.analysis.as_ref().map(|c| c.base_url().to_string()),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
