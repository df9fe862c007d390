//! HTTP API for the config generator
//!
//! Three endpoints: `GET /health`, `POST /generate-config`, and
//! `POST /reload-config`. The rule table lives behind an [`ArcSwap`] so a
//! reload replaces it atomically; requests in flight keep the snapshot they
//! loaded at the start of the request.

use crate::analyzer::DomainAnalyzer;
use crate::engine::{self, PerfmattersConfig};
use crate::error::{Error, Result};
use crate::rules::RuleTable;
use arc_swap::ArcSwap;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state handed to every handler
pub struct AppState {
    rules: ArcSwap<RuleTable>,
    rules_path: PathBuf,
    analyzer: DomainAnalyzer,
}

impl AppState {
    /// Load the initial rule table and build the state
    ///
    /// A failed initial load is fatal; the server refuses to start without a
    /// valid table.
    pub async fn new(rules_path: PathBuf) -> Result<Arc<Self>> {
        let table = RuleTable::load(&rules_path).await?;
        Ok(Arc::new(Self {
            rules: ArcSwap::from_pointee(table),
            rules_path,
            analyzer: DomainAnalyzer::new()?,
        }))
    }

    /// Current rule table snapshot
    pub fn rules(&self) -> Arc<RuleTable> {
        self.rules.load_full()
    }
}

/// Request body for `POST /generate-config`
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateRequest {
    /// Active plugin slugs; required, may be empty
    pub plugins: Vec<String>,
    /// Active (parent) theme slug
    #[serde(default)]
    pub theme: String,
    /// Site URL for domain analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether to run best-effort ad-provider detection on the domain
    #[serde(default)]
    pub analyze_domain: bool,
}

/// Match counts reported alongside the generated config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingInfo {
    /// Plugins that matched a rule entry
    pub plugins_processed: usize,
    /// Whether the theme matched a rule entry
    pub theme_processed: bool,
}

/// Response body for `POST /generate-config`
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub config: PerfmattersConfig,
    pub processing_info: ProcessingInfo,
    /// ISO 8601 generation timestamp
    pub generated_at: String,
    /// Providers found by domain analysis, empty when analysis did not run
    #[serde(default)]
    pub detected_ad_providers: Vec<String>,
    /// Set when domain analysis was requested but failed; the config above is
    /// still the full rule-based result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_warning: Option<String>,
}

/// Response body for `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Response body for `POST /reload-config`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

/// Error body for non-200 responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-config", post(generate_config))
        .route("/reload-config", post(reload_config))
        .with_state(state)
}

/// Bind and serve the API until the process is stopped
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(Error::Server)?;
    let local_addr = listener.local_addr().map_err(Error::Server)?;
    tracing::info!(%local_addr, "config generator API listening");

    axum::serve(listener, router(state))
        .await
        .map_err(Error::Server)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn generate_config(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    // Snapshot once; a concurrent reload must not affect this request
    let table = state.rules();
    let mut resolution = engine::resolve(&table, &request.plugins, &request.theme);

    let mut detected_ad_providers = Vec::new();
    let mut analysis_warning = None;

    if request.analyze_domain {
        match request.domain.as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => match state.analyzer.analyze(domain).await {
                Ok(analysis) => {
                    resolution.exclusions.extend_from(&analysis.exclusions);
                    detected_ad_providers = analysis.providers;
                }
                Err(e) => {
                    tracing::warn!(domain, error = %e, "domain analysis failed");
                    analysis_warning = Some(format!("domain analysis failed: {}", e));
                }
            },
            None => {
                analysis_warning =
                    Some("domain analysis requested but no domain provided".to_string());
            }
        }
    }

    tracing::info!(
        plugins = request.plugins.len(),
        plugins_processed = resolution.plugins_processed,
        theme = %request.theme,
        theme_processed = resolution.theme_processed,
        providers = detected_ad_providers.len(),
        "config generated"
    );

    Json(GenerateResponse {
        success: true,
        config: resolution.exclusions.to_config(),
        processing_info: ProcessingInfo {
            plugins_processed: resolution.plugins_processed,
            theme_processed: resolution.theme_processed,
        },
        generated_at: Utc::now().to_rfc3339(),
        detected_ad_providers,
        analysis_warning,
    })
    .into_response()
}

async fn reload_config(State(state): State<Arc<AppState>>) -> Response {
    match RuleTable::load(&state.rules_path).await {
        Ok(table) => {
            state.rules.store(Arc::new(table));
            tracing::info!(path = %state.rules_path.display(), "rule table reloaded");
            Json(ReloadResponse {
                success: true,
                message: "rule table reloaded".to_string(),
                timestamp: Utc::now().to_rfc3339(),
            })
            .into_response()
        }
        Err(e) => {
            // Previous table stays in effect
            tracing::error!(error = %e, "rule table reload failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("reload failed: {}", e),
            )
        }
    }
}
