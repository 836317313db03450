//! HTTP front end: `GET /` runs OCR on the configured image and returns the
//! overlay page, `GET /files/*` serves the image itself.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::export::OverlayRenderer;
use crate::ocr::{OcrEngine, SourceImage};
use crate::pipeline::reconcile_output;
use crate::reconcile::PositionalReconciler;

pub const FILES_ROUTE: &str = "/files";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub files_dir: PathBuf,
    pub image_name: String,
    pub lookahead: usize,
}

impl ServerConfig {
    pub fn new(files_dir: PathBuf, image_name: String) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            files_dir,
            image_name,
            lookahead: 0,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn image_path(&self) -> PathBuf {
        self.files_dir.join(&self.image_name)
    }
}

pub struct AppState {
    pub config: ServerConfig,
    pub engine: Arc<dyn OcrEngine + Send + Sync>,
    pub renderer: OverlayRenderer,
    pub reconciler: PositionalReconciler,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: Arc<dyn OcrEngine + Send + Sync>) -> Self {
        let reconciler = PositionalReconciler::new().with_lookahead(config.lookahead);
        Self {
            config,
            engine,
            renderer: OverlayRenderer::new(FILES_ROUTE),
            reconciler,
        }
    }

    fn render_page(&self) -> Result<String> {
        let image = SourceImage::open(self.config.image_path())?;
        let output = self
            .engine
            .recognize(&image)
            .with_context(|| format!("OCR failed for {}", image.name()))?;
        let reconciliation = reconcile_output(&self.reconciler, &output)?;
        Ok(self.renderer.render(&reconciliation.document))
    }
}

/// Logs the full error chain and answers 500.
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %format!("{:#}", self.0), "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("could not build letterbox page: {}", self.0),
        )
            .into_response()
    }
}

async fn page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let html = tokio::task::spawn_blocking(move || state.render_page())
        .await
        .context("recognition task panicked")??;
    Ok(Html(html))
}

pub fn router(state: Arc<AppState>) -> Router {
    let files = ServeDir::new(&state.config.files_dir);
    Router::new()
        .route("/", get(page))
        .nest_service(FILES_ROUTE, files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServerConfig, engine: Arc<dyn OcrEngine + Send + Sync>) -> Result<()> {
    let addr = config.addr;
    let app = router(Arc::new(AppState::new(config, engine)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("letterbox listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("HTTP server error")?;
    Ok(())
}
