//! imgpdf Web - Web server for arranging images and exporting them as one PDF.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, header};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use imgpdf_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "imgpdf-web")]
#[command(author, version, about = "imgpdf Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Config file path
    #[arg(short, long, env = "IMGPDF_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,
}

fn build_router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    let body_limit = state.config.max_upload_mb.saturating_mul(1024 * 1024);

    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/session/{session_id}", get(routes::view_session))
        // API endpoints - HTML fragments (HTMX)
        .route("/api/upload", post(routes::upload_images))
        .route("/api/images/{session_id}", post(routes::add_images))
        .route("/api/images/{session_id}/{image_id}/move", post(routes::move_image))
        .route("/api/images/{session_id}/{image_id}/up", post(routes::move_image_up))
        .route("/api/images/{session_id}/{image_id}/down", post(routes::move_image_down))
        .route("/api/images/{session_id}/{image_id}/delete", post(routes::delete_image))
        // API endpoints - binary responses
        .route("/api/images/{session_id}/{image_id}", get(routes::get_image))
        .route("/api/generate/{session_id}", get(routes::generate_pdf))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Middleware
        // Cache-Control for HTML fragments - prevents bfcache issues with HTMX
        // (images/downloads set their own headers, so this only affects HTML)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    info!(
        "Sheet format {}, sessions expire after {}s",
        config.sheet, config.session_ttl_secs
    );

    let state = Arc::new(AppState::new(config));

    // Spawn background task for session cleanup (runs every 5 minutes)
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        let cleanup_interval = Duration::from_secs(5 * 60);
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = cleanup_state.cleanup_old_sessions().await;
            info!(
                "Completed session cleanup ({} expired, {} active)",
                removed,
                cleanup_state.session_count().await
            );
        }
    });

    let app = build_router(state, resolve_static_dir(args.static_dir.as_deref()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
