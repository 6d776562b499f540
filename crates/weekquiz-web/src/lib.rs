//! Static file server for the quiz front end.
//!
//! Serves a directory (the emitted dataset plus the front-end assets) with
//! permissive cross-origin headers on every response.

use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use weekquiz_core::config_file::ConfigFile;
use weekquiz_core::read_dataset;

pub const DEFAULT_PORT: u16 = 8000;
pub const DATASET_FILE: &str = "quiz_data.json";

/// Port and document root after layering flags, environment, and config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    pub root: PathBuf,
}

impl ServerSettings {
    /// Resolve settings: CLI flag > environment > config file > default.
    ///
    /// `env_port` and `env_root` are the raw `WEEKQUIZ_PORT` and
    /// `WEEKQUIZ_ROOT` values.
    pub fn resolve(
        port_flag: Option<u16>,
        root_flag: Option<PathBuf>,
        env_port: Option<String>,
        env_root: Option<String>,
        config: &ConfigFile,
    ) -> anyhow::Result<Self> {
        let env_port = env_port
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|e| anyhow::anyhow!("invalid WEEKQUIZ_PORT {raw:?}: {e}"))
            })
            .transpose()?;

        let port = port_flag
            .or(env_port)
            .or_else(|| config.server_port())
            .unwrap_or(DEFAULT_PORT);
        let root = root_flag
            .or_else(|| env_root.map(PathBuf::from))
            .or_else(|| config.server_root())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { port, root })
    }
}

/// Router serving `root` as static files.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn(permissive_cors))
        .layer(TraceLayer::new_for_http())
}

/// Answer bare `OPTIONS` requests and stamp CORS headers on every response.
async fn permissive_cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Log what the front end is about to load from `root`.
///
/// A missing or inconsistent dataset is only warned about; the directory is
/// served regardless.
pub fn report_dataset(root: &Path) {
    let path = root.join(DATASET_FILE);
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no quiz dataset found; run `weekquiz build` first");
        return;
    }
    match read_dataset(&path) {
        Ok(dataset) => match dataset.check_invariants() {
            Ok(()) => tracing::info!(
                path = %path.display(),
                questions = dataset.total_questions,
                weeks = dataset.week_count(),
                "serving quiz dataset"
            ),
            Err(violation) => {
                tracing::warn!(path = %path.display(), %violation, "quiz dataset is inconsistent")
            }
        },
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "quiz dataset is unreadable"),
    }
}
