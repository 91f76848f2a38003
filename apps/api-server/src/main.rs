//! api-server — HTTP front end for the URL Shortener workspace.
//!
//! Serves the creation page, the short code redirects and a JSON listing:
//! - `GET /{code}`: 302 to the stored URL and count the visit, or 404.
//! - `GET /`: form plus a table of all links, newest first.
//! - `POST /` with form field `longurl`: create or reuse a short link and
//!   re-render the page with the result.
//! - `GET /?action=list` or `?action=api`: every record as JSON.
//!
//! Storage: one JSON document on disk (default) or memory.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # keep links somewhere else
//! DATA_FILE=/var/lib/shortener/data.json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;
mod render;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::rejection::FormRejection;
use axum::http::{header, HeaderValue};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use domain::adapters::memory_store::InMemoryStore;
use domain::code::RandomCodeGenerator;
use domain::registry::LinkRegistry;
use domain::{CoreError, LinkSet, LinkStore, SystemClock};
use json_store::{JsonFileStore, StoredRecord};
use serde::Deserialize;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use render::{Feedback, Page};

const INVALID_URL_MSG: &str = "Invalid URL. Use format like https://example.com";
const CREATE_FAILED_MSG: &str = "Could not save the short link. Please try again.";

// Store selected at startup.
enum AnyStore {
    Memory(InMemoryStore),
    File(JsonFileStore),
}

impl LinkStore for AnyStore {
    fn load(&self) -> Result<LinkSet, CoreError> {
        match self {
            AnyStore::Memory(s) => s.load(),
            AnyStore::File(s) => s.load(),
        }
    }

    fn save(&self, links: &LinkSet) -> Result<(), CoreError> {
        match self {
            AnyStore::Memory(s) => s.save(links),
            AnyStore::File(s) => s.save(links),
        }
    }
}

type Registry = LinkRegistry<AnyStore, RandomCodeGenerator, SystemClock>;

#[derive(Clone)]
struct AppState {
    // Serializes load/mutate/save within this process. Other processes
    // sharing the document can still overwrite each other.
    registry: Arc<Mutex<Registry>>,
    shortlink_domain: Option<String>,
}

impl AppState {
    fn new(store: AnyStore, shortlink_domain: Option<String>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(LinkRegistry::new(
                store,
                RandomCodeGenerator::default(),
                SystemClock,
            ))),
            shortlink_domain,
        }
    }

    fn with_registry<T>(
        &self,
        f: impl FnOnce(&Registry) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| CoreError::Store("registry mutex poisoned".into()))?;
        f(&registry)
    }

    fn base_url(&self, headers: &HeaderMap) -> String {
        let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        http_common::base_url(
            self.shortlink_domain.as_deref(),
            header_str("x-forwarded-proto"),
            header_str("host").unwrap_or(""),
        )
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_volatile();

    let state = AppState::new(build_store(&cfg), cfg.shortlink_domain.clone());

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let app = routes(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the store selected by config.
fn build_store(cfg: &config::Config) -> AnyStore {
    match cfg.storage_provider {
        config::StorageProvider::File => {
            info!(path = %cfg.data_file.display(), "using json file store");
            AnyStore::File(JsonFileStore::new(cfg.data_file.clone()))
        }
        config::StorageProvider::Memory => AnyStore::Memory(InMemoryStore::new()),
    }
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/index.php", get(index).post(submit))
        .route("/:code", get(follow_code))
        .with_state(state)
}

#[derive(Deserialize, Default)]
struct PageQuery {
    #[serde(default)]
    action: Option<String>,
}

impl PageQuery {
    fn wants_listing(&self) -> bool {
        matches!(self.action.as_deref(), Some("list" | "api"))
    }
}

#[derive(Deserialize)]
struct SubmitForm {
    #[serde(default)]
    longurl: Option<String>,
}

async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Response {
    if q.wants_listing() {
        return listing(&state);
    }
    render_page(&state, &headers, StatusCode::OK, None, None)
}

async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Response {
    // A POST without the field just shows the page
    let Some(raw) = form.ok().and_then(|Form(f)| f.longurl) else {
        if q.wants_listing() {
            return listing(&state);
        }
        return render_page(&state, &headers, StatusCode::OK, None, None);
    };

    let (status, feedback, created) = match state.with_registry(|r| r.create_or_reuse(&raw)) {
        Ok(c) => {
            info!(code = %c.record.short_code, reused = c.reused, "create ok");
            let msg = if c.reused {
                "URL already shortened."
            } else {
                "Short link created."
            };
            (StatusCode::OK, Feedback::Info(msg), Some(c.record))
        }
        Err(CoreError::InvalidUrl(_)) => (StatusCode::OK, Feedback::Info(INVALID_URL_MSG), None),
        Err(e) => {
            error!(err = ?e, "create error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Feedback::Error(CREATE_FAILED_MSG),
                None,
            )
        }
    };

    if q.wants_listing() && status == StatusCode::OK {
        return listing(&state);
    }
    render_page(&state, &headers, status, Some(feedback), created.as_ref())
}

async fn follow_code(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.with_registry(|r| r.resolve(&code)) {
        Ok(resolved) => {
            if let Some(e) = &resolved.visit_error {
                warn!(code = %code, err = ?e, "visit count not saved");
            }
            match HeaderValue::from_str(&resolved.target) {
                Ok(location) => {
                    info!(code = %code, redirect_to = %resolved.target, "resolve ok");
                    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
                }
                Err(e) => {
                    error!(code = %code, err = %e, "stored url is not a valid location");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Html(render::INTERNAL_ERROR_BODY),
                    )
                        .into_response()
                }
            }
        }
        Err(CoreError::NotFound) => {
            warn!(code = %code, "resolve 404");
            (StatusCode::NOT_FOUND, Html(render::NOT_FOUND_BODY)).into_response()
        }
        Err(e) => {
            error!(code = %code, err = ?e, "resolve error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::INTERNAL_ERROR_BODY),
            )
                .into_response()
        }
    }
}

fn listing(state: &AppState) -> Response {
    match state.with_registry(|r| r.list()) {
        Ok(links) => {
            let out: Vec<StoredRecord> = links.iter().map(StoredRecord::from).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => {
            error!(err = ?e, "list error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    feedback: Option<Feedback<'_>>,
    created: Option<&domain::LinkRecord>,
) -> Response {
    let links = match state.with_registry(|r| r.list()) {
        Ok(l) => l,
        Err(e) => {
            error!(err = ?e, "list error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::INTERNAL_ERROR_BODY),
            )
                .into_response();
        }
    };
    let base = state.base_url(headers);
    let page = Page {
        base: &base,
        feedback,
        created,
        links: &links,
    };
    (status, Html(page.render())).into_response()
}
