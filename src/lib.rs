use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod password;
pub mod repository;
pub mod search;
pub mod stores;

// Public and credential-gated route groups.
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};
pub use stores::{ArticleStore, AuthorRegistry, CredentialStore};

/// ApiDoc
///
/// Auto-generated OpenAPI document for every endpoint, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::update_user, handlers::delete_user,
        handlers::register_author, handlers::update_author, handlers::delete_author,
        handlers::register_news, handlers::update_news, handlers::delete_news,
        handlers::show_news
    ),
    components(
        schemas(
            models::Article, models::Credentials, models::RegisterUserRequest,
            models::UpdateUserRequest, models::DeleteUserRequest, models::RegisterAuthorRequest,
            models::UpdateAuthorRequest, models::DeleteAuthorRequest, models::RegisterNewsRequest,
            models::UpdateNewsRequest, models::DeleteNewsRequest, models::ShowNewsRequest,
            models::MessageResponse, models::SearchResponse,
        )
    ),
    tags(
        (name = "news-portal", description = "News Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of shared services, constructed once at startup and
/// cloned into every request. The stores are built from it on demand via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer: Postgres or in-memory, behind the `Repository` trait.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers and the `Authorized` extractor pull exactly the component they need.

impl FromRef<AppState> for CredentialStore {
    fn from_ref(app_state: &AppState) -> CredentialStore {
        CredentialStore::new(
            app_state.repo.clone(),
            app_state.config.hashing,
            app_state.config.delete_policy,
        )
    }
}

impl FromRef<AppState> for AuthorRegistry {
    fn from_ref(app_state: &AppState) -> AuthorRegistry {
        AuthorRegistry::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for ArticleStore {
    fn from_ref(app_state: &AppState) -> ArticleStore {
        ArticleStore::new(app_state.repo.clone(), app_state.config.search_limit)
    }
}

/// create_router
///
/// Assembles the routes, the Swagger UI, the observability layers and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .with_state(state);

    // Request id is set first so the trace span and the response both carry it.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, URI and the `x-request-id` so every log line
/// of one request correlates. Bodies are never logged: they carry passwords.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
