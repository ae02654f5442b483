use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
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

pub mod auth;
pub mod config;
pub mod criteria;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payload;
pub mod query;
pub mod repository;

// Routing split by guard (Public, Authenticated, Admin).
pub mod routes;
use auth::Access;
use error::AppError;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Generated OpenAPI document for every annotated handler and schema, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_companies, handlers::list_companies_legacy, handlers::get_company,
        handlers::create_company, handlers::update_company, handlers::delete_company,
        handlers::list_jobs, handlers::get_job, handlers::get_jobs_by_title,
        handlers::create_job, handlers::update_job, handlers::delete_job,
        handlers::list_users, handlers::get_user, handlers::delete_user,
        handlers::apply_for_job
    ),
    components(
        schemas(
            models::Company, models::CompanyDetail, models::Job, models::RemovedJob,
            models::NewCompany, models::NewJob, models::CompanyList, models::CompanyEnvelope,
            models::CompanyDetailEnvelope, models::JobList, models::JobEnvelope,
            models::DeletedCompany, models::DeletedJob, models::Applied,
            models::User, models::UserList, models::UserEnvelope, models::DeletedUser,
            error::ErrorBody, error::ErrorDetail, error::ErrorMessage,
        )
    ),
    tags(
        (name = "jobly", description = "Company and job listings API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for the services every request needs.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Configuration loaded at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_login
///
/// Route layer for protected routers: anonymous callers get 401 before any handler runs.
/// Admin and ownership checks are left to the handlers.
async fn require_login(access: Access, request: Request, next: Next) -> Result<Response, AppError> {
    let principal = access.require_authenticated()?;
    tracing::debug!(subject = %principal.subject, admin = principal.is_privileged, "caller authenticated");
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles all routes, applies the login layer to protected routers, and wraps
/// everything in request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_login)),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_login)),
        )
        .fallback(handlers::not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
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
/// Opens the per-request span with method, URI and the `x-request-id` set by the layer above,
/// so every log line of one request can be correlated.
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
