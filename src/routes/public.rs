use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints reachable without a credential.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /companies?name=...&minEmployees=...&maxEmployees=...
        // Explicit-only filtering; no query string lists everything.
        .route("/companies", get(handlers::list_companies))
        // GET /companies/dynamicQuery
        // Legacy listing that fills in default headcount bounds.
        .route("/companies/dynamicQuery", get(handlers::list_companies_legacy))
        .route("/companies/{handle}", get(handlers::get_company))
        // GET /jobs?title=...&minSalary=...&hasEquity=...
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{id}", get(handlers::get_job))
        // GET /jobs/title/{title}
        // Exact-title lookup.
        .route("/jobs/title/{title}", get(handlers::get_jobs_by_title))
}
