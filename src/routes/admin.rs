use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Admin Router Module
///
/// Every mutation of companies and jobs, plus the user listing. The company and job routes
/// share paths with the public read routes and are merged alongside them. The login layer rejects anonymous callers with 401, and each
/// handler requires the admin privilege (403 otherwise).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", post(handlers::create_company))
        .route(
            "/companies/{handle}",
            patch(handlers::update_company).delete(handlers::delete_company),
        )
        .route("/jobs", post(handlers::create_job))
        .route(
            "/jobs/{id}",
            patch(handlers::update_job).delete(handlers::delete_job),
        )
        .route("/users", get(handlers::list_users))
}
