use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any logged-in caller. The login layer applied in `create_router` answers
/// anonymous callers with 401 before a handler runs; the handler then checks that the
/// caller is an admin or the user named in the path.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route(
            "/users/{username}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        // POST /users/{username}/jobs/{id}
        // Records a job application on behalf of `username`.
        .route("/users/{username}/jobs/{id}", post(handlers::apply_for_job))
}
