//! API route definitions.

use axum::{Router, extract::DefaultBodyLimit, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod audit;
pub mod documents;
pub mod health;
pub mod templates;
pub mod verify;
pub mod workflows;

/// Multipart framing overhead allowed on top of the content limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.storage.config().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(templates::routes())
        .merge(documents::routes())
        .merge(workflows::routes())
        .merge(audit::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(verify::routes())
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
}
