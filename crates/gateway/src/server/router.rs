//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Each entry of `routes` is mounted as `POST <api_prefix>/<route>`. Paths
/// under the prefix that are not listed fall through to the 404 handler.
/// The overall request timeout is derived from the backend client's timeout.
pub fn build(state: AppState, routes: &[String]) -> Router {
    let request_timeout = middleware::request_timeout(state.backend.timeout());
    let mut router: Router<AppState> = Router::new().route("/health", get(handlers::health));
    for route in routes {
        let path = format!("{}/{}", state.api_prefix, route);
        router = router.route(&path, post(handlers::relay));
    }

    router
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(middleware::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
