//! Router setup.

use axum::Router;
use axum::http::Uri;
use tower_http::trace::TraceLayer;

use crate::Error;
use crate::routes;
use crate::state::AppState;

/// Builds the application router: HTML pages plus the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::pages::routes())
        .merge(routes::api::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> Error {
    Error::NotFound(uri.path().to_string())
}
