mod catalog;
mod health;
mod users;

use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/catalog", catalog::router())
        .nest("/api/users", users::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler(uri: Uri) -> Response {
    AppError::not_found(format!("no route for {}", uri.path())).into_response()
}
