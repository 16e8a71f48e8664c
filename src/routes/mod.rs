// HTTP routes

mod api_error;
mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::sample_repo::SampleRepo;

pub use api_error::ApiError;
pub use http::NO_DATA_MESSAGE;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) sample_repo: Arc<SampleRepo>,
}

pub fn app(sample_repo: Arc<SampleRepo>) -> Router {
    let state = AppState { sample_repo };
    Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/monitor", get(http::monitor_handler)) // GET /monitor
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
