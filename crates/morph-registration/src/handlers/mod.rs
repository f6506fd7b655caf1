//! HTTP handlers for registration intake

mod handler;
mod types;

pub use types::{AppState, MessageResponse, RegistrationUpload};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use morph_core::ProblemDetails;
use std::sync::Arc;
use utoipa::OpenApi;

/// Configure registration routes, limiting request bodies to
/// `max_body_bytes`
pub fn configure_routes(max_body_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .merge(handler::routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handler::welcome,
        handler::register_participants,
    ),
    components(
        schemas(
            MessageResponse,
            RegistrationUpload,
            ProblemDetails,
        )
    ),
    tags(
        (name = "Registration", description = "Event registration intake")
    )
)]
pub struct RegistrationApiDoc;
