use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use morph_registration::{
    configure_routes, AppState, EventDetails, RegistrationApiDoc, RegistrationPipeline,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::shutdown::shutdown_signal;

/// Registration routes with Swagger UI, CORS and request tracing
pub fn build_router(
    pipeline: Arc<RegistrationPipeline>,
    event: EventDetails,
    cors_origins: &[String],
) -> anyhow::Result<Router> {
    let max_body_bytes = pipeline.settings().max_payload_bytes;
    let state = Arc::new(AppState { pipeline, event });

    let app = configure_routes(max_body_bytes)
        .with_state(state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", RegistrationApiDoc::openapi()),
        )
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins: Vec<&String> = origins.iter().filter(|o| !o.trim().is_empty()).collect();

    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let parsed = origins
            .iter()
            .map(|o| HeaderValue::from_str(o.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        debug!("Restricting CORS to {} origin(s)", parsed.len());
        AllowOrigin::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
}

pub async fn start_api_server(address: &str, app: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("Registration API listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Registration API server exited");
    Ok(())
}
