use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use morph_core::problemdetails::Problem;
use morph_core::ProblemDetails;
use tracing::info;

use super::types::{AppState, MessageResponse, RegistrationUpload};
use crate::error::RegistrationError;
use crate::validation::{
    Attachment, RegistrationForm, PARTICIPANTS_FIELD, REFERRAL_CODE_FIELD,
    TRANSACTION_ID_FIELD, TRANSACTION_IMAGE_FIELD,
};

/// Used when the image part carries no file name
const DEFAULT_IMAGE_NAME: &str = "transaction-image";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(welcome))
        .route("/user/registration", post(register_participants))
}

/// Greeting with the event name
#[utoipa::path(
    tag = "Registration",
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse)
    )
)]
pub async fn welcome(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    Json(MessageResponse::new(state.event.welcome()))
}

/// Register one or more participants with a payment proof
#[utoipa::path(
    tag = "Registration",
    post,
    path = "/user/registration",
    request_body(content = RegistrationUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Registration stored", body = MessageResponse),
        (status = 400, description = "Missing fields, invalid participants JSON or missing screenshot", body = ProblemDetails),
        (status = 413, description = "Payload too large", body = ProblemDetails),
        (status = 500, description = "Upload or persistence failed", body = ProblemDetails),
        (status = 504, description = "Registration timed out", body = ProblemDetails)
    )
)]
pub async fn register_participants(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, Problem> {
    let limit = state.pipeline.settings().max_payload_bytes;

    let form = match multipart {
        Ok(multipart) => read_form(multipart, limit).await,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(RegistrationError::PayloadTooLarge { limit })
        }
        Err(rejection) => Err(RegistrationError::InvalidForm(rejection.body_text())),
    };

    let outcome = match form {
        Ok(form) => state.pipeline.register(form).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => Ok(Json(MessageResponse::new("Registration successful"))),
        Err(e) => {
            if e.is_client_error() {
                info!("Registration rejected: {}", e);
            }
            Err(e.into())
        }
    }
}

/// Collect the known multipart fields. The first occurrence of a field wins.
async fn read_form(
    mut multipart: Multipart,
    limit: usize,
) -> Result<RegistrationForm, RegistrationError> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            PARTICIPANTS_FIELD | TRANSACTION_ID_FIELD | REFERRAL_CODE_FIELD => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                let slot = match name.as_str() {
                    PARTICIPANTS_FIELD => &mut form.participants,
                    TRANSACTION_ID_FIELD => &mut form.transaction_id,
                    _ => &mut form.referral_code,
                };
                slot.get_or_insert(text);
            }
            TRANSACTION_IMAGE_FIELD => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_NAME)
                    .to_string();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

                form.transaction_image.get_or_insert(Attachment {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(error: MultipartError, limit: usize) -> RegistrationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RegistrationError::PayloadTooLarge { limit }
    } else {
        RegistrationError::InvalidForm(error.body_text())
    }
}
