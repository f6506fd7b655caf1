//! Handler types for registration intake

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::pipeline::RegistrationPipeline;
use crate::settings::EventDetails;

/// Application state for registration handlers
pub struct AppState {
    pub pipeline: Arc<RegistrationPipeline>,
    pub event: EventDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Registration successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Multipart form accepted by `POST /user/registration`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct RegistrationUpload {
    /// JSON array of participant objects
    #[schema(
        example = r#"[{"name":"Bob","email":"b@x.com","phone":"9999999999","collegeName":"WCE","yearOfStudy":2,"dualBoot":true}]"#
    )]
    pub participants: String,
    #[schema(example = "TXN1")]
    pub transaction_id: String,
    pub referral_code: Option<String>,
    /// Screenshot of the payment
    #[schema(value_type = String, format = Binary)]
    pub transaction_image: Vec<u8>,
}
