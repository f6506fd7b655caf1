//! Registration failures and their HTTP representation

use std::fmt;

use morph_blob::BlobError;
use morph_core::error_builder::{
    bad_request, gateway_timeout, internal_server_error, payload_too_large,
};
use morph_core::problemdetails::Problem;
use thiserror::Error;

use crate::store::StoreError;

/// Body `message` for every dependency failure
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Where a submission is in the intake pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Uploading,
    PersistingParticipants,
    PersistingRegistration,
    NotifyingDetached,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Uploading => "uploading",
            Stage::PersistingParticipants => "persisting participants",
            Stage::PersistingRegistration => "persisting registration",
            Stage::NotifyingDetached => "notifying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid participants JSON: {0}")]
    MalformedPayload(String),

    #[error("Transaction screenshot is required")]
    MissingAttachment,

    #[error("Payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to parse form: {0}")]
    InvalidForm(String),

    #[error("Image upload failed: {0}")]
    UploadFailed(#[source] BlobError),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[source] StoreError),

    #[error("Timed out while {0}")]
    Timeout(Stage),
}

impl RegistrationError {
    /// Whether the submission itself was at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistrationError::MissingField(_)
                | RegistrationError::MalformedPayload(_)
                | RegistrationError::MissingAttachment
                | RegistrationError::PayloadTooLarge { .. }
                | RegistrationError::InvalidForm(_)
        )
    }

    /// Message shown to the registrant
    pub fn public_message(&self) -> &'static str {
        match self {
            RegistrationError::MissingField(_) => "Missing required fields",
            RegistrationError::MalformedPayload(_) => "Invalid participants JSON",
            RegistrationError::MissingAttachment => "Transaction screenshot is required",
            RegistrationError::PayloadTooLarge { .. } => "Request payload too large",
            RegistrationError::InvalidForm(_) => "Failed to parse form",
            RegistrationError::UploadFailed(_)
            | RegistrationError::PersistenceFailed(_)
            | RegistrationError::Timeout(_) => REGISTRATION_FAILED,
        }
    }
}

impl From<RegistrationError> for Problem {
    fn from(error: RegistrationError) -> Self {
        let message = error.public_message();
        match &error {
            RegistrationError::MissingField(field) => bad_request()
                .title("Missing Field")
                .detail(error.to_string())
                .message(message)
                .value("field", *field)
                .build(),
            RegistrationError::MalformedPayload(_)
            | RegistrationError::MissingAttachment
            | RegistrationError::InvalidForm(_) => bad_request()
                .detail(error.to_string())
                .message(message)
                .build(),
            RegistrationError::PayloadTooLarge { limit } => payload_too_large()
                .detail(error.to_string())
                .message(message)
                .value("limit", *limit)
                .build(),
            // Dependency details stay in the log
            RegistrationError::UploadFailed(_) | RegistrationError::PersistenceFailed(_) => {
                internal_server_error().message(message).build()
            }
            RegistrationError::Timeout(stage) => gateway_timeout()
                .message(message)
                .value("stage", stage.to_string())
                .build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let cases = [
            (
                RegistrationError::MissingField("transactionId"),
                "Missing required fields",
            ),
            (
                RegistrationError::MalformedPayload("expected value".into()),
                "Invalid participants JSON",
            ),
            (
                RegistrationError::MissingAttachment,
                "Transaction screenshot is required",
            ),
        ];

        for (error, message) in cases {
            assert!(error.is_client_error());
            let problem = Problem::from(error);
            assert_eq!(problem.status_code, StatusCode::BAD_REQUEST);
            assert_eq!(problem.get_str("message"), Some(message));
        }
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let problem = Problem::from(RegistrationError::MissingField("participants"));
        assert_eq!(problem.get_str("field"), Some("participants"));
    }

    #[test]
    fn test_payload_too_large() {
        let problem = Problem::from(RegistrationError::PayloadTooLarge { limit: 1024 });
        assert_eq!(problem.status_code, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(problem.body.get("limit"), Some(&serde_json::json!(1024)));
    }

    #[test]
    fn test_dependency_failures_hide_details() {
        let error = RegistrationError::UploadFailed(BlobError::UploadFailed(
            "AccessDenied: bucket policy".into(),
        ));
        assert!(!error.is_client_error());

        let problem = Problem::from(error);
        assert_eq!(problem.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.get_str("message"), Some("Registration failed"));
        let body = serde_json::to_string(&problem.body).unwrap();
        assert!(!body.contains("AccessDenied"));
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let problem = Problem::from(RegistrationError::Timeout(Stage::PersistingParticipants));
        assert_eq!(problem.status_code, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(problem.get_str("stage"), Some("persisting participants"));
        assert_eq!(problem.get_str("message"), Some("Registration failed"));
    }
}
