use crate::problemdetails;
use axum::http::StatusCode;
use serde::Serialize;
use std::collections::HashMap;

/// Base of every problem "type" URI
pub const PROBLEM_TYPE_BASE: &str = "https://meta2k25.wcewlug.org/probs";

pub struct ErrorBuilder {
    status: StatusCode,
    type_: String,
    title: String,
    detail: String,
    instance: String,
    values: HashMap<String, serde_json::Value>,
}

impl ErrorBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            type_: String::new(),
            title: String::new(),
            detail: String::new(),
            instance: String::new(),
            values: HashMap::new(),
        }
    }

    pub fn type_(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Registrant-facing message, kept separate from the technical detail
    pub fn message(self, message: impl Into<String>) -> Self {
        self.value("message", message.into())
    }

    pub fn value<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.values.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> problemdetails::Problem {
        let mut problem = problemdetails::new(self.status)
            .with_type(self.type_)
            .with_title(self.title)
            .with_detail(self.detail)
            .with_instance(self.instance)
            .with_value("timestamp", chrono::Utc::now().to_rfc3339());

        for (key, value) in self.values {
            problem = problem.with_value(&key, value);
        }

        problem
    }
}

fn problem_type(slug: &str) -> String {
    format!("{}/{}", PROBLEM_TYPE_BASE, slug)
}

// Common error builders
pub fn internal_server_error() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
        .type_(problem_type("internal-server-error"))
        .title("Internal Server Error")
        .detail("An unexpected error occurred while processing your request")
        .instance("/error/internal-server-error")
        .value("error_code", "INTERNAL_SERVER_ERROR")
}

pub fn bad_request() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::BAD_REQUEST)
        .type_(problem_type("bad-request"))
        .title("Bad Request")
        .detail("The request was malformed or invalid")
        .instance("/error/bad-request")
}

pub fn payload_too_large() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::PAYLOAD_TOO_LARGE)
        .type_(problem_type("payload-too-large"))
        .title("Payload Too Large")
        .detail("The request body exceeds the allowed size")
        .instance("/error/payload-too-large")
        .value("error_code", "PAYLOAD_TOO_LARGE")
}

pub fn bad_gateway() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::BAD_GATEWAY)
        .type_(problem_type("bad-gateway"))
        .title("Bad Gateway")
        .detail("An upstream service failed to handle the request")
        .instance("/error/bad-gateway")
        .value("error_code", "BAD_GATEWAY")
}

pub fn gateway_timeout() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::GATEWAY_TIMEOUT)
        .type_(problem_type("gateway-timeout"))
        .title("Gateway Timeout")
        .detail("The request did not complete in time")
        .instance("/error/gateway-timeout")
        .value("error_code", "GATEWAY_TIMEOUT")
}
