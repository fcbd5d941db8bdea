//! Inbound request handling.
//!
//! # Responsibilities
//! - Extract the client identifier from the query string
//! - Generate a request ID when the caller did not send one
//!
//! # Design Decisions
//! - Exactly one occurrence of the identifier parameter is accepted
//! - Identifier problems are the dispatcher's to report; the controller
//!   only ever sees valid identifiers

use axum::http::{HeaderValue, Request};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::admission::ClientId;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Why a request's client identifier was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("query parameter {0:?} is missing")]
    Missing(String),

    #[error("query parameter {param:?} given {occurrences} times")]
    Repeated { param: String, occurrences: usize },

    #[error("{value:?} is not an integer client id")]
    Invalid { value: String },
}

/// Pull the client identifier named `param` out of a raw query string.
pub fn extract_client_id(query: Option<&str>, param: &str) -> Result<ClientId, IdentifierError> {
    let values: Vec<String> = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == param)
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default();

    match values.as_slice() {
        [] => Err(IdentifierError::Missing(param.to_string())),
        [value] => value
            .trim()
            .parse::<ClientId>()
            .map_err(|_| IdentifierError::Invalid {
                value: value.clone(),
            }),
        many => Err(IdentifierError::Repeated {
            param: param.to_string(),
            occurrences: many.len(),
        }),
    }
}

/// Generates a UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
