//! Decision to HTTP status mapping.
//!
//! Both outcomes carry an empty body. Rejections do not include a
//! `Retry-After` hint; clients back off on their own.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::admission::Decision;

impl Decision {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Decision::Admit => StatusCode::OK,
            Decision::Reject => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for Decision {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}
