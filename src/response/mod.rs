//! Uniform error bodies for HTTP and gRPC style APIs.
//!
//! ```json
//! {
//!   "error": {
//!     "code": 404,
//!     "status": "Not Found",
//!     "message": "order 42 does not exist",
//!     "details": []
//!   }
//! }
//! ```

mod grpc;

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use grpc::{grpc_status_name, wrap_grpc, GrpcCode};

/// Top-level error response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code or gRPC code.
    pub code: i32,
    /// Text of `code`.
    pub status: String,
    pub message: String,
    pub details: Vec<Value>,
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for ErrorBody {}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorResponse {
    /// A 500 Internal Server Error response without message or details.
    pub fn new() -> Self {
        Self {
            error: ErrorBody {
                code: 500,
                status: http_status_text(500).to_string(),
                message: String::new(),
                details: Vec::new(),
            },
        }
    }

    /// A 500 response carrying the error's message.
    pub fn from_error(err: &(dyn std::error::Error + '_)) -> Self {
        Self::new().with_message(err.to_string())
    }

    pub fn with_http_code(mut self, code: u16) -> Self {
        self.error.code = i32::from(code);
        self.error.status = http_status_text(code).to_string();
        self
    }

    pub fn with_grpc_code(mut self, code: GrpcCode) -> Self {
        self.error.code = i32::from(code);
        self.error.status = grpc_status_name(code);
        self
    }

    pub fn with_code_and_status(mut self, code: i32, status: impl Into<String>) -> Self {
        self.error.code = code;
        self.error.status = status.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error.message = message.into();
        self
    }

    /// Appends any serializable detail. Values that fail to serialize are
    /// recorded as their error text.
    pub fn with_detail<T: Serialize + ?Sized>(mut self, detail: &T) -> Self {
        let value = serde_json::to_value(detail).unwrap_or_else(|e| Value::String(e.to_string()));
        self.error.details.push(value);
        self
    }

    /// Appends an error's message as a detail.
    pub fn with_error(mut self, err: &(dyn std::error::Error + '_)) -> Self {
        self.error.details.push(Value::String(err.to_string()));
        self
    }

    /// Appends the details of another error body.
    pub fn with_body_details(mut self, body: &ErrorBody) -> Self {
        self.error.details.extend(body.details.iter().cloned());
        self
    }
}

/// Canonical reason phrase for an HTTP status code, `""` if unknown.
pub fn http_status_text(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let resp = ErrorResponse::new();
        assert_eq!(resp.error.code, 500);
        assert_eq!(resp.error.status, "Internal Server Error");
        assert!(resp.error.details.is_empty());
    }

    #[test]
    fn test_from_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let resp = ErrorResponse::from_error(&io);
        assert_eq!(resp.error.message, "disk gone");
        assert_eq!(resp.error.code, 500);
    }

    #[test]
    fn test_builder_chain() {
        let nested = ErrorResponse::new().with_detail("inner").error;
        let io = std::io::Error::new(std::io::ErrorKind::Other, "cause");

        let resp = ErrorResponse::new()
            .with_http_code(404)
            .with_message("order 42 does not exist")
            .with_detail(&json!({"order": 42}))
            .with_error(&io)
            .with_body_details(&nested);

        assert_eq!(resp.error.code, 404);
        assert_eq!(resp.error.status, "Not Found");
        assert_eq!(
            resp.error.details,
            vec![json!({"order": 42}), json!("cause"), json!("inner")]
        );
        assert_eq!(resp.error.to_string(), "[Not Found] order 42 does not exist");
    }

    #[test]
    fn test_grpc_and_custom_codes() {
        let resp = ErrorResponse::new().with_grpc_code(GrpcCode::NotFound);
        assert_eq!(resp.error.code, 5);
        assert_eq!(resp.error.status, "NotFound");

        let resp = ErrorResponse::new().with_code_and_status(599, "Custom");
        assert_eq!((resp.error.code, resp.error.status.as_str()), (599, "Custom"));
    }

    #[test]
    fn test_http_status_text() {
        assert_eq!(http_status_text(200), "OK");
        assert_eq!(http_status_text(418), "I'm a teapot");
        assert_eq!(http_status_text(503), "Service Unavailable");
        assert_eq!(http_status_text(599), "");
        assert_eq!(http_status_text(42), "");

        let resp = ErrorResponse::new().with_http_code(599);
        assert_eq!((resp.error.code, resp.error.status.as_str()), (599, ""));
    }

    #[test]
    fn test_serialized_shape() {
        let resp = ErrorResponse::new().with_http_code(400).with_message("bad");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "error": {
                    "code": 400,
                    "status": "Bad Request",
                    "message": "bad",
                    "details": []
                }
            })
        );
    }
}
