use serde::Serialize;

use super::{ErrorBody, ErrorResponse};

/// Canonical gRPC status codes.
pub use tonic::Code as GrpcCode;

#[derive(Serialize)]
struct Detail<'a> {
    code: i32,
    status: &'a str,
    message: String,
}

/// The code's canonical name, e.g. `NotFound`.
pub fn grpc_status_name(code: GrpcCode) -> String {
    format!("{code:?}")
}

/// Builds a response for `code`. The first detail records the message
/// itself, followed by one detail per cause carrying the cause's own code.
pub fn wrap_grpc(code: GrpcCode, message: &str, causes: &[ErrorBody]) -> ErrorResponse {
    let status = grpc_status_name(code);
    let mut resp = ErrorResponse::new()
        .with_grpc_code(code)
        .with_message(message)
        .with_detail(&Detail {
            code: i32::from(code),
            status: &status,
            message: format!("[from-grpc] {message}"),
        });

    for cause in causes {
        resp = resp.with_detail(&Detail {
            code: cause.code,
            status: &cause.status,
            message: cause.message.clone(),
        });
    }
    resp
}
