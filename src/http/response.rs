//! Response reconciliation.
//!
//! # Responsibilities
//! - Pass backend responses through (status, reason, headers, body)
//! - Strip framing headers the serving layer recomputes
//! - Map transport failures to 599 (timeout) or 500 (anything else)
//!
//! # Design Decisions
//! - Repeated headers are appended one by one, never merged
//! - Backend error statuses are authoritative and passed through verbatim

use axum::body::Body;
use axum::http::header::{self, HeaderName};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::net::{InboundResponse, TransportError, TransportErrorKind};

/// Headers describing the backend connection's framing, not the payload.
pub const FRAMING_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONTENT_ENCODING,
    header::CONNECTION,
];

/// Non-standard "network connect/read timeout" code.
pub const NETWORK_TIMEOUT_CODE: u16 = 599;

/// Status reported when the backend did not answer in time.
pub fn network_timeout_status() -> StatusCode {
    // `from_u16` only rejects codes outside 100..=999.
    StatusCode::from_u16(NETWORK_TIMEOUT_CODE).expect("599 is a valid status code")
}

pub fn is_framing_header(name: &HeaderName) -> bool {
    FRAMING_HEADERS.contains(name)
}

/// Turn a dispatch outcome into the response sent to the client.
pub fn reconcile(outcome: Result<InboundResponse, TransportError>) -> Response {
    match outcome {
        Ok(inbound) => passthrough(inbound),
        Err(err) => {
            let status = match err.kind() {
                TransportErrorKind::Timeout => network_timeout_status(),
                TransportErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string()).into_response()
        }
    }
}

fn passthrough(inbound: InboundResponse) -> Response {
    let mut response = Response::new(Body::from(inbound.body));
    *response.status_mut() = inbound.status;
    if let Some(reason) = inbound.reason {
        response.extensions_mut().insert(reason);
    }

    let headers = response.headers_mut();
    for (name, value) in inbound.headers.iter() {
        if !is_framing_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    response
}
