//! Request translation.
//!
//! # Responsibilities
//! - Percent-encode the path remainder without double-encoding reserved characters
//! - Build the placeholder `http://localhost/...` URI, keeping the query verbatim
//! - Copy inbound headers and stamp the proxy context headers
//!
//! # Design Decisions
//! - The URI host is a placeholder; the socket path does the addressing
//! - Context headers always override inbound values of the same name

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{request, Method};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::routing::{mount_path, ProxyTarget};

/// Characters left as-is when encoding the path remainder.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where the backend is proxied from, for backends that inspect it.
pub const X_FORWARDED_CONTEXT: HeaderName = HeaderName::from_static("x-forwarded-context");
pub const X_PROXY_CONTEXT_PATH: HeaderName = HeaderName::from_static("x-proxycontextpath");
/// WSGI-style prefix (werkzeug `ProxyFix`).
pub const X_FORWARDED_PREFIX: HeaderName = HeaderName::from_static("x-forwarded-prefix");

/// Percent-encode a decoded path remainder.
pub fn encode_path(rest: &str) -> String {
    utf8_percent_encode(rest, PATH_ENCODE_SET).to_string()
}

/// Build `http://localhost/<encoded-path>[?<query>]`.
pub fn client_uri(rest: &str, query: Option<&str>) -> String {
    let mut uri = format!("http://localhost/{}", encode_path(rest));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        uri.push('?');
        uri.push_str(query);
    }
    uri
}

/// A request ready to be sent to a backend socket.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Always `http://localhost/...`; only path and query reach the backend.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub target: ProxyTarget,
}

impl OutboundRequest {
    /// Translate an inbound request addressed at `target`.
    ///
    /// `rest` is the already-decoded remainder after `/higlass/<id>/`.
    pub fn build(
        parts: &request::Parts,
        rest: &str,
        body: Bytes,
        target: ProxyTarget,
        base_url: &str,
    ) -> Self {
        let uri = client_uri(rest, parts.uri.query());

        let mut headers = parts.headers.clone();
        let context_path = mount_path(base_url, &target.id);
        match HeaderValue::from_str(&context_path) {
            Ok(value) => {
                headers.insert(X_FORWARDED_CONTEXT, value.clone());
                headers.insert(X_PROXY_CONTEXT_PATH, value.clone());
                headers.insert(X_FORWARDED_PREFIX, value);
            }
            Err(_) => {
                tracing::warn!(
                    context_path = %context_path,
                    "Context path is not a valid header value, context headers omitted"
                );
            }
        }

        tracing::debug!(
            target_id = %target.id,
            uri = %uri,
            "Built backend request"
        );

        Self {
            method: parts.method.clone(),
            uri,
            headers,
            body: if body.is_empty() { None } else { Some(body) },
            target,
        }
    }
}
