//! Unix domain socket dispatcher.
//!
//! # Responsibilities
//! - Connect to `<sockets_dir>/<id>` within the connect timeout
//! - Run one HTTP/1.1 exchange per connection, bounded by the request timeout
//! - Follow backend redirects against the same socket
//! - Decode compressed response bodies
//!
//! # Design Decisions
//! - The request line is sent in origin form; the URI host is never resolved
//! - A connection driver is aborted as soon as its exchange is dropped
//! - Non-2xx backend responses are successes at this layer

use std::path::Path;
use std::time::Duration;

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, Request, StatusCode, Uri};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::ext::ReasonPhrase;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tower::{service_fn, ServiceExt};
use tower_http::decompression::Decompression;
use url::Url;

use crate::config::ProxyConfig;
use crate::http::request::OutboundRequest;
use crate::net::error::TransportError;

/// Fixed per-request transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub connect_timeout: Duration,
    /// Bounds the whole exchange, redirects and body included.
    pub request_timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: u32,
}

impl DispatchOptions {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            connect_timeout: config.timeouts.connect(),
            request_timeout: config.timeouts.request(),
            follow_redirects: config.redirects.follow,
            max_redirects: config.redirects.max,
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

/// A complete backend response.
#[derive(Debug, Clone)]
pub struct InboundResponse {
    pub status: StatusCode,
    /// Present only when the backend sent a non-canonical reason phrase.
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Send `request` to its backend socket and wait for the full response.
pub async fn dispatch(
    request: OutboundRequest,
    options: &DispatchOptions,
) -> Result<InboundResponse, TransportError> {
    let socket = request.target.socket_path.clone();

    match tokio::time::timeout(options.request_timeout, exchange(request, options)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::RequestTimeout {
            socket,
            after: options.request_timeout,
        }),
    }
}

async fn exchange(
    request: OutboundRequest,
    options: &DispatchOptions,
) -> Result<InboundResponse, TransportError> {
    let OutboundRequest {
        mut method,
        uri: mut current,
        mut headers,
        mut body,
        target,
    } = request;

    if !headers.contains_key(header::HOST) {
        headers.insert(header::HOST, HeaderValue::from_static("localhost"));
    }

    let mut redirects = 0;
    loop {
        let uri: Uri = current.parse().map_err(|source| TransportError::InvalidUri {
            uri: current.clone(),
            source,
        })?;
        let origin = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let mut outbound = Request::builder()
            .method(method.clone())
            .uri(origin)
            .body(Full::new(body.clone().unwrap_or_default()))?;
        *outbound.headers_mut() = headers.clone();

        let response = round_trip(&target.socket_path, outbound, options.connect_timeout).await?;

        tracing::debug!(
            target_id = %target.id,
            uri = %current,
            status = %response.status,
            "Backend responded"
        );

        if !options.follow_redirects || !response.status.is_redirection() {
            return Ok(response);
        }
        let Some(location) = redirect_location(&response) else {
            return Ok(response);
        };

        redirects += 1;
        if redirects > options.max_redirects {
            return Err(TransportError::TooManyRedirects(options.max_redirects));
        }

        current = resolve_location(&current, location)?;
        if switches_to_get(response.status, &method) {
            method = Method::GET;
            body = None;
            headers.remove(header::CONTENT_LENGTH);
            headers.remove(header::CONTENT_TYPE);
            headers.remove(header::TRANSFER_ENCODING);
        }

        tracing::debug!(
            target_id = %target.id,
            location = %current,
            hop = redirects,
            "Following backend redirect"
        );
    }
}

/// Connect, perform one request on a fresh connection and collect the body.
async fn round_trip(
    socket: &Path,
    request: Request<Full<Bytes>>,
    connect_timeout: Duration,
) -> Result<InboundResponse, TransportError> {
    let stream = match tokio::time::timeout(connect_timeout, UnixStream::connect(socket)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            return Err(TransportError::Connect {
                socket: socket.to_path_buf(),
                source,
            })
        }
        Err(_) => {
            return Err(TransportError::ConnectTimeout {
                socket: socket.to_path_buf(),
                after: connect_timeout,
            })
        }
    };

    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    let _driver = ConnectionDriver(tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Backend connection closed with error");
        }
    }));

    sender.ready().await?;
    let client = Decompression::new(service_fn(move |req: Request<Full<Bytes>>| {
        sender.send_request(req)
    }));
    let response = client.oneshot(request).await?;

    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(TransportError::Body)?.to_bytes();

    Ok(InboundResponse {
        status: parts.status,
        reason: parts.extensions.get::<ReasonPhrase>().cloned(),
        headers: parts.headers,
        body,
    })
}

/// Aborts the spawned connection task when the exchange ends or is cancelled.
struct ConnectionDriver(JoinHandle<()>);

impl Drop for ConnectionDriver {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn redirect_location(response: &InboundResponse) -> Option<&str> {
    match response.status {
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => response
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        _ => None,
    }
}

fn resolve_location(current: &str, location: &str) -> Result<String, TransportError> {
    Url::parse(current)
        .and_then(|base| base.join(location))
        .map(String::from)
        .map_err(|_| TransportError::InvalidRedirect(location.to_string()))
}

/// 303 always becomes GET; 301/302 only rewrite POST.
fn switches_to_get(status: StatusCode, method: &Method) -> bool {
    match status {
        StatusCode::SEE_OTHER => method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => method == Method::POST,
        _ => false,
    }
}
