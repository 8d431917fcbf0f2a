//! Shared utilities for integration testing: mock backends on Unix sockets.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use higlass_proxy::{HttpServer, ProxyConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// A request as the backend saw it on the wire.
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    /// `GET /path?q HTTP/1.1`
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// All values of a header, in wire order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .filter(|(n, _)| n.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }
}

/// Per-test sockets directory.
pub fn sockets_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Proxy configuration pointing at `sockets_dir`.
pub fn config_for(sockets_dir: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.proxy.sockets_dir = sockets_dir.to_path_buf();
    config
}

pub fn router(config: ProxyConfig) -> Router {
    HttpServer::new(config).router()
}

async fn read_request(stream: &mut UnixStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(n, _)| n.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Captured { head, body }
}

/// Start a programmable backend at `<dir>/<id>`.
///
/// `respond` gets each captured request and returns the raw HTTP response.
/// Captured requests are forwarded to the returned channel.
pub fn start_backend<F>(dir: &Path, id: &str, respond: F) -> mpsc::UnboundedReceiver<Captured>
where
    F: Fn(&Captured) -> String + Send + Sync + 'static,
{
    start_raw_backend(dir, id, move |captured| respond(captured).into_bytes())
}

/// Like [`start_backend`], for responses that are not valid UTF-8.
pub fn start_raw_backend<F>(dir: &Path, id: &str, respond: F) -> mpsc::UnboundedReceiver<Captured>
where
    F: Fn(&Captured) -> Vec<u8> + Send + Sync + 'static,
{
    let path: PathBuf = dir.join(id);
    let listener = UnixListener::bind(&path).unwrap();
    let respond = Arc::new(respond);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let captured = read_request(&mut socket).await;
                let response = respond(&captured);
                let _ = tx.send(captured);
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    rx
}

/// Start a backend that always answers with the same response.
pub fn start_fixed_backend(dir: &Path, id: &str, response: &'static str) -> mpsc::UnboundedReceiver<Captured> {
    start_backend(dir, id, move |_| response.to_string())
}

/// Start a backend that accepts and reads requests but never answers.
pub fn start_stalled_backend(dir: &Path, id: &str) {
    let listener = UnixListener::bind(dir.join(id)).unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });
}

/// Format a minimal HTTP/1.1 response with a correct Content-Length.
pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {}\r\n", status_line);
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    response
}

/// `{"a":1}` compressed with gzip (mtime 0).
pub const GZIPPED_JSON: [u8; 27] = [
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xff, 0xab, 0x56, 0x4a, 0x54, 0xb2,
    0x32, 0xac, 0x05, 0x00, 0xaf, 0xac, 0x1b, 0x56, 0x07, 0x00, 0x00, 0x00,
];

/// A 200 response carrying [`GZIPPED_JSON`] with `Content-Encoding: gzip`.
pub fn gzip_json_response() -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        GZIPPED_JSON.len()
    )
    .into_bytes();
    response.extend_from_slice(&GZIPPED_JSON);
    response
}
