//! End-to-end test over a real TCP listener.

use std::time::Duration;

use higlass_proxy::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

mod common;

#[tokio::test]
async fn test_served_response_gets_fresh_framing() {
    let dir = common::sockets_dir();
    common::start_backend(dir.path(), "21", |_| {
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n7\r\n{\"a\":1}\r\n0\r\n\r\n"
            .to_string()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(common::config_for(dir.path()));
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/higlass/21/api/v1/tileset_info/?id=abc", addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["content-length"], "7");
    assert!(res.headers().get("transfer-encoding").is_none());
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "{\"a\":1}");

    drop(client);
    shutdown.trigger();
    let stopped = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(stopped, Ok(Ok(Ok(())))));
}

#[tokio::test]
async fn test_backend_reason_phrase_is_written() {
    let dir = common::sockets_dir();
    common::start_fixed_backend(
        dir.path(),
        "22",
        "HTTP/1.1 404 Tileset Missing\r\nContent-Type: text/plain\r\nContent-Length: 10\r\n\r\nno tileset",
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(common::config_for(dir.path()));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /higlass/22/api/v1/tileset_info/ HTTP/1.1\r\nHost: proxy\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("Proxy did not close the connection")
        .unwrap();
    let raw = String::from_utf8_lossy(&raw);

    assert!(raw.starts_with("HTTP/1.1 404 Tileset Missing\r\n"), "{}", raw);
    assert!(raw.ends_with("no tileset"), "{}", raw);

    shutdown.trigger();
}
