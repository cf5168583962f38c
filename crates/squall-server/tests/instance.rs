//! Black-box tests against a live listener
//!
//! Each test binds an ephemeral port and speaks raw HTTP/1.1 over TCP,
//! checking status and body exactly as a client would see them.

use squall_core::{Server, ServerConfig};
use squall_server::build_app;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WELCOME: &str = "Welcome to my web server!";
const GOODBYE: &str = "Good Bye my web server!!!";

/// Start an instance on an ephemeral port, return its local port
fn start(message: &'static str) -> u16 {
    let app = build_app(message).expect("app assembly");
    let server = Server::bind(&ServerConfig::new(0), app).expect("bind ephemeral port");
    let port = server.local_addr().port();
    tokio::spawn(server.serve());
    port
}

/// Send one raw HTTP/1.1 request, return (status, body)
async fn send(port: u16, raw: &str) -> (u16, String) {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(raw.as_bytes()).await.expect("write request");

    // Connection: close in every request, so the server ends the stream
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read response");
    let response = String::from_utf8(response).expect("utf-8 response");

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

fn get_root() -> String {
    "GET / HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n".to_string()
}

fn request_with_body(method: &str, path: &str, content_type: &str, body: &str) -> String {
    format!(
        "{method} {path} HTTP/1.1\r\nhost: localhost\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn get_root_returns_exact_message() {
    let port = start(WELCOME);
    let (status, body) = send(port, &get_root()).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}

#[tokio::test]
async fn goodbye_instance_returns_its_own_message() {
    let port = start(GOODBYE);
    let (status, body) = send(port, &get_root()).await;
    assert_eq!(status, 200);
    assert_eq!(body, GOODBYE);
}

#[tokio::test]
async fn query_string_and_headers_do_not_change_response() {
    let port = start(WELCOME);
    let raw = "GET /?name=squall&x=1 HTTP/1.1\r\nhost: localhost\r\nx-custom: anything\r\nconnection: close\r\n\r\n";
    let (status, body) = send(port, raw).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}

#[tokio::test]
async fn non_get_methods_are_not_found() {
    let port = start(WELCOME);
    for method in ["POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
        let raw = format!("{method} / HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        let (status, _) = send(port, &raw).await;
        assert_eq!(status, 404, "{method} / should be 404");
    }
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let port = start(WELCOME);
    let raw = "GET /missing HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n";
    let (status, _) = send(port, raw).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn malformed_json_body_is_rejected_then_server_keeps_serving() {
    let port = start(WELCOME);

    let raw = request_with_body("POST", "/", "application/json", "{not json");
    let (status, _) = send(port, &raw).await;
    assert_eq!(status, 400);

    // Middleware runs before routing, so unmatched paths get the 400 too
    let raw = request_with_body("POST", "/missing", "application/json", "{not json");
    let (status, _) = send(port, &raw).await;
    assert_eq!(status, 400);

    // The failure is per-request; the listener is still up
    let (status, body) = send(port, &get_root()).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}

#[tokio::test]
async fn valid_json_body_on_get_is_parsed_and_ignored() {
    let port = start(WELCOME);
    let raw = request_with_body("GET", "/", "application/json", r#"{"name":"squall"}"#);
    let (status, body) = send(port, &raw).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}

#[tokio::test]
async fn non_json_body_passes_through() {
    let port = start(WELCOME);
    let raw = request_with_body("GET", "/", "text/plain", "{not json");
    let (status, body) = send(port, &raw).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}

#[tokio::test]
async fn second_bind_on_same_port_fails() {
    let port = start(WELCOME);

    let app = build_app(GOODBYE).expect("app assembly");
    let second = Server::bind(&ServerConfig::new(port), app);
    assert!(second.is_err(), "second bind on port {port} should fail");

    // The first instance is unaffected
    let (status, body) = send(port, &get_root()).await;
    assert_eq!(status, 200);
    assert_eq!(body, WELCOME);
}
