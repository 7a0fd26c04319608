//! Loopback servers for async tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Route
// ============================================================================

/// A canned HTTP response served for one path.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn ok(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: 200,
            body: body.into(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Binds a listener on a random localhost port.
pub(crate) async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Returns the request path (without query) without consuming the request.
pub(crate) async fn peek_path(stream: &TcpStream) -> Option<String> {
    let mut buf = [0u8; 2048];
    loop {
        let n = stream.peek(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        let head = String::from_utf8_lossy(&buf[..n]);
        if let Some(line) = head.split("\r\n").next()
            && head.contains("\r\n")
        {
            let target = line.split_whitespace().nth(1)?;
            return Some(target.split('?').next().unwrap_or(target).to_string());
        }
        tokio::task::yield_now().await;
    }
}

/// Reads a request head and answers it from `routes` (404 otherwise).
pub(crate) async fn respond(mut stream: TcpStream, routes: &[Route]) {
    let path = peek_path(&stream).await.unwrap_or_default();

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => return,
        }
    }

    let (status, body) = routes
        .iter()
        .find(|route| route.path == path)
        .map_or((404, ""), |route| (route.status, route.body.as_str()));
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Serves `routes` until the test ends, returning the base URL.
pub(crate) async fn http_server(routes: Vec<Route>) -> String {
    let (listener, base) = bind().await;
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            tokio::spawn(async move { respond(stream, &routes).await });
        }
    });

    base
}
