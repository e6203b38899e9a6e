//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::mpsc;

use mcp_relay::config::RelayConfig;
use mcp_relay::{HttpServer, Shutdown};

/// Canned reply a mock upstream serves for every request.
#[derive(Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub extra_headers: Vec<(&'static str, String)>,
    pub body: String,
    /// Delay before answering, for timeout tests.
    pub delay: Duration,
}

impl MockReply {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            extra_headers: Vec::new(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    #[allow(dead_code)]
    pub fn sse(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            extra_headers: Vec::new(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Read one HTTP/1.1 request (head + content-length body) off the socket.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(head_end) = find_head_end(&buffer) {
            let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buffer.len() >= head_end + 4 + content_length {
                return String::from_utf8_lossy(&buffer[..head_end + 4 + content_length])
                    .to_string();
            }
        }
    }

    String::from_utf8_lossy(&buffer).to_string()
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Start a mock upstream serving a fixed reply. Returns the call counter and
/// a channel of captured raw requests.
pub async fn start_mock_upstream(
    addr: SocketAddr,
    reply: MockReply,
) -> (Arc<AtomicU32>, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind(addr).await.unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let (captured_tx, captured_rx) = mpsc::unbounded_channel();

    let counter = calls.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let reply = reply.clone();
                    let counter = counter.clone();
                    let captured_tx = captured_tx.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        let _ = captured_tx.send(request);

                        if !reply.delay.is_zero() {
                            tokio::time::sleep(reply.delay).await;
                        }

                        let mut response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status_text(reply.status),
                            reply.content_type,
                            reply.body.len(),
                        );
                        for (name, value) in &reply.extra_headers {
                            response.push_str(&format!("{name}: {value}\r\n"));
                        }
                        response.push_str("\r\n");
                        response.push_str(&reply.body);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (calls, captured_rx)
}

/// Start the relay on `proxy_addr`, forwarding to `upstream_url` by default.
/// Returns the shutdown handle keeping the server alive.
#[allow(dead_code)]
pub async fn start_relay(proxy_addr: SocketAddr, upstream_url: &str) -> Shutdown {
    let mut config = RelayConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.upstream.url = upstream_url.to_string();
    start_relay_with_config(proxy_addr, config).await
}

/// Start the relay with a fully caller-built config.
#[allow(dead_code)]
pub async fn start_relay_with_config(proxy_addr: SocketAddr, config: RelayConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let server_shutdown: broadcast::Receiver<()> = shutdown.subscribe();

    let server = HttpServer::new(config).expect("relay should start");
    let listener = TcpListener::bind(proxy_addr).await.unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

/// Non-pooled client so each test request opens a fresh connection.
#[allow(dead_code)]
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
