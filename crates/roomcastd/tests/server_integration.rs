//! Integration tests for the HTTP server.
//!
//! These tests run a real `HubServer` on a loopback port and speak raw
//! HTTP/1.1 to it: SSE subscriptions, publishing, parameter validation
//! and graceful shutdown.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::net::SocketAddr;
use std::time::Duration;

use roomcast_core::RoomId;
use roomcastd::{Hub, HubConfig, HubServer};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for any single read
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum time for a dropped connection to be detached
const DETACH_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum time for the server to stop after cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Test Helpers
// ============================================================================

/// Test server context that manages server lifecycle.
struct TestServer {
    addr: SocketAddr,
    hub: Hub,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Spawns a server on an ephemeral loopback port.
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let cancel_token = CancellationToken::new();
        let config = HubConfig {
            bind_address: addr.to_string(),
            ..HubConfig::default()
        };
        let server = HubServer::new(config, cancel_token.clone());
        let hub = server.hub().clone();

        let task = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        TestServer {
            addr,
            hub,
            cancel_token,
            task,
        }
    }

    /// Opens an SSE subscription and consumes the response head.
    async fn subscribe(&self, room_id: &str, client_id: &str) -> Subscriber {
        let stream = TcpStream::connect(self.addr).await.expect("connect");
        let mut sub = Subscriber {
            reader: BufReader::new(stream),
            status: 0,
            headers: Vec::new(),
        };

        let request = format!(
            "GET /?room_id={room_id}&client_id={client_id} HTTP/1.1\r\n\
             Host: localhost\r\n\
             Accept: text/event-stream\r\n\r\n"
        );
        sub.reader
            .get_mut()
            .write_all(request.as_bytes())
            .await
            .expect("write request");

        sub.read_head().await;
        sub
    }

    /// Publishes via a urlencoded POST body.
    async fn publish(&self, room_id: &str, client_id: &str, message: &str) -> (u16, String) {
        let body = format!("room_id={room_id}&client_id={client_id}&message={message}");
        self.request("POST", "/send", Some(&body)).await
    }

    /// Sends one request with `Connection: close` and returns status and body.
    async fn request(&self, method: &str, path: &str, form_body: Option<&str>) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).await.expect("connect");

        let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        match form_body {
            Some(body) => {
                request.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
                request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
            }
            None => request.push_str("Content-Length: 0\r\n\r\n"),
        }
        stream.write_all(request.as_bytes()).await.expect("write");

        let mut raw = Vec::new();
        timeout(READ_TIMEOUT, stream.read_to_end(&mut raw))
            .await
            .expect("response timeout")
            .expect("read response");
        let raw = String::from_utf8_lossy(&raw).to_string();

        let status = parse_status(&raw);
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        (status, body)
    }

    /// Number of clients currently registered in `room_id`.
    async fn client_count(&self, room_id: &str) -> usize {
        let room = self
            .hub
            .registry()
            .resolve(&RoomId::parse(room_id).unwrap())
            .await;
        room.stats().await.unwrap().clients
    }

    /// Cancels the server and waits for it to stop.
    async fn shutdown(self) {
        self.cancel_token.cancel();
        timeout(SHUTDOWN_TIMEOUT, self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
    }
}

/// Raw SSE reader over one TCP connection.
struct Subscriber {
    reader: BufReader<TcpStream>,
    status: u16,
    headers: Vec<(String, String)>,
}

impl Subscriber {
    async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = timeout(READ_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("read timeout")
            .expect("read line");
        if n == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn read_head(&mut self) {
        let status_line = self.read_line().await.expect("status line");
        self.status = parse_status(&status_line);

        while let Some(line) = self.read_line().await {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                self.headers
                    .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the next SSE `data:` payload, skipping framing and comments.
    async fn next_data(&mut self) -> Option<String> {
        while let Some(line) = self.read_line().await {
            if let Some(data) = line.strip_prefix("data: ") {
                return Some(data.to_string());
            }
        }
        None
    }
}

fn parse_status(raw: &str) -> u16 {
    raw.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

// ============================================================================
// Streaming Tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_receives_welcome_and_headers() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;

    assert_eq!(bob.status, 200);
    assert_eq!(bob.header("content-type"), Some("text/event-stream"));
    assert_eq!(bob.header("cache-control"), Some("no-cache"));
    assert_eq!(
        bob.next_data().await.as_deref(),
        Some("Welcome to the chat room alpha!")
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_publish_is_delivered_decrypted() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;
    bob.next_data().await.expect("welcome");

    let (status, _) = server.publish("alpha", "carol", "hi").await;
    assert_eq!(status, 200);

    assert_eq!(bob.next_data().await.as_deref(), Some("carol:hi"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_two_publishes_both_delivered() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;
    bob.next_data().await.expect("welcome");

    assert_eq!(server.publish("alpha", "carol", "one").await.0, 200);
    assert_eq!(server.publish("alpha", "carol", "two").await.0, 200);

    assert_eq!(bob.next_data().await.as_deref(), Some("carol:one"));
    assert_eq!(bob.next_data().await.as_deref(), Some("carol:two"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_publish_with_query_parameters() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;
    bob.next_data().await.expect("welcome");

    let (status, _) = server
        .request("POST", "/send?room_id=alpha&client_id=carol&message=hey", None)
        .await;
    assert_eq!(status, 200);

    assert_eq!(bob.next_data().await.as_deref(), Some("carol:hey"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_publish_to_empty_room_succeeds() {
    let server = TestServer::spawn().await;

    let (status, body) = server.publish("nobody", "carol", "hello").await;
    assert_eq!(status, 200);
    assert!(body.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_publish_after_subscriber_disconnects() {
    let server = TestServer::spawn().await;
    let mut ghost = server.subscribe("beta", "ghost").await;
    ghost.next_data().await.expect("welcome");
    assert_eq!(server.client_count("beta").await, 1);
    drop(ghost);

    // The server notices the closed socket once it writes to it; each
    // publish is such a write.
    let detached = timeout(DETACH_TIMEOUT, async {
        loop {
            let (status, _) = server.publish("beta", "carol", "anyone").await;
            assert_eq!(status, 200);
            if server.client_count("beta").await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(detached.is_ok(), "closed stream was never detached");

    let (status, _) = server.publish("beta", "carol", "after").await;
    assert_eq!(status, 200);
    assert_eq!(server.client_count("beta").await, 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_multiline_message_is_split_into_data_lines() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;
    bob.next_data().await.expect("welcome");

    // "line1\r\nline2" urlencoded
    let (status, _) = server.publish("alpha", "carol", "line1%0D%0Aline2").await;
    assert_eq!(status, 200);

    assert_eq!(bob.next_data().await.as_deref(), Some("carol:line1"));
    assert_eq!(bob.next_data().await.as_deref(), Some("line2"));

    server.shutdown().await;
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_requires_room_and_client() {
    let server = TestServer::spawn().await;

    let (status, body) = server.request("GET", "/?client_id=bob", None).await;
    assert_eq!(status, 400);
    assert!(body.contains("Room ID is required"));

    let (status, body) = server.request("GET", "/?room_id=alpha", None).await;
    assert_eq!(status, 400);
    assert!(body.contains("Client ID is required"));

    let (status, _) = server.request("GET", "/?room_id=&client_id=bob", None).await;
    assert_eq!(status, 400);

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_rejects_wrong_method() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .request("GET", "/send?room_id=alpha&message=hi", None)
        .await;
    assert_eq!(status, 405);
    assert!(body.contains("Method not allowed"));

    // Methods are case-sensitive
    let (status, _) = server
        .request("post", "/send", Some("room_id=alpha&message=hi"))
        .await;
    assert_eq!(status, 405);

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_requires_room_and_message() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .request("POST", "/send", Some("client_id=carol&message=hi"))
        .await;
    assert_eq!(status, 400);
    assert!(body.contains("Room ID is required"));

    let (status, body) = server
        .request("POST", "/send", Some("room_id=alpha&client_id=carol"))
        .await;
    assert_eq!(status, 400);
    assert!(body.contains("Message is required"));

    server.shutdown().await;
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let server = TestServer::spawn().await;
    let mut bob = server.subscribe("alpha", "bob").await;
    bob.next_data().await.expect("welcome");

    server.shutdown().await;

    // The stream terminates instead of hanging
    assert_eq!(bob.next_data().await, None);
}
