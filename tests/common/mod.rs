#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use conduit::engine::Engine;
use conduit::engine::mock::{MockConnector, MockCounters};
use conduit::manager::EngineManager;
use conduit::registry::EngineRegistry;

/// A canned HTTP response.
#[derive(Clone)]
pub struct Reply {
    pub status: String,
    pub content_type: String,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK".to_string(),
            content_type: content_type.to_string(),
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            content_type: "text/plain".to_string(),
            body: b"server says no".to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Minimal HTTP/1.1 responder. Records every request body it sees and
/// answers each with the same [`Reply`].
pub struct Responder {
    pub port: u16,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Responder {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let reply = reply.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let _ = serve(stream, reply, seen).await;
                });
            }
        });

        Self { port, requests }
    }

    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_json(&self, index: usize) -> serde_json::Value {
        serde_json::from_slice(&self.requests()[index]).unwrap()
    }
}

async fn serve(
    mut stream: TcpStream,
    reply: Reply,
    seen: Arc<Mutex<Vec<Vec<u8>>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    seen.lock().unwrap().push(buf[header_end..].to_vec());

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&reply.body).await?;
    stream.shutdown().await
}

/// A port nothing is listening on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Builtins plus `mock`, whose instances share `counters`.
pub async fn registry_with(mock: MockConnector) -> Arc<EngineRegistry> {
    let registry = EngineRegistry::with_builtins().await;
    registry
        .register(
            "mock",
            Arc::new(move || -> Box<dyn Engine> { Box::new(mock.clone()) }),
        )
        .await;
    Arc::new(registry)
}

pub async fn manager_with(mock: MockConnector) -> Arc<EngineManager> {
    Arc::new(EngineManager::new(registry_with(mock).await))
}

pub fn counted_mock() -> (MockConnector, MockCounters) {
    let counters = MockCounters::default();
    (MockConnector::new(counters.clone()), counters)
}
