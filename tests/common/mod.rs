//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::{Method, Uri};
use sprig::lifecycle::Shutdown;
use sprig::observability::{LogRecord, RequestLogger};
use sprig::{Engine, HttpServer, Request, ServerConfig, ServerError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One captured log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub level: &'static str,
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub message: Option<String>,
}

/// Logger that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries at `level` whose message contains `needle`.
    pub fn matching(&self, level: &str, needle: &str) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .filter(|e| e.message.as_deref().is_some_and(|m| m.contains(needle)))
            .collect()
    }

    fn push(&self, level: &'static str, r: &LogRecord<'_>) {
        self.entries.lock().unwrap().push(Entry {
            level,
            method: r.method.to_string(),
            path: r.path.to_string(),
            status: r.status,
            message: r.message.map(str::to_string),
        });
    }
}

impl RequestLogger for RecordingLogger {
    fn debug(&self, r: &LogRecord<'_>) {
        self.push("debug", r);
    }

    fn info(&self, r: &LogRecord<'_>) {
        self.push("info", r);
    }

    fn error(&self, r: &LogRecord<'_>) {
        self.push("error", r);
    }
}

/// Engine wired to a fresh recording logger.
pub fn engine_with_logger() -> (Engine, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let mut engine = Engine::new();
    engine.set_logger(logger.clone());
    (engine, logger)
}

pub fn request(method: Method, path: &str) -> Request {
    Request::new(method, Uri::try_from(path).unwrap())
}

pub fn get(path: &str) -> Request {
    request(Method::GET, path)
}

/// Running server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start `engine` behind the HTTP binding on 127.0.0.1:0.
pub async fn start_server(engine: Engine, config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = engine.shutdown();
    let server = HttpServer::new(Arc::new(engine), config);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Client without connection pooling, so shutdown is not held up by
/// idle keep-alive connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
