//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use wallet_shell::config::ShellConfig;
use wallet_shell::provider::InMemoryProvider;
use wallet_shell::storage::{KeyValueStore, MemoryStore};
use wallet_shell::{AppShell, Shutdown};

pub const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

pub fn alice() -> Address {
    "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
}

pub fn bob() -> Address {
    "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap()
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// In-memory wallet holding alice's account with 10 ETH on mainnet.
pub fn funded_provider() -> Arc<InMemoryProvider> {
    Arc::new(
        InMemoryProvider::new()
            .with_accounts(vec![alice()])
            .with_balance(alice(), ether(10))
            .with_chain_id("0x1"),
    )
}

/// Shell over `provider` with a fresh in-memory store.
pub fn shell_with(provider: Arc<InMemoryProvider>, store: Arc<dyn KeyValueStore>) -> Arc<AppShell> {
    AppShell::new(provider, store, &ShellConfig::default(), Shutdown::new())
}

pub fn shell(provider: Arc<InMemoryProvider>) -> Arc<AppShell> {
    shell_with(provider, Arc::new(MemoryStore::new()))
}

/// Poll `check` until it holds or `limit` elapses.
pub async fn eventually(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Answer for one JSON-RPC call: a result or an `(code, message)` error.
pub type RpcAnswer = Result<Value, (i64, String)>;

/// Start a JSON-RPC node on an ephemeral port. Returns its address and a
/// counter of requests served.
pub async fn start_rpc_node<F>(handler: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&str, &Value) -> RpcAnswer + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    let counter = served.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let _ = serve_one(socket, handler.as_ref(), &counter).await;
            });
        }
    });

    (addr, served)
}

async fn serve_one<F>(mut socket: TcpStream, handler: &F, served: &AtomicUsize) -> std::io::Result<()>
where
    F: Fn(&str, &Value) -> RpcAnswer,
{
    let body = read_request_body(&mut socket).await?;
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    served.fetch_add(1, Ordering::SeqCst);

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let response = match handler(method, &params) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err((code, message)) => {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
        }
    };
    let payload = response.to_string();
    let http = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        payload.len(),
        payload
    );
    socket.write_all(http.as_bytes()).await?;
    socket.shutdown().await
}

async fn read_request_body(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Vec::new());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf[header_end..].to_vec())
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
