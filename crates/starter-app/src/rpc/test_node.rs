//! Loopback JSON-RPC node for exercising `HttpRpcClient` over real HTTP.
//!
//! Answers `getBalance` from a script and counts how often it was asked.
//! Every other method gets a JSON-RPC "method not found" error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) struct TestNode {
    pub endpoint: String,
    balance_calls: Arc<AtomicUsize>,
    accept: JoinHandle<()>,
}

impl TestNode {
    /// The n-th `getBalance` gets `balances[n]`; the last entry repeats.
    pub async fn start(balances: Vec<u64>) -> Self {
        assert!(!balances.is_empty());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let balance_calls = Arc::new(AtomicUsize::new(0));
        let balances = Arc::new(balances);

        let counter = balance_calls.clone();
        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let balances = balances.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &balances, &counter).await;
                });
            }
        });

        Self {
            endpoint,
            balance_calls,
            accept,
        }
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

/// One keep-alive connection: answer requests until the client hangs up.
async fn serve(mut stream: TcpStream, balances: &[u64], counter: &AtomicUsize) -> std::io::Result<()> {
    let mut buf = Vec::new();
    while let Some(request) = read_request(&mut stream, &mut buf).await? {
        let body = answer(&request, balances, counter).to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
    }
    Ok(())
}

async fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> std::io::Result<Option<Value>> {
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let total = head_end + 4 + body_len;
            if buf.len() >= total {
                let request: Vec<u8> = buf.drain(..total).skip(head_end + 4).collect();
                return Ok(serde_json::from_slice(&request).ok());
            }
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn answer(request: &Value, balances: &[u64], counter: &AtomicUsize) -> Value {
    let id = request["id"].clone();
    match request["method"].as_str() {
        Some("getBalance") => {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let lamports = balances[n.min(balances.len() - 1)];
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "context": { "slot": n + 1 }, "value": lamports },
            })
        }
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "Method not found" },
        }),
    }
}
