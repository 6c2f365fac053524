//! Shared utilities for integration testing: a mock ledger node.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tangle_bridge::config::LedgerConfig;

/// One command received by the mock node.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedCommand {
    pub body: Value,
    pub api_version: Option<String>,
}

impl ReceivedCommand {
    pub fn name(&self) -> &str {
        self.body["command"].as_str().unwrap_or("")
    }
}

/// Handle to a running mock node.
#[derive(Clone)]
pub struct MockNode {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<ReceivedCommand>>>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn commands(&self) -> Vec<ReceivedCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands().iter().map(|c| c.name().to_string()).collect()
    }

    pub fn find(&self, name: &str) -> Option<ReceivedCommand> {
        self.commands().into_iter().find(|c| c.name() == name)
    }

    /// Ledger settings pointing at this node.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            host: "http://127.0.0.1".to_string(),
            port: self.addr.port(),
            request_timeout_secs: Some(5),
            ..LedgerConfig::default()
        }
    }
}

/// Start a programmable mock node. `respond` maps a request body to
/// a status code and JSON body.
pub async fn start_mock_node<F>(respond: F) -> MockNode
where
    F: Fn(&Value) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = commands.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let respond = respond.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(socket, respond.as_ref(), &recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockNode { addr, commands }
}

/// A node that answers every command the way a healthy node would, echoing
/// the submitted trytes back from `attachToTangle`.
#[allow(dead_code)]
pub async fn start_healthy_node() -> MockNode {
    start_mock_node(healthy_response).await
}

#[allow(dead_code)]
pub fn healthy_response(body: &Value) -> (u16, Value) {
    match body["command"].as_str() {
        Some("getNodeInfo") => (
            200,
            serde_json::json!({
                "appName": "IRI",
                "appVersion": "1.8.6",
                "latestMilestoneIndex": 1_050_000,
                "latestSolidSubtangleMilestoneIndex": 1_050_000,
            }),
        ),
        Some("getTransactionsToApprove") => (
            200,
            serde_json::json!({
                "trunkTransaction": "9".repeat(81),
                "branchTransaction": "9".repeat(81),
            }),
        ),
        Some("attachToTangle") => (200, serde_json::json!({ "trytes": body["trytes"].clone() })),
        Some("storeTransactions") | Some("broadcastTransactions") => (200, serde_json::json!({})),
        _ => (400, serde_json::json!({ "error": "Unknown command" })),
    }
}

/// Start a node that answers every request with the same raw HTTP response.
#[allow(dead_code)]
pub async fn start_raw_node(response: &'static str) -> MockNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(Some(_)) = read_request(&mut socket).await {
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });
        }
    });

    MockNode {
        addr,
        commands: Arc::new(Mutex::new(Vec::new())),
    }
}

/// Read one request: header block and a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<(String, Vec<u8>)>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length: usize = header_value(&head, "content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(Some((head, buf.split_off(header_end))))
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

async fn serve_one<F>(
    mut socket: TcpStream,
    respond: &F,
    recorded: &Mutex<Vec<ReceivedCommand>>,
) -> std::io::Result<()>
where
    F: Fn(&Value) -> (u16, Value),
{
    let Some((head, body)) = read_request(&mut socket).await? else {
        return Ok(());
    };

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    recorded.lock().unwrap().push(ReceivedCommand {
        body: body.clone(),
        api_version: header_value(&head, "x-iota-api-version"),
    });

    let (status, payload) = respond(&body);
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let payload = payload.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        payload.len(),
        payload
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}
