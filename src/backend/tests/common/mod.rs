#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
    sync::oneshot,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// A request as seen by the mock device: request line plus header lines
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub line: String,
    pub headers: Vec<String>,
}

impl SeenRequest {
    pub fn has_header(&self, name: &str, value: &str) -> bool {
        self.headers.iter().any(|header| {
            header
                .split_once(':')
                .is_some_and(|(n, v)| n.trim().eq_ignore_ascii_case(name) && v.trim() == value)
        })
    }
}

#[derive(Clone)]
pub struct Route {
    pub target: &'static str,
    pub status: u16,
    pub body: &'static str,
    /// Never answer, to provoke timeouts
    pub hang: bool,
}

impl Route {
    pub fn ok(target: &'static str, body: &'static str) -> Self {
        Self {
            target,
            status: 200,
            body,
            hang: false,
        }
    }
}

// Mock device REST service answering by request target
pub async fn start_mock_http_server(
    routes: Vec<Route>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    ready_tx: oneshot::Sender<SocketAddr>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;

    // Signal that the server is ready
    let _ = ready_tx.send(listener.local_addr()?);

    loop {
        let (mut stream, _) = listener.accept().await?;
        let routes = routes.clone();
        let seen = Arc::clone(&seen);

        tokio::spawn(async move {
            let mut reader = BufReader::new(&mut stream);
            let mut line = String::new();
            if reader.read_line(&mut line).await.is_err() {
                return;
            }
            let line = line.trim().to_string();

            // Read HTTP headers
            let mut headers = Vec::new();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).await.is_err() {
                    return;
                }
                if header.trim().is_empty() {
                    break;
                }
                headers.push(header.trim().to_string());
            }

            let target = line.split_whitespace().nth(1).unwrap_or_default().to_string();
            seen.lock().unwrap().push(SeenRequest { line, headers });

            let route = routes.into_iter().find(|route| route.target == target);
            let (status, body) = match &route {
                Some(route) if route.hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    return;
                }
                Some(route) => (route.status, route.body),
                None => (404, "not found"),
            };

            let http_response = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(http_response.as_bytes()).await;
        });
    }
}

pub async fn mock_http_server(routes: Vec<Route>) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (ready_tx, ready_rx) = oneshot::channel();
    let server_seen = Arc::clone(&seen);
    tokio::spawn(async move {
        let _ = start_mock_http_server(routes, server_seen, ready_tx).await;
    });

    (ready_rx.await.expect("server failed to start"), seen)
}

/// One exchange with the updater: wait for `expect` commands, then reply
pub struct Step {
    pub expect: usize,
    pub replies: Vec<String>,
}

pub fn step(expect: usize, replies: &[String]) -> Step {
    Step {
        expect,
        replies: replies.to_vec(),
    }
}

#[derive(Default)]
pub struct UpdaterLog {
    pub connections: usize,
    pub commands: Vec<String>,
}

// Mock updater socket. The first connection plays `script`, later ones are
// accepted and held open until the client leaves.
pub async fn start_mock_updater(
    script: Vec<Step>,
    log: Arc<Mutex<UpdaterLog>>,
    ready_tx: oneshot::Sender<SocketAddr>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let _ = ready_tx.send(listener.local_addr()?);
    let mut script = Some(script);

    loop {
        let (stream, _) = listener.accept().await?;
        let Ok(mut ws) = accept_async(stream).await else {
            continue;
        };
        log.lock().unwrap().connections += 1;
        let script = script.take().unwrap_or_default();
        let log = Arc::clone(&log);

        tokio::spawn(async move {
            for step in script {
                for _ in 0..step.expect {
                    match ws.next().await {
                        Some(Ok(Message::Text(text))) => log.lock().unwrap().commands.push(text),
                        _ => return,
                    }
                }
                for reply in step.replies {
                    if ws.send(Message::Text(reply)).await.is_err() {
                        return;
                    }
                }
            }

            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    log.lock().unwrap().commands.push(text);
                }
            }
        });
    }
}

pub async fn mock_updater(script: Vec<Step>) -> (SocketAddr, Arc<Mutex<UpdaterLog>>) {
    let log = Arc::new(Mutex::new(UpdaterLog::default()));
    let (ready_tx, ready_rx) = oneshot::channel();
    let server_log = Arc::clone(&log);
    tokio::spawn(async move {
        let _ = start_mock_updater(script, server_log, ready_tx).await;
    });

    (ready_rx.await.expect("updater failed to start"), log)
}

pub fn progress(kind: &str, status: &str, percent: u32) -> String {
    format!(
        r#"{{"type":"{kind}","payload":{{"status":"{status}","percent":{percent},"message":"{kind} {percent}"}}}}"#
    )
}

pub fn state(clients: u32, busy: bool) -> String {
    format!(r#"{{"type":"STATE","payload":{{"clients":{clients},"busy":{busy},"status":"STATUS"}}}}"#)
}

pub fn size(download_size: u64, required_space: u64) -> String {
    format!(
        r#"{{"type":"SIZE","payload":{{"size":{{"downloadSize":{download_size},"requiredSpace":{required_space}}},"status":"STATUS"}}}}"#
    )
}
