//! Scripted SockJS co-authoring peer.
//!
//! Accepts WebSocket upgrades on a random port, speaks just enough of the
//! co-authoring protocol to walk a client through license, auth, document
//! open and the edit loop, and records every request it receives.

use std::net::SocketAddr;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use docload::Error;
use docload::transport::{Frame, OpCode, compute_accept_key};

/// How the peer treats a fresh session.
#[derive(Debug, Clone)]
pub enum Script {
    /// License, auth as `user_id`, documentOpen pointing at `attachment`,
    /// then answer every save with `unSaveLock`.
    Cooperative {
        user_id: String,
        attachment: Option<String>,
    },
    /// Open the session, then drop it straight away.
    DropAfterOpen,
}

/// What one connection looked like from the server side.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// HTTP request target of the upgrade.
    pub path: String,
    /// Every application request received, decoded.
    pub requests: Vec<Value>,
    /// Whether the client completed the WebSocket close handshake.
    pub closed_cleanly: bool,
}

impl Transcript {
    pub fn request_types(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|r| r["type"].as_str())
            .collect()
    }
}

pub struct ScriptedPeer {
    addr: SocketAddr,
    transcripts: mpsc::UnboundedReceiver<Transcript>,
}

impl ScriptedPeer {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, transcripts) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                let script = script.clone();
                tokio::spawn(async move {
                    if let Ok(transcript) = serve(stream, script).await {
                        let _ = tx.send(transcript);
                    }
                });
            }
        });

        Self { addr, transcripts }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn next_transcript(&mut self) -> Transcript {
        self.transcripts.recv().await.unwrap()
    }
}

struct Conn {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl Conn {
    async fn send_text(&mut self, text: &str) -> Result<(), Error> {
        let mut out = Vec::new();
        Frame::text(text).write_to(&mut out, None);
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn send_messages(&mut self, messages: &[Value]) -> Result<(), Error> {
        let encoded: Vec<String> = messages.iter().map(Value::to_string).collect();
        let wire = format!("a{}", serde_json::to_string(&encoded)?);
        self.send_text(&wire).await
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        loop {
            match Frame::parse(&self.buf) {
                Ok((frame, used)) => {
                    self.buf.drain(..used);
                    return Ok(Some(frame));
                }
                Err(Error::IncompleteFrame { .. }) => {}
                Err(e) => return Err(e),
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

async fn upgrade(stream: &mut TcpStream) -> Result<String, Error> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed(None));
        }
        head.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&head).to_string();
    let path = text
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();
    let key = text
        .lines()
        .find_map(|l| l.strip_prefix("Sec-WebSocket-Key: "))
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        compute_accept_key(key)
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(path)
}

async fn serve(mut stream: TcpStream, script: Script) -> Result<Transcript, Error> {
    let path = upgrade(&mut stream).await?;
    let mut conn = Conn {
        stream,
        buf: Vec::new(),
    };
    let mut transcript = Transcript {
        path,
        requests: Vec::new(),
        closed_cleanly: false,
    };

    conn.send_text("o").await?;
    match &script {
        Script::Cooperative { .. } => {
            conn.send_messages(&[json!({"type": "license", "license": {"type": 3}})])
                .await?;
        }
        Script::DropAfterOpen => {
            conn.send_messages(&[json!({"type": "drop", "description": "gone"})])
                .await?;
        }
    }

    while let Some(frame) = conn.read_frame().await? {
        match frame.opcode {
            OpCode::Close => {
                let mut out = Vec::new();
                Frame::close(frame.close_code(), "").write_to(&mut out, None);
                conn.stream.write_all(&out).await?;
                transcript.closed_cleanly = true;
                break;
            }
            OpCode::Text => {
                let wire = String::from_utf8(frame.into_payload()).map_err(|_| Error::InvalidUtf8)?;
                let inner: String = serde_json::from_str(&wire)?;
                let request: Value = serde_json::from_str(&inner)?;
                respond(&mut conn, &script, &request).await?;
                transcript.requests.push(request);
            }
            _ => {}
        }
    }

    Ok(transcript)
}

async fn respond(conn: &mut Conn, script: &Script, request: &Value) -> Result<(), Error> {
    let Script::Cooperative {
        user_id,
        attachment,
    } = script
    else {
        return Ok(());
    };

    match request["type"].as_str() {
        Some("auth") => {
            let open = match attachment {
                Some(url) => json!({"type": "documentOpen", "data": {"data": {"Editor.bin": url}}}),
                None => json!({"type": "documentOpen", "data": {"status": "err"}}),
            };
            conn.send_messages(&[
                json!({"type": "auth", "participants": [{"id": user_id}]}),
                open,
            ])
            .await?;
            conn.send_text("h").await?;
            conn.send_messages(&[json!({"type": "message", "messages": []})])
                .await
        }
        Some("saveChanges") => {
            conn.send_messages(&[
                json!({"type": "cursor", "messages": []}),
                json!({"type": "unSaveLock"}),
            ])
            .await
        }
        Some("close") => conn.send_text(r#"c[3000,"Go away!"]"#).await,
        _ => Ok(()),
    }
}

/// Plain HTTP server that answers every GET with `body`.
pub async fn serve_file(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(body).await;
            });
        }
    });
    format!("http://{addr}/cache/files/Editor.bin")
}
