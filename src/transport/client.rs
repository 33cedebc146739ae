use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::transport::frame::{Frame, OpCode, peek_payload_len};
use crate::transport::handshake::{ClientHandshake, find_head_end};
use crate::transport::state::LinkState;

/// Close code sent when the harness hangs up normally.
pub const NORMAL_CLOSURE: u16 = 1000;

fn random_mask_seed() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::getrandom(&mut buf).is_ok() {
        u32::from_le_bytes(buf)
    } else {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u32)
            .unwrap_or(0x1234_5678)
    }
}

/// Client WebSocket carrying SockJS text frames.
///
/// Masks everything it sends, answers pings, and reassembles fragmented
/// messages. Binary messages are dropped since SockJS never sends them.
pub struct WsClient<T> {
    io: T,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
    config: TransportConfig,
    state: LinkState,
    mask_counter: u32,
    fragments: Option<(OpCode, Vec<u8>)>,
}

impl WsClient<TcpStream> {
    /// Open a TCP connection to `url` and perform the upgrade.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidUrl` for anything but a `ws://` URL with a host
    /// - `Error::Io` if the TCP connect fails
    /// - `Error::InvalidHandshake` if the server rejects the upgrade
    pub async fn connect(url: &url::Url, config: &TransportConfig) -> Result<Self> {
        if url.scheme() != "ws" {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme {}: {url}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("no host in {url}")))?;
        let port = url.port_or_known_default().unwrap_or(80);

        debug!(%url, "connecting");
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream, url, config.clone()).await
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> WsClient<T> {
    /// Run the opening handshake over an already connected stream.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandshake` if the response is malformed,
    /// too large, or carries the wrong accept key.
    pub async fn handshake(mut io: T, url: &url::Url, config: TransportConfig) -> Result<Self> {
        let request = ClientHandshake::for_url(url)?;
        let mut buf = Vec::new();
        request.write(&mut buf);
        io.write_all(&buf).await?;
        io.flush().await?;

        let mut read_buf = BytesMut::with_capacity(config.read_buffer_size);
        let head_end = loop {
            if let Some(end) = find_head_end(&read_buf) {
                break end;
            }
            if read_buf.len() > config.max_handshake_size {
                return Err(Error::InvalidHandshake(format!(
                    "response exceeds {} bytes",
                    config.max_handshake_size
                )));
            }
            if io.read_buf(&mut read_buf).await? == 0 {
                return Err(Error::InvalidHandshake(
                    "connection closed during handshake".into(),
                ));
            }
        };

        request.verify(&read_buf[..head_end])?;
        read_buf.advance(head_end);

        let mut client = Self::from_upgraded(io, config);
        client.read_buf = read_buf;
        debug!("upgrade complete");
        Ok(client)
    }

    /// Wrap a stream whose upgrade already happened.
    #[must_use]
    pub fn from_upgraded(io: T, config: TransportConfig) -> Self {
        Self {
            io,
            read_buf: BytesMut::with_capacity(config.read_buffer_size),
            write_buf: Vec::new(),
            config,
            state: LinkState::Open,
            mask_counter: random_mask_seed(),
            fragments: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.io
    }

    fn generate_mask(&mut self) -> [u8; 4] {
        self.mask_counter = self.mask_counter.wrapping_add(0x9E37_79B9);
        let a = self.mask_counter;
        let b = a.wrapping_mul(0x85EB_CA6B);
        let c = b ^ (b >> 13);
        let d = c.wrapping_mul(0xC2B2_AE35);
        d.to_le_bytes()
    }

    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mask = self.generate_mask();
        self.write_buf.clear();
        self.write_buf.reserve(frame.wire_size(true));
        frame.write_to(&mut self.write_buf, Some(mask));
        self.io.write_all(&self.write_buf).await?;
        self.io.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(len) = peek_payload_len(&self.read_buf) {
                self.config.check_frame_size(len)?;
            }
            match Frame::parse(&self.read_buf) {
                Ok((frame, consumed)) => {
                    self.read_buf.advance(consumed);
                    return Ok(Some(frame));
                }
                Err(Error::IncompleteFrame { .. }) => {}
                Err(e) => return Err(e),
            }

            self.read_buf.reserve(self.config.read_buffer_size);
            if self.io.read_buf(&mut self.read_buf).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Send one text message.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionClosed` once the link is no longer open.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        if !self.state.can_send() {
            return Err(Error::ConnectionClosed(None));
        }
        trace!(len = text.len(), "ws send");
        self.write_frame(&Frame::text(text)).await
    }

    /// Start the closing handshake.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures while writing the close frame.
    pub async fn close(&mut self, code: u16) -> Result<()> {
        if self.state != LinkState::Open {
            return Ok(());
        }
        self.state = LinkState::Closing;
        self.write_frame(&Frame::close(Some(code), "")).await
    }

    /// Receive the next text message.
    ///
    /// Returns `Ok(None)` once the link is closed, either by a close frame
    /// or by the peer dropping the connection.
    ///
    /// # Errors
    ///
    /// Protocol violations, oversized frames or messages, invalid UTF-8
    /// and I/O failures.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            if !self.state.can_receive() {
                return Ok(None);
            }

            let Some(frame) = self.read_frame().await? else {
                debug!(state = %self.state, "peer hung up");
                self.state = LinkState::Closed;
                return Ok(None);
            };

            match frame.opcode {
                OpCode::Ping => {
                    if self.state == LinkState::Open {
                        self.write_frame(&Frame::pong(frame.into_payload())).await?;
                    }
                }
                OpCode::Pong => {}
                OpCode::Close => {
                    let code = frame.close_code();
                    debug!(code = ?code, "close frame");
                    if self.state == LinkState::Open {
                        let reply = Frame::close(code, "");
                        self.state = LinkState::Closed;
                        self.write_frame(&reply).await?;
                    }
                    self.state = LinkState::Closed;
                    return Ok(None);
                }
                OpCode::Text | OpCode::Binary => {
                    if self.fragments.is_some() {
                        return Err(Error::ProtocolViolation(
                            "new data frame while a fragmented message is open".into(),
                        ));
                    }
                    if frame.fin {
                        if let Some(text) = self.finish(frame.opcode, frame.into_payload())? {
                            return Ok(Some(text));
                        }
                    } else {
                        let opcode = frame.opcode;
                        self.config.check_message_size(frame.payload().len())?;
                        self.fragments = Some((opcode, frame.into_payload()));
                    }
                }
                OpCode::Continuation => {
                    let Some((opcode, mut data)) = self.fragments.take() else {
                        return Err(Error::ProtocolViolation(
                            "continuation without a started message".into(),
                        ));
                    };
                    self.config
                        .check_message_size(data.len() + frame.payload().len())?;
                    data.extend_from_slice(frame.payload());
                    if frame.fin {
                        if let Some(text) = self.finish(opcode, data)? {
                            return Ok(Some(text));
                        }
                    } else {
                        self.fragments = Some((opcode, data));
                    }
                }
            }
        }
    }

    fn finish(&self, opcode: OpCode, data: Vec<u8>) -> Result<Option<String>> {
        self.config.check_message_size(data.len())?;
        match opcode {
            OpCode::Text => String::from_utf8(data)
                .map(Some)
                .map_err(|_| Error::InvalidUtf8),
            _ => {
                debug!(len = data.len(), "dropping binary message");
                Ok(None)
            }
        }
    }
}
