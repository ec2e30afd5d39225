//! WebSocket transport for the mask channel.
//!
//! Text frames map to [`Inbound::Text`], binary frames to
//! [`Inbound::Binary`]. Ping/pong are answered by tungstenite and never
//! reach the pull loop, so they neither consume nor grant credit.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::channel::link::{Inbound, MaskConnector, MaskLink, PULL_TOKEN};
use crate::error::MaskError;

/// Default bound on a single connect + handshake attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ── WsConnector ──────────────────────────────────────────────────

/// Opens WebSocket links to a fixed `ws://` URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl MaskConnector for WsConnector {
    type Link = WsLink;

    async fn connect(&self) -> Result<WsLink, MaskError> {
        let (stream, response) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| MaskError::Timeout(self.connect_timeout))??;

        if let MaybeTlsStream::Plain(tcp) = stream.get_ref() {
            tcp.set_nodelay(true)?;
        }
        debug!(url = %self.url, status = %response.status(), "websocket handshake complete");
        Ok(WsLink { stream })
    }
}

// ── WsLink ───────────────────────────────────────────────────────

/// One live WebSocket connection.
pub struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl MaskLink for WsLink {
    async fn send_pull(&mut self) -> Result<(), MaskError> {
        self.stream.send(Message::text(PULL_TOKEN)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Inbound, MaskError> {
        loop {
            match self.stream.next().await {
                None => return Ok(Inbound::Closed),
                Some(Ok(Message::Text(text))) => return Ok(Inbound::Text(text)),
                Some(Ok(Message::Binary(data))) => return Ok(Inbound::Binary(Bytes::from(data))),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed mask channel");
                    return Ok(Inbound::Closed);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "websocket close failed");
        }
    }
}
