//! Push connection seam and its WebSocket implementation.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::ConsoleError;

const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// An open push connection.
#[async_trait]
pub trait Socket: Send {
    /// Next text frame. `None` once the peer has closed the connection.
    async fn next_text(&mut self) -> Option<Result<String, ConsoleError>>;

    /// Close with a normal closure code.
    async fn close(&mut self);
}

/// Opens [`Socket`]s. Injected into the channel so tests can script it.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Socket>, ConsoleError>;
}

pub struct WebSocketConnector;

#[async_trait]
impl SocketConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Socket>, ConsoleError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| ConsoleError::Channel(format!("connect to {} failed: {}", url, e)))?;
        debug!(%url, status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WebSocket { stream }))
    }
}

struct WebSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Socket for WebSocket {
    async fn next_text(&mut self) -> Option<Result<String, ConsoleError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by server");
                    return None;
                }
                // ping/pong are answered by tungstenite; binary is not part of the protocol
                Ok(_) => continue,
                Err(e) => return Some(Err(ConsoleError::Channel(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "Console teardown".into(),
        };
        if let Err(e) = self.stream.close(Some(frame)).await {
            debug!(error = %e, "WebSocket close handshake failed");
        }
        // wait briefly for the server's close acknowledgement
        let drain = async { while let Some(Ok(_)) = self.stream.next().await {} };
        let _ = tokio::time::timeout(CLOSE_ACK_TIMEOUT, drain).await;
    }
}
