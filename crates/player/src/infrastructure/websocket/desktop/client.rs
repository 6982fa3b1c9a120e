//! Desktop WebSocket transport using tokio-tungstenite

use async_trait::async_trait;
use futures_util::stream::{SplitStream, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::infrastructure::websocket::{Link, Transport, TransportError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens real WebSocket links to the game server.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Transport for WebSocketTransport {
    type Link = WebSocketLink;

    async fn open(&mut self, url: &str) -> Result<Self::Link, TransportError> {
        let (socket, _response) = connect_async(url).await.map_err(|e| TransportError::Open {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!("Connected to game server at {}", url);

        let (mut write, read) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        // Outbound frames are written by a dedicated task so `send_text`
        // never waits on the socket.
        let writer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = write.send(message).await {
                    tracing::warn!("Failed to write WebSocket frame: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        Ok(WebSocketLink {
            tx,
            read,
            writer,
            closing: false,
        })
    }
}

pub struct WebSocketLink {
    tx: mpsc::UnboundedSender<Message>,
    read: SplitStream<Socket>,
    writer: JoinHandle<()>,
    closing: bool,
}

#[async_trait(?Send)]
impl Link for WebSocketLink {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closing {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(Message::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Server closed connection");
                    return None;
                }
                // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                Ok(_) => continue,
                Err(e) => return Some(Err(TransportError::Socket(e.to_string()))),
            }
        }
    }

    fn close(&mut self) {
        if !self.closing {
            self.closing = true;
            let _ = self.tx.send(Message::Close(None));
        }
    }
}

impl Drop for WebSocketLink {
    fn drop(&mut self) {
        if !self.closing {
            self.writer.abort();
        }
    }
}
