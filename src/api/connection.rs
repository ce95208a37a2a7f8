// A single WebSocket connection to the Gremlin endpoint. One request runs at
// a time on a connection; the pool hands connections out exclusively.

use std::sync::Once;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use uuid::Uuid;

use super::protocol::{RequestMessage, ResponseCollector, ResponseMessage, Step};
use super::{Credentials, ResultSet};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static CRYPTO_PROVIDER: Once = Once::new();

/// rustls needs a process-wide crypto provider before the first TLS handshake.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Err only means another provider was installed first.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub struct Connection {
    ws: WsStream,
    last_used: Instant,
    broken: bool,
}

impl Connection {
    pub async fn open(endpoint: &str) -> Result<Self> {
        if endpoint.starts_with("wss://") {
            install_crypto_provider();
        }
        let (ws, _response) = connect_async(endpoint)
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect error: {}", e)))?;
        info!(%endpoint, "Opened Gremlin connection");
        Ok(Connection {
            ws,
            last_used: Instant::now(),
            broken: false,
        })
    }

    /// Whether the connection sat idle longer than `keep_alive`.
    pub fn is_stale(&self, keep_alive: Duration) -> bool {
        self.last_used.elapsed() > keep_alive
    }

    /// Set once a transport failure leaves the socket in an unknown state.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Send a ping and wait up to `timeout` for the matching pong.
    pub async fn ping(&mut self, timeout: Duration) -> Result<()> {
        let outcome = self.exchange_ping(timeout).await;
        match &outcome {
            Ok(()) => self.last_used = Instant::now(),
            Err(_) => self.broken = true,
        }
        outcome
    }

    /// Submit one query and collect every frame that answers it.
    ///
    /// A service error leaves the connection usable; any other failure marks
    /// it broken so the pool drops it.
    pub async fn request(&mut self, query: &str, credentials: &Credentials) -> Result<ResultSet> {
        let outcome = self.exchange(query, credentials).await;
        match &outcome {
            Ok(_) | Err(Error::Service { .. }) => self.last_used = Instant::now(),
            Err(_) => self.broken = true,
        }
        outcome
    }

    /// Send a close frame. The connection is unusable afterwards.
    pub async fn shutdown(&mut self) {
        self.broken = true;
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "Error while closing connection");
        }
    }

    async fn exchange_ping(&mut self, timeout: Duration) -> Result<()> {
        self.ws
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| Error::connection(format!("Ping failed: {}", e)))?;

        let pong = async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Pong(_))) => return Ok(()),
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(Error::connection("Connection closed by server"))
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(Error::connection(format!("Receive error: {}", e))),
                }
            }
        };
        tokio::time::timeout(timeout, pong)
            .await
            .map_err(|_| Error::connection("Timed out waiting for pong"))?
    }

    async fn exchange(&mut self, query: &str, credentials: &Credentials) -> Result<ResultSet> {
        let request_id = Uuid::new_v4().to_string();
        debug!(%request_id, %query, "Sending eval request");
        self.send(&RequestMessage::eval(&request_id, query)).await?;

        let mut collector = ResponseCollector::new();
        loop {
            let response = self.receive().await?;
            if let Some(id) = response.request_id.as_deref() {
                if id != request_id {
                    debug!(%id, "Skipping frame for another request");
                    continue;
                }
            }

            match collector.push(response)? {
                Step::Continue => {}
                Step::Authenticate => {
                    debug!(%request_id, "Answering authentication challenge");
                    let auth = RequestMessage::authentication(
                        &request_id,
                        &credentials.username,
                        &credentials.password,
                    );
                    self.send(&auth).await?;
                }
                Step::Done(result) => return Ok(result),
            }
        }
    }

    async fn send(&mut self, message: &RequestMessage) -> Result<()> {
        let frame = message.encode()?;
        self.ws
            .send(Message::Binary(frame))
            .await
            .map_err(|e| Error::connection(format!("Send error: {}", e)))
    }

    async fn receive(&mut self) -> Result<ResponseMessage> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return ResponseMessage::decode(text.as_bytes()),
                Some(Ok(Message::Binary(bytes))) => return ResponseMessage::decode(&bytes),
                Some(Ok(Message::Close(_))) | None => {
                    return Err(Error::connection("Connection closed by server"))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(Error::connection(format!("Receive error: {}", e))),
            }
        }
    }
}
