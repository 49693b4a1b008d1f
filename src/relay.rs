//! Outbound relay connection (NIP-01 publish)
//!
//! One connection per message: connect, send `["EVENT", <event>]`, wait for
//! the relay's `["OK", <id>, <accepted>, <message>]`, close.

use futures::{SinkExt, StreamExt};
use nostr::{ClientMessage, Event, EventId, JsonUtil, RelayMessage};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("{url}: failed to send event: {reason}")]
    Send { url: String, reason: String },

    #[error("{url}: event rejected: {message}")]
    Rejected { url: String, message: String },

    #[error("{url}: no acknowledgement within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("{url}: connection closed before acknowledgement")]
    Closed { url: String },
}

pub struct RelayConnection {
    url: String,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RelayConnection {
    /// Open a WebSocket to `url`, giving up after `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, RelayError> {
        debug!("Connecting to relay: {}", url);

        let connect_error = |reason: String| RelayError::Connect {
            url: url.to_string(),
            reason,
        };

        let (ws, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| connect_error(format!("timed out after {:?}", timeout)))?
            .map_err(|e| connect_error(e.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            ws,
        })
    }

    /// Send an event and wait for the relay to accept it
    pub async fn publish(&mut self, event: &Event, timeout: Duration) -> Result<(), RelayError> {
        let msg = ClientMessage::event(event.clone());
        self.ws
            .send(Message::Text(msg.as_json().into()))
            .await
            .map_err(|e| RelayError::Send {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        match tokio::time::timeout(timeout, self.wait_for_ok(&event.id)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout {
                url: self.url.clone(),
                timeout,
            }),
        }
    }

    async fn wait_for_ok(&mut self, event_id: &EventId) -> Result<(), RelayError> {
        while let Some(msg) = self.ws.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket error from {}: {}", self.url, e);
                    break;
                }
            };

            trace!("Received from {}: {}", self.url, text.as_str());

            let Ok(relay_msg) = RelayMessage::from_json(text.as_str()) else {
                continue;
            };

            if matches!(relay_msg, RelayMessage::Notice { .. }) {
                warn!("Notice from {}: {}", self.url, text.as_str());
                continue;
            }

            if let Some((accepted, message)) = acknowledgement(relay_msg, event_id) {
                return if accepted {
                    Ok(())
                } else {
                    Err(RelayError::Rejected {
                        url: self.url.clone(),
                        message,
                    })
                };
            }
        }

        Err(RelayError::Closed {
            url: self.url.clone(),
        })
    }

    pub async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!("Error closing connection to {}: {}", self.url, e);
        }
    }
}

/// `(accepted, message)` when `msg` is the relay's `OK` for `event_id`
pub fn acknowledgement(msg: RelayMessage, event_id: &EventId) -> Option<(bool, String)> {
    match msg {
        RelayMessage::Ok {
            event_id: id,
            status,
            message,
        } if id == *event_id => Some((status, message)),
        _ => None,
    }
}
