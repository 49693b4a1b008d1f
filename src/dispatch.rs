//! Message dispatch: one webhook call becomes one encrypted direct message
//!
//! Flow (every step is terminal on error, nothing is retried):
//! 1. decode the sender's nsec and derive its public key
//! 2. resolve the recipient identifier
//! 3. encrypt the content (NIP-04) and sign a kind 4 event with one `p` tag
//! 4. connect to the relay and publish
//!
//! Connection failures are returned to the caller. Publish failures after a
//! successful connect are only logged unless strict mode is on.

use crate::config::{Config, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PUBLISH_TIMEOUT};
use crate::identifier::RecipientResolver;
use crate::relay::{RelayConnection, RelayError};
use nostr::nips::nip04;
use nostr::nips::nip19::{FromBech32, Nip19};
use nostr::{Event, EventBuilder, Keys, Kind, PublicKey, Tag};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid sender key: {0}")]
    InvalidSenderKey(String),

    #[error("sender key is not a private key")]
    NotASecretKey,

    #[error("failed to parse pubkey from '{0}'")]
    UnresolvedRecipient(String),

    #[error("failed to encrypt message: {0}")]
    Encrypt(String),

    #[error("failed to sign event: {0}")]
    Sign(String),

    #[error(transparent)]
    Connect(RelayError),

    #[error(transparent)]
    Publish(RelayError),
}

/// What happened to an event once it reached the relay
#[derive(Debug)]
pub enum PublishOutcome {
    Accepted,
    /// Publish failed after the connection was up; logged, not surfaced
    Failed(RelayError),
}

/// Sends encrypted direct messages through a single relay
#[derive(Clone)]
pub struct Dispatcher {
    relay_url: String,
    sender_nsec: String,
    resolver: RecipientResolver,
    connect_timeout: Duration,
    publish_timeout: Duration,
    strict_publish: bool,
}

impl Dispatcher {
    pub fn new(relay_url: impl Into<String>, sender_nsec: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            sender_nsec: sender_nsec.into(),
            resolver: RecipientResolver::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            strict_publish: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.relay_url, &config.sender_nsec)
            .with_publish_timeout(config.publish_timeout)
            .with_strict_publish(config.strict_publish)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Report publish failures as errors instead of logging them
    pub fn with_strict_publish(mut self, strict: bool) -> Self {
        self.strict_publish = strict;
        self
    }

    /// Encrypt `content` for `recipient` and publish it to the relay
    pub async fn dispatch(&self, recipient: &str, content: &str) -> Result<PublishOutcome, DispatchError> {
        let keys = sender_keys(&self.sender_nsec)?;

        let recipient_pk = self
            .resolver
            .resolve(recipient)
            .await
            .ok_or_else(|| DispatchError::UnresolvedRecipient(recipient.to_string()))?;
        debug!("Resolved recipient {} to {}", recipient, recipient_pk.to_hex());

        let event = build_direct_message(&keys, &recipient_pk, content).await?;

        let mut relay = RelayConnection::connect(&self.relay_url, self.connect_timeout)
            .await
            .map_err(DispatchError::Connect)?;

        let result = relay.publish(&event, self.publish_timeout).await;
        relay.close().await;

        match result {
            Ok(()) => {
                info!("Published {} to {} via {}", event.id.to_hex(), recipient_pk.to_hex(), self.relay_url);
                Ok(PublishOutcome::Accepted)
            }
            Err(e) => {
                error!("{}", e);
                if self.strict_publish {
                    Err(DispatchError::Publish(e))
                } else {
                    Ok(PublishOutcome::Failed(e))
                }
            }
        }
    }
}

/// Decode a bech32 `nsec` into signing keys
pub fn sender_keys(nsec: &str) -> Result<Keys, DispatchError> {
    match Nip19::from_bech32(nsec.trim()) {
        Ok(Nip19::Secret(secret_key)) => Ok(Keys::new(secret_key)),
        Ok(_) => Err(DispatchError::NotASecretKey),
        Err(e) => Err(DispatchError::InvalidSenderKey(e.to_string())),
    }
}

/// Build a signed kind 4 event carrying `content` encrypted for `recipient`
pub async fn build_direct_message(
    keys: &Keys,
    recipient: &PublicKey,
    content: &str,
) -> Result<Event, DispatchError> {
    let ciphertext = nip04::encrypt(keys.secret_key(), recipient, content)
        .map_err(|e| DispatchError::Encrypt(e.to_string()))?;

    EventBuilder::new(Kind::EncryptedDirectMessage, ciphertext)
        .tag(Tag::public_key(*recipient))
        .sign(keys)
        .await
        .map_err(|e| DispatchError::Sign(e.to_string()))
}

/// Public keys named in `p` tags
pub fn recipient_tags(event: &Event) -> Vec<String> {
    event
        .tags
        .iter()
        .filter_map(|tag| {
            let v: Vec<String> = tag.clone().to_vec();
            if v.len() >= 2 && v[0] == "p" {
                Some(v[1].clone())
            } else {
                None
            }
        })
        .collect()
}
