//! Recipient identifier resolution
//!
//! Accepts the forms people paste into a webhook URL:
//! - hex public key
//! - `npub1...` / `nprofile1...` (NIP-19), optionally as a `nostr:` URI (NIP-21)
//! - `name@domain` or bare `domain` (NIP-05)

use crate::config::DEFAULT_NIP05_TIMEOUT;
use nostr::nips::nip19::{FromBech32, Nip19};
use nostr::PublicKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const NOSTR_URI_PREFIX: &str = "nostr:";

/// Resolves user-supplied identifiers to public keys
#[derive(Clone)]
pub struct RecipientResolver {
    http: reqwest::Client,
    nip05_timeout: Duration,
    /// Fixed origin for `nostr.json` lookups instead of `https://<domain>`
    nip05_base: Option<String>,
}

impl Default for RecipientResolver {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            nip05_timeout: DEFAULT_NIP05_TIMEOUT,
            nip05_base: None,
        }
    }
}

impl RecipientResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every NIP-05 lookup to `base` (e.g. `http://127.0.0.1:3000`)
    pub fn with_nip05_base(mut self, base: impl Into<String>) -> Self {
        self.nip05_base = Some(base.into());
        self
    }

    pub fn with_nip05_timeout(mut self, timeout: Duration) -> Self {
        self.nip05_timeout = timeout;
        self
    }

    /// Resolve an identifier. Returns `None` when nothing matches; NIP-05
    /// lookups are the only case that touches the network.
    pub async fn resolve(&self, input: &str) -> Option<PublicKey> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(pk) = parse_key(input) {
            return Some(pk);
        }

        let (name, domain) = parse_nip05(input)?;
        match self.lookup_nip05(&name, &domain).await {
            Ok(pk) => pk,
            Err(e) => {
                debug!("NIP-05 lookup for {}@{} failed: {}", name, domain, e);
                None
            }
        }
    }

    async fn lookup_nip05(&self, name: &str, domain: &str) -> Result<Option<PublicKey>, reqwest::Error> {
        let url = match &self.nip05_base {
            Some(base) => format!(
                "{}/.well-known/nostr.json?name={}",
                base.trim_end_matches('/'),
                name
            ),
            None => nip05_url(name, domain),
        };
        debug!("Resolving NIP-05 identifier via {}", url);

        let doc: Nip05Document = self
            .http
            .get(&url)
            .timeout(self.nip05_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(doc.public_key(name))
    }
}

/// Parse identifiers that carry the key directly (hex, npub, nprofile)
pub fn parse_key(input: &str) -> Option<PublicKey> {
    if input.len() == 64 {
        if let Ok(pk) = PublicKey::from_hex(input) {
            return Some(pk);
        }
    }

    let bech32 = input.strip_prefix(NOSTR_URI_PREFIX).unwrap_or(input);
    match Nip19::from_bech32(bech32) {
        Ok(Nip19::Pubkey(pk)) => Some(pk),
        Ok(Nip19::Profile(profile)) => Some(profile.public_key),
        Ok(_) => {
            debug!("Identifier is a NIP-19 entity but not a profile");
            None
        }
        Err(_) => None,
    }
}

/// Split a NIP-05 identifier into (name, domain). A bare domain means `_@domain`.
pub fn parse_nip05(input: &str) -> Option<(String, String)> {
    let (name, domain) = match input.split_once('@') {
        Some((name, domain)) => (name, domain),
        None => ("_", input),
    };

    if name.is_empty() || domain.is_empty() || !domain.contains('.') {
        return None;
    }
    let valid_domain = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':');
    let valid_name = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if !valid_domain || !valid_name {
        return None;
    }

    Some((name.to_lowercase(), domain.to_lowercase()))
}

pub fn nip05_url(name: &str, domain: &str) -> String {
    format!("https://{}/.well-known/nostr.json?name={}", domain, name)
}

/// `/.well-known/nostr.json` body
#[derive(Debug, Default, Deserialize)]
pub struct Nip05Document {
    #[serde(default)]
    pub names: HashMap<String, String>,
}

impl Nip05Document {
    pub fn public_key(&self, name: &str) -> Option<PublicKey> {
        let hex = self.names.get(name)?;
        PublicKey::from_hex(hex).ok()
    }
}
