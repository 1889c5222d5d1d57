//! JSON Web Key Set (JWKS) module
//!
//! A key set document is fetched by a [`KeySetSource`], parsed and indexed by
//! `kid` into a [`KeySet`], and held by the [`KeySetCache`].

pub(crate) mod cache;
pub(crate) mod jwk;
pub(crate) mod source;

use crate::error::FetchError;
use crate::jwks::jwk::Jwk;
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE, MAX_KID_LENGTH};
use miniserde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Instant;

pub use cache::KeySetCache;
pub use source::{HttpKeySetSource, KeySetFuture, KeySetSource};

/// Raw key set document
#[derive(Debug, Clone, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Key set snapshot indexed by key ID
#[derive(Debug)]
pub struct KeySet {
    keys: HashMap<String, Arc<Jwk>>,
    fetched_at: Instant,
}

impl KeySet {
    /// Parse and index a key set document.
    ///
    /// Keys without a `kid` cannot be selected and are skipped. A `kid` that
    /// appears more than once is ambiguous and is dropped entirely, so tokens
    /// naming it resolve to no key at all.
    pub(crate) fn parse(body: &[u8]) -> Result<Self, FetchError> {
        if body.len() > MAX_JWKS_RESPONSE_SIZE {
            return Err(FetchError::ResponseTooLarge {
                size: body.len(),
                max: MAX_JWKS_RESPONSE_SIZE,
            });
        }

        let body = std::str::from_utf8(body)
            .map_err(|e| FetchError::InvalidDocument(format!("utf8 decode failed: {e}")))?;

        let set: JwkSet = miniserde::json::from_str(body)
            .map_err(|_| FetchError::InvalidDocument("expected {\"keys\": [...]}".into()))?;

        if set.keys.len() > MAX_JWK_SET_SIZE {
            return Err(FetchError::InvalidDocument(format!(
                "{} keys (maximum: {MAX_JWK_SET_SIZE})",
                set.keys.len()
            )));
        }

        Ok(Self::from_keys(set.keys))
    }

    pub(crate) fn from_keys(keys: Vec<Jwk>) -> Self {
        let mut index: HashMap<String, Arc<Jwk>> = HashMap::with_capacity(keys.len());
        let mut ambiguous = Vec::new();

        for jwk in keys {
            let Some(kid) = jwk.kid.clone() else {
                continue;
            };
            if kid.len() > MAX_KID_LENGTH {
                continue;
            }
            match index.entry(kid) {
                Entry::Occupied(entry) => ambiguous.push(entry.key().clone()),
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(jwk));
                }
            }
        }

        for kid in ambiguous {
            if index.remove(&kid).is_some() {
                tracing::warn!(kid, "key set publishes kid more than once; ignoring it");
            }
        }

        Self {
            keys: index,
            fetched_at: Instant::now(),
        }
    }

    /// Look up a key by ID
    pub(crate) fn get(&self, kid: &str) -> Option<Arc<Jwk>> {
        self.keys.get(kid).cloned()
    }

    /// Number of selectable keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key IDs in this snapshot, unordered
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// When this snapshot was fetched
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}
