//! Single-use, time-boxed redemption tokens.
//!
//! A token is an opaque credential bound to one operation kind and one
//! payload, redeemed exactly once via a side channel. The exactly-once
//! guarantee comes from ordering: the stored record is flipped to `used`
//! *before* the expensive fetch the token gates, so the loser of a
//! concurrent redemption race sees the flag and is rejected. If the fetch
//! then fails, the token is burned and the client must re-issue.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    skilldock_cache::KvCache,
    skilldock_common::{Error, Result},
    tracing::{debug, info},
};

/// Token lifetime from issuance.
pub const ISSUE_TTL: Duration = Duration::from_secs(300);

/// How long a consumed record is kept, for forensics only.
const BURNED_TTL: Duration = Duration::from_secs(60);

const TOKEN_BYTES: usize = 24;

/// Operation a token is bound to. The kind is baked into the token string
/// as a prefix so the redemption endpoint can dispatch (and reject
/// cross-kind use) before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bulk install fetch.
    Install,
    /// Bulk edit fetch.
    Edit,
    /// Generic API session.
    Api,
}

impl TokenKind {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Install => "sk_install_",
            Self::Edit => "sk_edit_",
            Self::Api => "sk_api_",
        }
    }
}

/// Stored record: payload plus lifecycle state.
#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord<P> {
    payload: P,
    created_ms: u64,
    used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    used_at_ms: Option<u64>,
}

/// Issues and redeems tokens against the shared KV cache.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn KvCache>,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(store: Arc<dyn KvCache>) -> Self {
        Self {
            store,
            ttl: ISSUE_TTL,
        }
    }

    /// Override the issuance TTL (tests use short lifetimes).
    #[must_use]
    pub fn with_ttl(store: Arc<dyn KvCache>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh token of `kind` bound to `payload`.
    pub async fn issue<P: Serialize>(&self, kind: TokenKind, payload: &P) -> Result<String> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = format!("{}{}", kind.prefix(), URL_SAFE_NO_PAD.encode(bytes));

        let record = TokenRecord {
            payload,
            created_ms: now_ms(),
            used: false,
            used_at_ms: None,
        };
        self.store
            .put(&storage_key(&token), serde_json::to_string(&record)?, self.ttl)
            .await;

        debug!(kind = ?kind, "issued token");
        Ok(token)
    }

    /// Redeem a token, returning its payload exactly once.
    ///
    /// The record is rewritten as `used` *before* the caller runs the fetch
    /// this token gates; a concurrent second redemption finds the flag set
    /// and gets `AlreadyConsumed`.
    pub async fn redeem<P>(&self, kind: TokenKind, token: &str) -> Result<P>
    where
        P: Serialize + DeserializeOwned,
    {
        if !token.starts_with(kind.prefix()) {
            return Err(Error::invalid(format!(
                "token is not a {} token",
                kind.prefix().trim_end_matches('_')
            )));
        }

        let key = storage_key(token);
        let raw = self
            .store
            .get(&key)
            .await
            .ok_or_else(|| Error::expired("token not found or expired; re-issue"))?;
        let mut record: TokenRecord<P> = serde_json::from_str(&raw)?;

        if record.used {
            return Err(Error::AlreadyConsumed);
        }

        record.used = true;
        record.used_at_ms = Some(now_ms());
        self.store
            .put(&key, serde_json::to_string(&record)?, BURNED_TTL)
            .await;

        info!(kind = ?kind, "token redeemed");
        Ok(record.payload)
    }
}

fn storage_key(token: &str) -> String {
    format!("token:{token}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
