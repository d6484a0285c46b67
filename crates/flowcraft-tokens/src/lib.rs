//! ABOUTME: Token Manager (C5) — per-user third-party credential store with
//! ABOUTME: expiry and a background cleanup sweep. Tokens are never logged.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::traits::{TokenInfo, TokenStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Wraps the raw token so it can never leak into a trace or panic message:
/// no `Display`, and `Debug` prints a fixed redaction marker instead of the value.
struct OpaqueToken(String);

impl std::fmt::Debug for OpaqueToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OpaqueToken(<redacted>)")
    }
}

struct TokenEntry {
    token: OpaqueToken,
    email: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-process credential store. Tokens are mutex-guarded and reaped by a
/// periodic sweep rather than on every read, mirroring the teacher's
/// background-task pattern for time-driven maintenance work.
pub struct InMemoryTokenStore {
    entries: Mutex<HashMap<String, TokenEntry>>,
    ttl: ChronoDuration,
}

impl InMemoryTokenStore {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::hours(1)),
        })
    }

    pub fn with_default_ttl() -> Arc<Self> {
        Self::new(Duration::from_secs(3600))
    }

    /// Start the periodic sweep that drops expired entries. Spawned once at
    /// startup; the returned handle can be aborted on shutdown.
    pub fn start_sweeping(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let reaped = self.sweep();
                if reaped > 0 {
                    info!(reaped, "token sweep reaped expired credentials");
                }
            }
        })
    }

    fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    #[instrument(skip(self, access_token))]
    async fn store_google_token(&self, user_id: &str, email: &str, access_token: &str) -> Result<()> {
        let now = Utc::now();
        let entry = TokenEntry {
            token: OpaqueToken(access_token.to_string()),
            email: email.to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.entries.lock().insert(user_id.to_string(), entry);
        Ok(())
    }

    async fn get_google_token(&self, user_id: &str) -> Result<String> {
        let entries = self.entries.lock();
        match entries.get(user_id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(entry.token.0.clone()),
            _ => Err(FlowError::MissingCredential {
                user_id: user_id.to_string(),
            }),
        }
    }

    async fn get_token_info(&self, user_id: &str) -> Result<TokenInfo> {
        let entries = self.entries.lock();
        match entries.get(user_id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(TokenInfo {
                user_id: user_id.to_string(),
                email: entry.email.clone(),
                issued_at: entry.issued_at,
                expires_at: entry.expires_at,
            }),
            _ => Err(FlowError::MissingCredential {
                user_id: user_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_retrieves_a_token() {
        let store = InMemoryTokenStore::with_default_ttl();
        store.store_google_token("u1", "u1@example.com", "secret-token").await.unwrap();

        let token = store.get_google_token("u1").await.unwrap();
        assert_eq!(token, "secret-token");

        let info = store.get_token_info("u1").await.unwrap();
        assert_eq!(info.email, "u1@example.com");
    }

    #[tokio::test]
    async fn missing_token_yields_missing_credential() {
        let store = InMemoryTokenStore::with_default_ttl();
        let result = store.get_google_token("nobody").await;
        assert!(matches!(result, Err(FlowError::MissingCredential { .. })));
    }

    #[tokio::test]
    async fn expired_token_is_treated_as_missing() {
        let store = InMemoryTokenStore::new(Duration::from_millis(1));
        store.store_google_token("u1", "u1@example.com", "secret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = store.get_google_token("u1").await;
        assert!(matches!(result, Err(FlowError::MissingCredential { .. })));
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries() {
        let store = InMemoryTokenStore::new(Duration::from_millis(1));
        store.store_google_token("u1", "u1@example.com", "secret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let reaped = store.sweep();
        assert_eq!(reaped, 1);
        assert_eq!(store.entries.lock().len(), 0);
    }

    #[test]
    fn debug_output_never_contains_the_raw_token() {
        let entry = OpaqueToken("super-secret-value".to_string());
        let debug_str = format!("{entry:?}");
        assert!(!debug_str.contains("super-secret-value"));
    }
}
