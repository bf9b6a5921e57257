//! Per-phone conversational state and the injectable session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::catalog::ServiceKind;

/// The five dialogue states. The machine is cyclic: a successful submit or a
/// restart returns to `Welcome` with all fields cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Welcome,
    ServiceSelect,
    ProviderSelect,
    FormFill,
    Confirmation,
}

impl ChatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Welcome => "welcome",
            ChatState::ServiceSelect => "service_select",
            ChatState::ProviderSelect => "provider_select",
            ChatState::FormFill => "form_fill",
            ChatState::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for ChatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One phone number's conversational state.
///
/// Invariant: `selected_provider` is only set while `selected_service` is set;
/// a reset clears both together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub state: ChatState,
    pub selected_service: Option<ServiceKind>,
    pub selected_provider: Option<String>,
    pub form_data: HashMap<String, String>,
    pub last_activity: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: ChatState::Welcome,
            selected_service: None,
            selected_provider: None,
            form_data: HashMap::new(),
            last_activity: now,
        }
    }

    /// Clear every field back to the initial `Welcome` state.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    /// True when the session carries no progress at all.
    pub fn is_initial(&self) -> bool {
        self.state == ChatState::Welcome
            && self.selected_service.is_none()
            && self.selected_provider.is_none()
            && self.form_data.is_empty()
    }
}

// ─── SessionStore ─────────────────────────────────────────────────────────────

/// Injectable session storage keyed by phone number.
///
/// The in-memory implementation below serves tests and single-process
/// deployments; a cache-backed implementation can be swapped in without
/// touching the dialogue logic. Per-phone serialization is the router's
/// responsibility, not the store's.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, phone: &str) -> Option<ChatSession>;
    async fn put(&self, phone: &str, session: ChatSession);
    async fn remove(&self, phone: &str);
    async fn count(&self) -> usize;
    /// Drop sessions whose `last_activity` is older than `cutoff`.
    /// Returns the evicted phone numbers.
    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Vec<String>;
}

/// Process-local session map.
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, ChatSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, phone: &str) -> Option<ChatSession> {
        self.inner.read().await.get(phone).cloned()
    }

    async fn put(&self, phone: &str, session: ChatSession) {
        self.inner.write().await.insert(phone.to_string(), session);
    }

    async fn remove(&self, phone: &str) {
        self.inner.write().await.remove(phone);
    }

    async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let mut map = self.inner.write().await;
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, s)| s.last_activity < cutoff)
            .map(|(phone, _)| phone.clone())
            .collect();
        for phone in &expired {
            map.remove(phone);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_session_starts_in_welcome() {
        let session = ChatSession::new(Utc::now());
        assert_eq!(session.state, ChatState::Welcome);
        assert!(session.is_initial());
    }

    #[tokio::test]
    async fn store_round_trip() {
        let store = InMemorySessionStore::new();
        assert!(store.get("919876543210").await.is_none());

        let mut session = ChatSession::new(Utc::now());
        session.state = ChatState::ServiceSelect;
        store.put("919876543210", session).await;

        assert_eq!(store.count().await, 1);
        let loaded = store.get("919876543210").await.unwrap();
        assert_eq!(loaded.state, ChatState::ServiceSelect);

        store.remove("919876543210").await;
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn evict_idle_only_touches_stale_sessions() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();

        let stale = ChatSession::new(now - Duration::hours(48));
        let fresh = ChatSession::new(now);
        store.put("stale", stale).await;
        store.put("fresh", fresh).await;

        let evicted = store.evict_idle(now - Duration::hours(24)).await;
        assert_eq!(evicted, vec!["stale".to_string()]);
        assert!(store.get("stale").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }
}
