//! Session orchestration: per-phone locking, transition application, and
//! outbound dispatch.

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::ServiceCatalog;
use crate::whatsapp::flow;
use crate::whatsapp::session::{ChatSession, SessionStore};
use crate::whatsapp::transport::MessageTransport;
use crate::whatsapp::webhook::InboundEvent;

/// Read-only status report for the probe endpoint.
#[derive(Debug, Serialize)]
pub struct ChatStatus {
    pub status: &'static str,
    pub configured: bool,
    pub active_sessions: usize,
    pub services: Vec<&'static str>,
}

pub struct ChatRouter {
    catalog: Arc<ServiceCatalog>,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn MessageTransport>,
    /// Per-phone mutexes. Concurrent deliveries for the same number (e.g. a
    /// duplicated webhook) serialize here; different numbers run in parallel.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatRouter {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            catalog,
            store,
            transport,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn key_lock(&self, phone: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one inbound event end to end.
    ///
    /// The per-phone lock covers only the load → transition → store window;
    /// outbound sends are awaited after it is released. A send failure is
    /// logged and swallowed — the session keeps its new state and the next
    /// inbound event re-drives the conversation.
    pub async fn handle_event(&self, event: InboundEvent) {
        let phone = event.from;
        let lock = self.key_lock(&phone).await;

        let turn = {
            let _guard = lock.lock().await;
            let now = Utc::now();
            let session = self
                .store
                .get(&phone)
                .await
                .unwrap_or_else(|| ChatSession::new(now));
            let turn = flow::advance(session, &event.inbound, &self.catalog, now);
            self.store.put(&phone, turn.session.clone()).await;
            turn
        };

        if let Some(tracking_id) = &turn.tracking_id {
            info!(phone, tracking_id, "chat application submitted");
        }

        for body in &turn.replies {
            if let Err(e) = self.transport.send(&phone, body).await {
                warn!(phone, err = %e, "outbound send failed — session state preserved");
            }
        }
    }

    pub async fn status(&self) -> ChatStatus {
        ChatStatus {
            status: "active",
            configured: self.transport.is_configured(),
            active_sessions: self.store.count().await,
            services: self.catalog.keys(),
        }
    }

    /// Periodically evict sessions idle past the configured window, keeping
    /// the otherwise unbounded per-phone maps in check. Never spawned when
    /// `idle_minutes` is 0.
    pub fn spawn_idle_sweeper(self: Arc<Self>, idle_minutes: u64) -> tokio::task::JoinHandle<()> {
        let router = self;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tick.tick().await;
                let cutoff = Utc::now() - ChronoDuration::minutes(idle_minutes as i64);
                let evicted = router.store.evict_idle(cutoff).await;
                if !evicted.is_empty() {
                    let mut locks = router.locks.lock().await;
                    for phone in &evicted {
                        locks.remove(phone);
                    }
                    debug!(count = evicted.len(), "evicted idle chat sessions");
                }
            }
        })
    }
}
