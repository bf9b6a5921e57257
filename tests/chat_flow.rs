//! End-to-end chatbot conversations driven through the router, with a
//! recording transport in place of the Graph API.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Mutex;

use sevad::catalog::{ServiceCatalog, ServiceKind};
use sevad::whatsapp::{
    ChatRouter, ChatState, Inbound, InMemorySessionStore, InboundEvent, MessageTransport,
    SessionStore,
};

static TRACKING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"GF\d{14}").unwrap());

struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    async fn last_body(&self) -> String {
        self.sent
            .lock()
            .await
            .last()
            .map(|(_, body)| body.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((phone.to_string(), body.to_string()));
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct Harness {
    router: Arc<ChatRouter>,
    store: Arc<InMemorySessionStore>,
    transport: Arc<RecordingTransport>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let transport = RecordingTransport::new();
        let router = Arc::new(ChatRouter::new(
            Arc::new(ServiceCatalog::default_catalog()),
            store.clone(),
            transport.clone(),
        ));
        Self {
            router,
            store,
            transport,
        }
    }

    async fn text(&self, phone: &str, body: &str) {
        self.router
            .handle_event(InboundEvent {
                from: phone.to_string(),
                inbound: Inbound::Text(body.to_string()),
            })
            .await;
    }

    async fn button(&self, phone: &str, payload: &str) {
        self.router
            .handle_event(InboundEvent {
                from: phone.to_string(),
                inbound: Inbound::Button(payload.to_string()),
            })
            .await;
    }

    async fn session(&self, phone: &str) -> sevad::whatsapp::ChatSession {
        self.store.get(phone).await.expect("session exists")
    }
}

const PHONE: &str = "919876543210";

#[tokio::test]
async fn fresh_sessions_start_in_welcome_and_advance_to_service_select() {
    let h = Harness::new();
    h.text(PHONE, "namaste").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::ServiceSelect);
    assert!(h.transport.last_body().await.contains("select a service"));
}

#[tokio::test]
async fn provider_name_is_wrong_state_but_service_name_advances() {
    let h = Harness::new();
    h.text(PHONE, "gas").await;

    // "Gujarat Gas" names a provider, not a service — rejected here.
    h.text(PHONE, "Gujarat Gas").await;
    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::ServiceSelect);
    assert!(h.transport.last_body().await.contains("valid service"));

    h.text(PHONE, "gas").await;
    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::ProviderSelect);
    assert_eq!(session.selected_service, Some(ServiceKind::Gas));
}

#[tokio::test]
async fn invalid_service_text_reprompts_idempotently() {
    let h = Harness::new();
    h.text(PHONE, "hello").await;

    h.text(PHONE, "broadband please").await;
    let first = h.session(PHONE).await;
    h.text(PHONE, "broadband please").await;
    let second = h.session(PHONE).await;

    assert_eq!(first.state, ChatState::ServiceSelect);
    assert_eq!(second.state, ChatState::ServiceSelect);
    assert!(second.selected_service.is_none());
}

#[tokio::test]
async fn electricity_provider_selection_reaches_form_fill() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "electricity").await;
    h.text(PHONE, "GUVNL").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::FormFill);
    assert_eq!(session.selected_provider.as_deref(), Some("GUVNL"));
}

#[tokio::test]
async fn form_text_is_stored_verbatim_and_summarized() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "electricity").await;
    h.text(PHONE, "GUVNL").await;
    h.text(PHONE, "John Doe, ID 12345").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::Confirmation);
    assert_eq!(
        session.form_data.get("user_input").map(String::as_str),
        Some("John Doe, ID 12345")
    );
    assert!(h.transport.last_body().await.contains("John Doe, ID 12345"));
}

#[tokio::test]
async fn confirm_button_issues_tracking_id_and_resets() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "gas").await;
    h.text(PHONE, "Indane").await;
    h.text(PHONE, "Asha Patel, consumer 881").await;
    h.button(PHONE, "confirm").await;

    let body = h.transport.last_body().await;
    assert!(
        TRACKING_RE.is_match(&body),
        "success message should carry a GF tracking id: {body}"
    );

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::Welcome);
    assert!(session.selected_service.is_none());
    assert!(session.selected_provider.is_none());
    assert!(session.form_data.is_empty());
}

#[tokio::test]
async fn typed_yes_round_trips_to_initial_state() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "water").await;
    h.text(PHONE, "Water Board").await;
    h.text(PHONE, "details here").await;
    h.text(PHONE, "YES").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::Welcome);
    assert!(session.form_data.is_empty());
}

#[tokio::test]
async fn restart_button_clears_mid_flow_state() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "property").await;
    h.button(PHONE, "restart").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::Welcome);
    assert!(session.selected_service.is_none());
    assert!(session.selected_provider.is_none());
    assert!(session.form_data.is_empty());
    assert!(h.transport.last_body().await.contains("Welcome"));
}

#[tokio::test]
async fn button_driven_flow_bypasses_text_matching() {
    let h = Harness::new();
    h.button(PHONE, "service_electricity").await;
    h.button(PHONE, "provider_DGVCL").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::FormFill);
    assert_eq!(session.selected_service, Some(ServiceKind::Electricity));
    assert_eq!(session.selected_provider.as_deref(), Some("DGVCL"));
}

#[tokio::test]
async fn corrupted_button_payload_fails_closed_to_welcome() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;
    h.text(PHONE, "gas").await;
    h.button(PHONE, "service_broadband").await;

    let session = h.session(PHONE).await;
    assert_eq!(session.state, ChatState::Welcome);
    assert!(session.selected_service.is_none());
}

#[tokio::test]
async fn duplicate_webhook_deliveries_for_one_phone_serialize() {
    let h = Harness::new();
    h.text(PHONE, "hi").await;

    // Two copies of the same selection racing; per-phone locking means the
    // second observes the state left by the first.
    let (a, b) = tokio::join!(h.text(PHONE, "gas"), h.text(PHONE, "gas"));
    let _ = (a, b);

    let session = h.session(PHONE).await;
    // One of the deliveries advanced to provider_select, the other was a
    // re-prompt there; either way the session is consistent and gas-bound.
    assert_eq!(session.state, ChatState::ProviderSelect);
    assert_eq!(session.selected_service, Some(ServiceKind::Gas));
}

#[tokio::test]
async fn sessions_for_different_phones_are_isolated() {
    let h = Harness::new();
    h.text("911111111111", "hi").await;
    h.text("911111111111", "gas").await;
    h.text("922222222222", "hi").await;

    let first = h.session("911111111111").await;
    let second = h.session("922222222222").await;
    assert_eq!(first.state, ChatState::ProviderSelect);
    assert_eq!(second.state, ChatState::ServiceSelect);
    assert_eq!(h.store.count().await, 2);
}
