//! The dialogue state machine.
//!
//! [`advance`] is a pure function: it consumes the current session and one
//! classified input and returns the next session plus the replies to send.
//! All I/O (store writes, outbound dispatch) happens in the router, which
//! keeps every transition unit-testable without a network boundary.
//!
//! Malformed input can never escape this module as an error: every path
//! degrades to a re-prompt in the same state or a fail-closed reset to
//! `Welcome`.

use chrono::{DateTime, Utc};

use crate::catalog::{ServiceCatalog, ServiceKind};
use crate::whatsapp::intent::{self, ButtonAction, Inbound, TextIntent};
use crate::whatsapp::prompts;
use crate::whatsapp::session::{ChatSession, ChatState};

/// Outcome of one dialogue step.
#[derive(Debug)]
pub struct Turn {
    pub session: ChatSession,
    pub replies: Vec<String>,
    /// Set when this step completed a submission.
    pub tracking_id: Option<String>,
}

impl Turn {
    fn reply(session: ChatSession, body: String) -> Self {
        Self {
            session,
            replies: vec![body],
            tracking_id: None,
        }
    }
}

/// Tracking ids are a fixed prefix plus a compact UTC timestamp. Two
/// submissions in the same second collide — acceptable for this flow.
pub fn tracking_id(now: DateTime<Utc>) -> String {
    format!("GF{}", now.format("%Y%m%d%H%M%S"))
}

/// Apply one inbound message to a session.
pub fn advance(
    mut session: ChatSession,
    inbound: &Inbound,
    catalog: &ServiceCatalog,
    now: DateTime<Utc>,
) -> Turn {
    session.last_activity = now;
    match inbound {
        Inbound::Text(raw) => advance_text(session, raw, catalog, now),
        Inbound::Button(payload) => advance_button(session, payload, catalog, now),
    }
}

fn advance_text(
    mut session: ChatSession,
    raw: &str,
    catalog: &ServiceCatalog,
    now: DateTime<Utc>,
) -> Turn {
    let text = raw.trim();
    let intent = intent::classify_text(text, catalog);

    // Explicit restart is honored from any state.
    if intent == TextIntent::Restart {
        return restart(session, catalog, now);
    }

    match session.state {
        ChatState::Welcome => {
            session.state = ChatState::ServiceSelect;
            Turn::reply(session, prompts::service_menu(catalog))
        }
        ChatState::ServiceSelect => match intent {
            TextIntent::SelectService(kind) => select_service(session, kind, catalog, now),
            // Anything else — free text, or a provider name arriving one
            // state too early — re-prompts for a service.
            _ => Turn::reply(session, prompts::invalid_service()),
        },
        ChatState::ProviderSelect => {
            let Some(kind) = session.selected_service else {
                // Provider state without a service is a corrupted session.
                return fail_closed(session, catalog, now);
            };
            let Some(entry) = catalog.get(kind) else {
                return fail_closed(session, catalog, now);
            };
            match intent {
                TextIntent::SelectProvider(of, provider) if of == kind => {
                    select_provider(session, provider)
                }
                _ => Turn::reply(session, prompts::invalid_provider(&entry.providers)),
            }
        }
        ChatState::FormFill => {
            // Captured verbatim, whatever the classifier saw in it.
            session
                .form_data
                .insert("user_input".to_string(), text.to_string());
            session.state = ChatState::Confirmation;
            let summary = match session.selected_service.and_then(|k| catalog.get(k)) {
                Some(entry) => prompts::confirmation_summary(entry, &session),
                None => return fail_closed(session, catalog, now),
            };
            Turn::reply(session, summary)
        }
        ChatState::Confirmation => match intent {
            TextIntent::Confirm => submit(session, now),
            TextIntent::Deny => restart(session, catalog, now),
            _ => Turn::reply(session, prompts::confirm_reprompt()),
        },
    }
}

fn advance_button(
    session: ChatSession,
    payload: &str,
    catalog: &ServiceCatalog,
    now: DateTime<Utc>,
) -> Turn {
    match intent::parse_button(payload) {
        ButtonAction::Service(key) => match ServiceKind::parse(&key) {
            Some(kind) if catalog.get(kind).is_some() => {
                select_service(session, kind, catalog, now)
            }
            // Unknown service key in a structured payload: fail closed.
            _ => fail_closed(session, catalog, now),
        },
        ButtonAction::Provider(name) => {
            let Some(kind) = session.selected_service else {
                // A provider button with no service selected violates the
                // session invariant; treat the payload as corrupted.
                return fail_closed(session, catalog, now);
            };
            match catalog.canonical_provider(kind, &name) {
                Some(provider) => select_provider(session, provider.to_string()),
                None => fail_closed(session, catalog, now),
            }
        }
        ButtonAction::Confirm => {
            if session.state == ChatState::Confirmation {
                submit(session, now)
            } else {
                // Confirm outside the confirmation state is a classification
                // miss, not corruption — re-prompt where we are.
                reprompt_current(session, catalog, now)
            }
        }
        ButtonAction::Restart => restart(session, catalog, now),
        ButtonAction::Unknown(_) => fail_closed(session, catalog, now),
    }
}

// ─── Shared transitions ───────────────────────────────────────────────────────

fn select_service(
    mut session: ChatSession,
    kind: ServiceKind,
    catalog: &ServiceCatalog,
    now: DateTime<Utc>,
) -> Turn {
    let Some(entry) = catalog.get(kind) else {
        return fail_closed(session, catalog, now);
    };
    session.selected_service = Some(kind);
    // A new service choice invalidates any previously chosen provider.
    session.selected_provider = None;
    session.state = ChatState::ProviderSelect;
    Turn::reply(session, prompts::provider_menu(entry))
}

fn select_provider(mut session: ChatSession, provider: String) -> Turn {
    let body = prompts::form_prompt(&provider);
    session.selected_provider = Some(provider);
    session.state = ChatState::FormFill;
    Turn::reply(session, body)
}

fn submit(mut session: ChatSession, now: DateTime<Utc>) -> Turn {
    let id = tracking_id(now);
    let body = prompts::success_message(&id);
    session.reset(now);
    Turn {
        session,
        replies: vec![body],
        tracking_id: Some(id),
    }
}

fn restart(mut session: ChatSession, catalog: &ServiceCatalog, now: DateTime<Utc>) -> Turn {
    session.reset(now);
    Turn::reply(session, prompts::welcome_message(catalog))
}

/// Corrupted payload or broken invariant: reset to `Welcome` with a generic
/// error rather than surfacing an internal failure.
fn fail_closed(mut session: ChatSession, catalog: &ServiceCatalog, now: DateTime<Utc>) -> Turn {
    session.reset(now);
    Turn {
        session,
        replies: vec![prompts::generic_error(), prompts::welcome_message(catalog)],
        tracking_id: None,
    }
}

/// Re-emit the prompt for the state the session is already in.
fn reprompt_current(session: ChatSession, catalog: &ServiceCatalog, now: DateTime<Utc>) -> Turn {
    let body = match session.state {
        ChatState::Welcome => prompts::welcome_message(catalog),
        ChatState::ServiceSelect => prompts::service_menu(catalog),
        ChatState::ProviderSelect => match session.selected_service.and_then(|k| catalog.get(k)) {
            Some(entry) => prompts::provider_menu(entry),
            None => return fail_closed(session, catalog, now),
        },
        ChatState::FormFill => match session.selected_provider.clone() {
            Some(provider) => prompts::form_prompt(&provider),
            None => return fail_closed(session, catalog, now),
        },
        ChatState::Confirmation => prompts::confirm_reprompt(),
    };
    Turn::reply(session, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::default_catalog()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    fn text(s: &str) -> Inbound {
        Inbound::Text(s.to_string())
    }

    fn button(s: &str) -> Inbound {
        Inbound::Button(s.to_string())
    }

    fn fresh() -> ChatSession {
        ChatSession::new(fixed_now())
    }

    #[test]
    fn tracking_id_is_prefix_plus_compact_timestamp() {
        assert_eq!(tracking_id(fixed_now()), "GF20250314092653");
    }

    #[test]
    fn welcome_advances_on_any_text() {
        let turn = advance(fresh(), &text("hello"), &catalog(), fixed_now());
        assert_eq!(turn.session.state, ChatState::ServiceSelect);
        assert_eq!(turn.replies.len(), 1);
    }

    #[test]
    fn invalid_service_text_is_idempotent() {
        let turn = advance(fresh(), &text("hi"), &catalog(), fixed_now());
        let after_first = advance(turn.session, &text("nonsense"), &catalog(), fixed_now());
        assert_eq!(after_first.session.state, ChatState::ServiceSelect);

        let after_second = advance(
            after_first.session,
            &text("nonsense"),
            &catalog(),
            fixed_now(),
        );
        assert_eq!(after_second.session.state, ChatState::ServiceSelect);
        assert!(after_second.session.selected_service.is_none());
    }

    #[test]
    fn provider_name_is_rejected_at_service_select() {
        // A provider name is the wrong kind of answer one state early — even
        // "Gujarat Gas", which embeds the "gas" service key.
        let turn = advance(fresh(), &text("gas"), &catalog(), fixed_now());
        assert_eq!(turn.session.state, ChatState::ServiceSelect);

        let rejected = advance(turn.session, &text("Gujarat Gas"), &catalog(), fixed_now());
        assert_eq!(rejected.session.state, ChatState::ServiceSelect);
        assert!(rejected.session.selected_service.is_none());

        let also_rejected = advance(rejected.session, &text("GUVNL"), &catalog(), fixed_now());
        assert_eq!(also_rejected.session.state, ChatState::ServiceSelect);

        let accepted = advance(also_rejected.session, &text("gas"), &catalog(), fixed_now());
        assert_eq!(accepted.session.state, ChatState::ProviderSelect);
        assert_eq!(accepted.session.selected_service, Some(ServiceKind::Gas));
    }

    #[test]
    fn provider_selection_records_canonical_name() {
        let mut session = fresh();
        session.state = ChatState::ProviderSelect;
        session.selected_service = Some(ServiceKind::Electricity);

        let turn = advance(session, &text("guvnl"), &catalog(), fixed_now());
        assert_eq!(turn.session.state, ChatState::FormFill);
        assert_eq!(turn.session.selected_provider.as_deref(), Some("GUVNL"));
    }

    #[test]
    fn form_fill_stores_text_verbatim() {
        let mut session = fresh();
        session.state = ChatState::FormFill;
        session.selected_service = Some(ServiceKind::Electricity);
        session.selected_provider = Some("GUVNL".to_string());

        let turn = advance(
            session,
            &text("John Doe, ID 12345"),
            &catalog(),
            fixed_now(),
        );
        assert_eq!(turn.session.state, ChatState::Confirmation);
        assert_eq!(
            turn.session.form_data.get("user_input").map(String::as_str),
            Some("John Doe, ID 12345")
        );
    }

    #[test]
    fn confirm_button_submits_and_resets() {
        let mut session = fresh();
        session.state = ChatState::Confirmation;
        session.selected_service = Some(ServiceKind::Gas);
        session.selected_provider = Some("Gujarat Gas".to_string());
        session
            .form_data
            .insert("user_input".to_string(), "details".to_string());

        let turn = advance(session, &button("confirm"), &catalog(), fixed_now());
        let id = turn.tracking_id.expect("submission yields a tracking id");
        assert_eq!(id, "GF20250314092653");
        assert!(turn.session.is_initial());
        assert!(turn.replies[0].contains(&id));
    }

    #[test]
    fn typed_yes_submits_like_the_button() {
        let mut session = fresh();
        session.state = ChatState::Confirmation;
        session.selected_service = Some(ServiceKind::Gas);
        session.selected_provider = Some("Indane".to_string());

        let turn = advance(session, &text("YES"), &catalog(), fixed_now());
        assert!(turn.tracking_id.is_some());
        assert!(turn.session.is_initial());
    }

    #[test]
    fn typed_no_cancels_back_to_welcome() {
        let mut session = fresh();
        session.state = ChatState::Confirmation;
        session.selected_service = Some(ServiceKind::Gas);

        let turn = advance(session, &text("no"), &catalog(), fixed_now());
        assert!(turn.tracking_id.is_none());
        assert!(turn.session.is_initial());
    }

    #[test]
    fn restart_button_clears_everything_from_any_state() {
        for state in [
            ChatState::ServiceSelect,
            ChatState::ProviderSelect,
            ChatState::FormFill,
            ChatState::Confirmation,
        ] {
            let mut session = fresh();
            session.state = state;
            session.selected_service = Some(ServiceKind::Water);
            session.selected_provider = Some("Water Board".to_string());
            session
                .form_data
                .insert("user_input".to_string(), "x".to_string());

            let turn = advance(session, &button("restart"), &catalog(), fixed_now());
            assert!(turn.session.is_initial(), "state {state} did not reset");
        }
    }

    #[test]
    fn corrupted_service_button_fails_closed() {
        let turn = advance(
            fresh(),
            &button("service_broadband"),
            &catalog(),
            fixed_now(),
        );
        assert!(turn.session.is_initial());
        assert!(turn.replies[0].contains("start over"));
    }

    #[test]
    fn provider_button_without_service_fails_closed() {
        let turn = advance(
            fresh(),
            &button("provider_Gujarat_Gas"),
            &catalog(),
            fixed_now(),
        );
        assert!(turn.session.is_initial());
    }

    #[test]
    fn provider_button_takes_the_transition_directly() {
        let mut session = fresh();
        session.state = ChatState::ProviderSelect;
        session.selected_service = Some(ServiceKind::Gas);

        let turn = advance(
            session,
            &button("provider_Gujarat_Gas"),
            &catalog(),
            fixed_now(),
        );
        assert_eq!(turn.session.state, ChatState::FormFill);
        assert_eq!(
            turn.session.selected_provider.as_deref(),
            Some("Gujarat Gas")
        );
    }

    #[test]
    fn confirm_button_outside_confirmation_reprompts() {
        let mut session = fresh();
        session.state = ChatState::ServiceSelect;

        let turn = advance(session, &button("confirm"), &catalog(), fixed_now());
        assert_eq!(turn.session.state, ChatState::ServiceSelect);
        assert!(turn.tracking_id.is_none());
    }

    #[test]
    fn new_service_choice_drops_stale_provider() {
        let mut session = fresh();
        session.state = ChatState::ProviderSelect;
        session.selected_service = Some(ServiceKind::Gas);
        session.selected_provider = Some("Gujarat Gas".to_string());

        let turn = advance(session, &button("service_water"), &catalog(), fixed_now());
        assert_eq!(turn.session.selected_service, Some(ServiceKind::Water));
        assert!(turn.session.selected_provider.is_none());
    }
}
