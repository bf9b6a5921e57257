//! Inbound message classification.
//!
//! Free text is classified against the whole catalog at once: every known
//! needle (service key, display name, local name, and every provider name)
//! contained in the text is a candidate, and the longest needle wins, with
//! catalog order breaking ties. Ranking provider names alongside service
//! names keeps the two intents apart — "Gujarat Gas" classifies as a provider
//! choice, not as the gas service, and the state machine decides whether a
//! provider choice is valid where the conversation currently stands.
//!
//! Button-driven input carries structured payload ids (`service_<key>`,
//! `provider_<name>`, `confirm`, `restart`) and bypasses text matching.

use crate::catalog::{ServiceCatalog, ServiceKind};

/// A normalized inbound message. `Interactive` button replies collapse into
/// `Button` during webhook extraction, so the dialogue only sees two kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Button(String),
}

/// Classified meaning of a free-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextIntent {
    SelectService(ServiceKind),
    /// A provider name, tagged with the service it belongs to.
    SelectProvider(ServiceKind, String),
    Confirm,
    Deny,
    Restart,
    /// No catalog needle matched; meaning depends on the dialogue state.
    Free,
}

/// Parsed structured button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Service(String),
    Provider(String),
    Confirm,
    Restart,
    Unknown(String),
}

/// Split a button payload id into its action.
///
/// Provider payloads encode spaces as underscores (`provider_Gujarat_Gas`).
pub fn parse_button(payload: &str) -> ButtonAction {
    if let Some(key) = payload.strip_prefix("service_") {
        ButtonAction::Service(key.to_string())
    } else if let Some(name) = payload.strip_prefix("provider_") {
        ButtonAction::Provider(name.replace('_', " "))
    } else if payload == "confirm" {
        ButtonAction::Confirm
    } else if payload == "restart" {
        ButtonAction::Restart
    } else {
        ButtonAction::Unknown(payload.to_string())
    }
}

/// Classify one free-text message against the catalog.
///
/// `restart` / `yes` / `no` are exact matches (trimmed, case-insensitive) so
/// free-form details containing those words are not misread as commands.
pub fn classify_text(text: &str, catalog: &ServiceCatalog) -> TextIntent {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("restart") {
        return TextIntent::Restart;
    }
    if trimmed.eq_ignore_ascii_case("yes") {
        return TextIntent::Confirm;
    }
    if trimmed.eq_ignore_ascii_case("no") {
        return TextIntent::Deny;
    }

    let haystack = trimmed.to_lowercase();
    let mut best: Option<(usize, TextIntent)> = None;

    let mut consider = |needle: &str, intent: TextIntent| {
        if needle.is_empty() || !haystack.contains(needle) {
            return;
        }
        let len = needle.chars().count();
        // Strictly-greater keeps the earlier catalog entry on ties.
        if best.as_ref().map_or(true, |(b, _)| len > *b) {
            best = Some((len, intent));
        }
    };

    for entry in catalog.entries() {
        consider(entry.kind.as_str(), TextIntent::SelectService(entry.kind));
        consider(
            &entry.name.to_lowercase(),
            TextIntent::SelectService(entry.kind),
        );
        consider(&entry.name_local, TextIntent::SelectService(entry.kind));
        for provider in &entry.providers {
            consider(
                &provider.to_lowercase(),
                TextIntent::SelectProvider(entry.kind, provider.clone()),
            );
        }
    }

    best.map(|(_, intent)| intent).unwrap_or(TextIntent::Free)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::default_catalog()
    }

    #[test]
    fn matches_service_by_key_name_or_local_name() {
        let catalog = catalog();
        assert_eq!(
            classify_text("gas", &catalog),
            TextIntent::SelectService(ServiceKind::Gas)
        );
        assert_eq!(
            classify_text("I want Electricity please", &catalog),
            TextIntent::SelectService(ServiceKind::Electricity)
        );
        assert_eq!(
            classify_text("पानी", &catalog),
            TextIntent::SelectService(ServiceKind::Water)
        );
        assert_eq!(classify_text("something else", &catalog), TextIntent::Free);
    }

    #[test]
    fn provider_names_outrank_embedded_service_keys() {
        let catalog = catalog();
        // "Gujarat Gas" contains the "gas" needle, but the full provider name
        // is longer and wins — this is a provider choice, not a service one.
        assert_eq!(
            classify_text("Gujarat Gas", &catalog),
            TextIntent::SelectProvider(ServiceKind::Gas, "Gujarat Gas".to_string())
        );
        assert_eq!(
            classify_text("guvnl", &catalog),
            TextIntent::SelectProvider(ServiceKind::Electricity, "GUVNL".to_string())
        );
    }

    #[test]
    fn longest_needle_wins_when_text_names_two_services() {
        let catalog = catalog();
        assert_eq!(
            classify_text("gas or property?", &catalog),
            TextIntent::SelectService(ServiceKind::Property)
        );
        // Equal-length needles fall back to catalog order: "municipal corp"
        // (water) beats "municipal" (property) only by length; the bare word
        // resolves to the property provider.
        assert_eq!(
            classify_text("municipal corp", &catalog),
            TextIntent::SelectProvider(ServiceKind::Water, "Municipal Corp".to_string())
        );
        assert_eq!(
            classify_text("municipal", &catalog),
            TextIntent::SelectProvider(ServiceKind::Property, "Municipal".to_string())
        );
    }

    #[test]
    fn command_words_match_exactly_not_as_substrings() {
        let catalog = catalog();
        assert_eq!(classify_text("  RESTART ", &catalog), TextIntent::Restart);
        assert_eq!(classify_text("Yes", &catalog), TextIntent::Confirm);
        assert_eq!(classify_text("no", &catalog), TextIntent::Deny);
        // Embedded in a sentence they are ordinary text.
        assert_eq!(
            classify_text("please restart my connection", &catalog),
            TextIntent::Free
        );
    }

    #[test]
    fn button_payloads_parse() {
        assert_eq!(
            parse_button("service_gas"),
            ButtonAction::Service("gas".to_string())
        );
        assert_eq!(
            parse_button("provider_Gujarat_Gas"),
            ButtonAction::Provider("Gujarat Gas".to_string())
        );
        assert_eq!(parse_button("confirm"), ButtonAction::Confirm);
        assert_eq!(parse_button("restart"), ButtonAction::Restart);
        assert_eq!(
            parse_button("garbage"),
            ButtonAction::Unknown("garbage".to_string())
        );
    }

    proptest::proptest! {
        // Classification must never panic, whatever the text contains.
        #[test]
        fn classify_text_total(text in ".*") {
            let _ = classify_text(&text, &ServiceCatalog::default_catalog());
        }

        #[test]
        fn parse_button_total(payload in ".*") {
            let _ = parse_button(&payload);
        }

        // Classification is a pure function: same text, same intent.
        #[test]
        fn classify_text_deterministic(text in ".*") {
            let catalog = ServiceCatalog::default_catalog();
            proptest::prop_assert_eq!(
                classify_text(&text, &catalog),
                classify_text(&text, &catalog)
            );
        }
    }
}
