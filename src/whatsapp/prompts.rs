//! Outbound message bodies for each dialogue state.
//!
//! Plain text only — the transport does not use template messages, so every
//! prompt is rendered here from the catalog.

use crate::catalog::{ServiceCatalog, ServiceEntry};
use crate::whatsapp::session::ChatSession;

pub fn welcome_message(catalog: &ServiceCatalog) -> String {
    let services = catalog
        .entries()
        .iter()
        .map(|e| format!("• {} ({})", e.name, e.name_local))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "🙏 नमस्ते! Welcome to Seva Citizen Services Portal\n\n\
         Apply for name change in your utility connections:\n{services}\n\n\
         Type the service name to continue!"
    )
}

pub fn service_menu(catalog: &ServiceCatalog) -> String {
    let services = catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {} ({})", i + 1, e.name, e.name_local))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "🙏 नमस्ते! Welcome to Seva Citizen Services Portal\n\n\
         Please select a service:\n\n{services}\n\n\
         Type the service name to continue!"
    )
}

pub fn provider_menu(entry: &ServiceEntry) -> String {
    let providers = entry
        .providers
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "✅ You selected: {} ({})\n\n\
         Now select your provider:\n\n{providers}\n\n\
         Type the provider name to continue!",
        entry.name, entry.name_local
    )
}

pub fn form_prompt(provider: &str) -> String {
    format!(
        "✅ You selected: {provider}\n\n\
         Please provide your details for name change:\n\n\
         📝 Enter your:\n\
         • Current Name\n\
         • New Name\n\
         • Consumer ID (if available)\n\n\
         Type your details in one message"
    )
}

pub fn confirmation_summary(entry: &ServiceEntry, session: &ChatSession) -> String {
    let details = session
        .form_data
        .get("user_input")
        .map(String::as_str)
        .unwrap_or("N/A");
    let provider = session.selected_provider.as_deref().unwrap_or("N/A");
    format!(
        "📋 Confirmation Summary:\n\n\
         Service: {} ({})\n\
         Provider: {provider}\n\
         Details: {details}\n\n\
         ✅ Ready to submit?\n\n\
         Type 'YES' to confirm or 'NO' to cancel",
        entry.name, entry.name_local
    )
}

pub fn success_message(tracking_id: &str) -> String {
    format!(
        "✅ Application Submitted Successfully!\n\n\
         📌 Tracking ID: {tracking_id}\n\n\
         Your application for name change has been submitted.\n\n\
         ⏱️ Estimated Processing Time: 5-7 business days\n\n\
         Thank you for using Seva Citizen Services Portal! 🙏"
    )
}

pub fn invalid_service() -> String {
    "❌ Please select a valid service: Gas, Electricity, Water, or Property".to_string()
}

pub fn invalid_provider(providers: &[String]) -> String {
    format!(
        "❌ Please select a valid provider from: {}",
        providers.join(", ")
    )
}

pub fn confirm_reprompt() -> String {
    "Please type 'YES' to confirm or 'NO' to cancel".to_string()
}

pub fn generic_error() -> String {
    "⚠️ Something went wrong — let's start over.".to_string()
}
