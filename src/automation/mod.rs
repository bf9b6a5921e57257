//! Provider "automation" stubs.
//!
//! These endpoints deliberately perform no real submission: they validate the
//! form, fabricate a confirmation number, and echo the submitted data in the
//! shape a real integration would return. The response shape is the contract;
//! everything behind it is simulated.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Fixed prefix plus 8 random digits, e.g. `TP48201734`.
pub fn confirmation_number(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let digits: u32 = rng.gen_range(0..100_000_000);
    format!("{prefix}{digits:08}")
}

#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub message: String,
    pub application_number: String,
    pub provider: &'static str,
    pub service_type: &'static str,
    pub application_type: &'static str,
    pub estimated_processing_time: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    pub submitted_data: serde_json::Value,
}

/// Reject empty required fields with the original's message shape.
fn require_fields(fields: &[(&str, &str)]) -> Result<(), String> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Missing required fields: {}", missing.join(", ")))
    }
}

// ─── Torrent Power ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentPowerNameChange {
    pub city: String,
    pub service_number: String,
    pub t_number: String,
    pub mobile: String,
    pub email: String,
    pub confirm_email: String,
}

pub fn submit_torrent_power_name_change(
    form: &TorrentPowerNameChange,
) -> Result<SubmissionOutcome, String> {
    require_fields(&[
        ("city", &form.city),
        ("serviceNumber", &form.service_number),
        ("tNumber", &form.t_number),
        ("mobile", &form.mobile),
        ("email", &form.email),
    ])?;

    let number = confirmation_number("TP");
    info!(service_number = %form.service_number, application = %number,
        "torrent power stub submission");

    Ok(SubmissionOutcome {
        success: true,
        message: "Application submitted successfully to Torrent Power".to_string(),
        tracking_url: Some(format!("https://connect.torrentpower.com/track/{number}")),
        application_number: number,
        provider: "Torrent Power",
        service_type: "electricity",
        application_type: "name_change",
        estimated_processing_time: "5-10 business days",
        submitted_data: json!({
            "city": form.city,
            "service_number": form.service_number,
            "t_number": form.t_number,
            "mobile": form.mobile,
            "email": form.email,
        }),
    })
}

// ─── Gujarat Gas ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasNameChange {
    pub current_name: String,
    pub new_name: String,
    pub connection_number: String,
    pub mobile: String,
    #[serde(default)]
    pub aadhaar_number: Option<String>,
}

pub fn submit_gujarat_gas_name_change(form: &GasNameChange) -> Result<SubmissionOutcome, String> {
    require_fields(&[
        ("currentName", &form.current_name),
        ("newName", &form.new_name),
        ("connectionNumber", &form.connection_number),
        ("mobile", &form.mobile),
    ])?;

    let number = confirmation_number("GG");
    info!(connection = %form.connection_number, application = %number,
        "gujarat gas stub submission");

    Ok(SubmissionOutcome {
        success: true,
        message: "Application submitted successfully to Gujarat Gas".to_string(),
        tracking_url: Some(format!("https://gujaratgas.com/track/{number}")),
        application_number: number,
        provider: "Gujarat Gas Ltd",
        service_type: "gas",
        application_type: "name_change",
        estimated_processing_time: "10-20 business days",
        submitted_data: json!({
            "current_name": form.current_name,
            "new_name": form.new_name,
            "connection_number": form.connection_number,
            "mobile": form.mobile,
        }),
    })
}

// ─── Water Department ─────────────────────────────────────────────────────────

pub fn submit_water_name_change(form: &GasNameChange) -> Result<SubmissionOutcome, String> {
    require_fields(&[
        ("currentName", &form.current_name),
        ("newName", &form.new_name),
        ("connectionNumber", &form.connection_number),
        ("mobile", &form.mobile),
    ])?;

    let number = confirmation_number("WD");
    info!(connection = %form.connection_number, application = %number,
        "water department stub submission");

    Ok(SubmissionOutcome {
        success: true,
        message: "Application submitted successfully to Water Department".to_string(),
        tracking_url: None,
        application_number: number,
        provider: "AMC Water Department",
        service_type: "water",
        application_type: "name_change",
        estimated_processing_time: "15-30 business days",
        submitted_data: json!({
            "current_name": form.current_name,
            "new_name": form.new_name,
            "connection_number": form.connection_number,
            "mobile": form.mobile,
        }),
    })
}
