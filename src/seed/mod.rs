//! First-start data seeding.
//!
//! The grants catalog ships as an embedded JSON file and is loaded into
//! SQLite once; subsequent starts see existing rows and skip. Application
//! windows are stored as offsets in the seed so a freshly seeded catalog
//! always has open schemes.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

use crate::storage::grants::GrantSeedRecord;
use crate::storage::Storage;

#[derive(Debug, Deserialize)]
struct GrantSeedFile {
    grants: Vec<GrantSeedEntry>,
}

#[derive(Debug, Deserialize)]
struct GrantSeedEntry {
    name: String,
    #[serde(default)]
    name_local: Option<String>,
    #[serde(default)]
    scheme_number: Option<String>,
    category: String,
    ministry: String,
    level: String,
    #[serde(default)]
    min_amount: Option<f64>,
    #[serde(default)]
    max_amount: Option<f64>,
    #[serde(default)]
    amount_display: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    objective: Option<String>,
    #[serde(default)]
    benefits: Vec<String>,
    #[serde(default)]
    eligibility_criteria: serde_json::Value,
    #[serde(default)]
    eligibility_summary: Option<String>,
    #[serde(default)]
    required_documents: Vec<String>,
    #[serde(default = "default_status")]
    status: String,
    /// Days relative to seeding time; negative = already started.
    #[serde(default)]
    application_start_offset_days: Option<i64>,
    #[serde(default)]
    application_end_offset_days: Option<i64>,
    #[serde(default)]
    official_website: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    priority: i64,
}

fn default_status() -> String {
    "open".to_string()
}

fn offset_date(offset_days: Option<i64>) -> Option<String> {
    offset_days.map(|days| (Utc::now() + Duration::days(days)).format("%Y-%m-%d").to_string())
}

impl GrantSeedEntry {
    fn into_record(self) -> GrantSeedRecord {
        GrantSeedRecord {
            application_start_date: offset_date(self.application_start_offset_days),
            application_end_date: offset_date(self.application_end_offset_days),
            name: self.name,
            name_local: self.name_local,
            scheme_number: self.scheme_number,
            category: self.category,
            ministry: self.ministry,
            level: self.level,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            amount_display: self.amount_display,
            description: self.description,
            objective: self.objective,
            benefits: serde_json::json!(self.benefits),
            eligibility_criteria: self.eligibility_criteria,
            eligibility_summary: self.eligibility_summary,
            required_documents: serde_json::json!(self.required_documents),
            status: self.status,
            official_website: self.official_website,
            tags: serde_json::json!(self.tags),
            priority: self.priority,
        }
    }
}

/// Seed the grants catalog if the table is empty. Returns the number of
/// inserted records (0 when already seeded).
pub async fn seed_grants(storage: &Storage) -> Result<usize> {
    let existing = storage.count_grants().await?;
    if existing > 0 {
        info!(count = existing, "grants already seeded");
        return Ok(0);
    }

    let file: GrantSeedFile = serde_json::from_str(include_str!("../../data/grants.json"))?;
    let total = file.grants.len();
    for entry in file.grants {
        let record = entry.into_record();
        storage.insert_grant(&record).await?;
    }
    info!(count = total, "seeded grants catalog");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();

        let first = seed_grants(&storage).await.unwrap();
        assert!(first >= 6, "embedded catalog should carry several schemes");

        let second = seed_grants(&storage).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(storage.count_grants().await.unwrap() as usize, first);
    }

    #[tokio::test]
    async fn seeded_windows_are_open() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        seed_grants(&storage).await.unwrap();

        let grants = storage
            .list_grants(&crate::storage::grants::GrantFilter {
                status: Some("open".to_string()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!grants.is_empty());
    }
}
