//! Grants catalog storage: seeded scheme records, per-user applications,
//! and favorites.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::Storage;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GrantRow {
    pub id: String,
    pub name: String,
    pub name_local: Option<String>,
    pub scheme_number: Option<String>,
    pub category: String,
    pub ministry: String,
    pub level: String,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub amount_display: Option<String>,
    pub description: Option<String>,
    pub objective: Option<String>,
    /// JSON array of benefit strings.
    pub benefits: String,
    /// JSON object of eligibility rules consumed by the scorer.
    pub eligibility_criteria: String,
    pub eligibility_summary: Option<String>,
    /// JSON array of document names.
    pub required_documents: String,
    pub status: String,
    pub application_start_date: Option<String>,
    pub application_end_date: Option<String>,
    pub official_website: Option<String>,
    /// JSON array of tag strings.
    pub tags: String,
    pub priority: i64,
    pub view_count: i64,
    pub application_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GrantApplicationRow {
    pub id: String,
    pub user_id: String,
    pub grant_id: String,
    pub application_number: String,
    pub status: String,
    pub form_data: String,
    pub uploaded_documents: String,
    /// JSON array of `{status, timestamp, description}` entries.
    pub timeline: String,
    pub submitted_at: Option<String>,
    pub created_at: String,
}

/// Filters for the grants listing endpoint. `None` fields are not applied.
#[derive(Debug, Default, Clone)]
pub struct GrantFilter {
    pub category: Option<String>,
    pub ministry: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    /// Keep grants whose `max_amount` is at least this value.
    pub min_amount: Option<f64>,
    /// Keep grants whose `min_amount` is at most this value.
    pub max_amount: Option<f64>,
    /// Case-insensitive substring over name / description / eligibility summary.
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// Everything needed to insert one seeded grant record.
#[derive(Debug, Clone)]
pub struct GrantSeedRecord {
    pub name: String,
    pub name_local: Option<String>,
    pub scheme_number: Option<String>,
    pub category: String,
    pub ministry: String,
    pub level: String,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub amount_display: Option<String>,
    pub description: Option<String>,
    pub objective: Option<String>,
    pub benefits: serde_json::Value,
    pub eligibility_criteria: serde_json::Value,
    pub eligibility_summary: Option<String>,
    pub required_documents: serde_json::Value,
    pub status: String,
    pub application_start_date: Option<String>,
    pub application_end_date: Option<String>,
    pub official_website: Option<String>,
    pub tags: serde_json::Value,
    pub priority: i64,
}

impl Storage {
    pub async fn count_grants(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM grants")
            .fetch_one(&self.pool())
            .await?;
        Ok(count)
    }

    pub async fn insert_grant(&self, seed: &GrantSeedRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO grants (
                id, name, name_local, scheme_number, category, ministry, level,
                min_amount, max_amount, amount_display, description, objective,
                benefits, eligibility_criteria, eligibility_summary, required_documents,
                status, application_start_date, application_end_date, official_website,
                tags, priority
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&seed.name)
        .bind(&seed.name_local)
        .bind(&seed.scheme_number)
        .bind(&seed.category)
        .bind(&seed.ministry)
        .bind(&seed.level)
        .bind(seed.min_amount)
        .bind(seed.max_amount)
        .bind(&seed.amount_display)
        .bind(&seed.description)
        .bind(&seed.objective)
        .bind(seed.benefits.to_string())
        .bind(seed.eligibility_criteria.to_string())
        .bind(&seed.eligibility_summary)
        .bind(seed.required_documents.to_string())
        .bind(&seed.status)
        .bind(&seed.application_start_date)
        .bind(&seed.application_end_date)
        .bind(&seed.official_website)
        .bind(seed.tags.to_string())
        .bind(seed.priority)
        .execute(&self.pool())
        .await
        .context("Failed to insert grant")?;
        Ok(id)
    }

    /// Filtered catalog listing, ordered by priority then status.
    pub async fn list_grants(&self, filter: &GrantFilter) -> Result<Vec<GrantRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM grants WHERE 1 = 1");
        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(ministry) = &filter.ministry {
            qb.push(" AND ministry = ").push_bind(ministry);
        }
        if let Some(level) = &filter.level {
            qb.push(" AND level = ").push_bind(level);
        }
        if let Some(status) = &filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(min) = filter.min_amount {
            qb.push(" AND max_amount >= ").push_bind(min);
        }
        if let Some(max) = filter.max_amount {
            qb.push(" AND min_amount <= ").push_bind(max);
        }
        if let Some(search) = &filter.search {
            let term = format!("%{}%", search.to_lowercase());
            qb.push(" AND (lower(name) LIKE ")
                .push_bind(term.clone())
                .push(" OR lower(coalesce(description, '')) LIKE ")
                .push_bind(term.clone())
                .push(" OR lower(coalesce(eligibility_summary, '')) LIKE ")
                .push_bind(term)
                .push(")");
        }
        qb.push(" ORDER BY priority DESC, status LIMIT ")
            .push_bind(filter.limit.max(1))
            .push(" OFFSET ")
            .push_bind(filter.skip.max(0));

        Ok(qb.build_query_as::<GrantRow>().fetch_all(&self.pool()).await?)
    }

    pub async fn grant_by_id(&self, id: &str) -> Result<Option<GrantRow>> {
        Ok(sqlx::query_as::<_, GrantRow>("SELECT * FROM grants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool())
            .await?)
    }

    pub async fn increment_grant_views(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE grants SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool())
            .await?;
        Ok(())
    }

    /// Category keys with grant counts, in a stable order.
    pub async fn grant_category_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM grants GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool())
        .await?;
        Ok(rows)
    }

    /// True when the user already has a non-rejected application for this grant.
    pub async fn has_active_grant_application(
        &self,
        user_id: &str,
        grant_id: &str,
    ) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM grant_applications
             WHERE user_id = ? AND grant_id = ? AND status != 'rejected'",
        )
        .bind(user_id)
        .bind(grant_id)
        .fetch_one(&self.pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn insert_grant_application(
        &self,
        user_id: &str,
        grant_id: &str,
        application_number: &str,
        form_data: &serde_json::Value,
        uploaded_documents: &serde_json::Value,
    ) -> Result<GrantApplicationRow> {
        let id = Uuid::new_v4().to_string();
        let stamped = Utc::now().to_rfc3339();
        let timeline = serde_json::json!([{
            "status": "submitted",
            "timestamp": stamped,
            "description": "Application submitted successfully"
        }]);
        sqlx::query(
            "INSERT INTO grant_applications (
                id, user_id, grant_id, application_number, status, form_data,
                uploaded_documents, timeline, submitted_at, created_at
             ) VALUES (?, ?, ?, ?, 'submitted', ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(grant_id)
        .bind(application_number)
        .bind(form_data.to_string())
        .bind(uploaded_documents.to_string())
        .bind(timeline.to_string())
        .bind(&stamped)
        .bind(&stamped)
        .execute(&self.pool())
        .await?;

        sqlx::query("UPDATE grants SET application_count = application_count + 1 WHERE id = ?")
            .bind(grant_id)
            .execute(&self.pool())
            .await?;

        let row = sqlx::query_as::<_, GrantApplicationRow>(
            "SELECT * FROM grant_applications WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&self.pool())
        .await?;
        Ok(row)
    }

    pub async fn grant_applications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GrantApplicationRow>> {
        Ok(sqlx::query_as::<_, GrantApplicationRow>(
            "SELECT * FROM grant_applications WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool())
        .await?)
    }

    /// Returns false when the grant was already favorited.
    pub async fn add_grant_favorite(&self, user_id: &str, grant_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO grant_favorites (user_id, grant_id, created_at)
             VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(grant_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_grant_favorite(&self, user_id: &str, grant_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM grant_favorites WHERE user_id = ? AND grant_id = ?")
                .bind(user_id)
                .bind(grant_id)
                .execute(&self.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_seed(name: &str, category: &str, priority: i64) -> GrantSeedRecord {
        GrantSeedRecord {
            name: name.to_string(),
            name_local: None,
            scheme_number: None,
            category: category.to_string(),
            ministry: "DPIIT".to_string(),
            level: "central".to_string(),
            min_amount: Some(500_000.0),
            max_amount: Some(2_000_000.0),
            amount_display: Some("₹5-20 Lakhs".to_string()),
            description: Some("Seed funding for early startups".to_string()),
            objective: None,
            benefits: serde_json::json!(["Seed funding"]),
            eligibility_criteria: serde_json::json!({"business_type": ["startup"]}),
            eligibility_summary: Some("DPIIT recognized startups".to_string()),
            required_documents: serde_json::json!(["Business Plan"]),
            status: "open".to_string(),
            application_start_date: None,
            application_end_date: None,
            official_website: None,
            tags: serde_json::json!(["startup"]),
            priority,
        }
    }

    async fn storage_with_grants() -> (TempDir, Storage, String) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let id = storage
            .insert_grant(&sample_seed("Startup Seed Fund", "startup", 10))
            .await
            .unwrap();
        storage
            .insert_grant(&sample_seed("MSME Upgrade Scheme", "msme", 5))
            .await
            .unwrap();
        (dir, storage, id)
    }

    #[tokio::test]
    async fn list_applies_filters_and_priority_order() {
        let (_dir, storage, _) = storage_with_grants().await;

        let all = storage
            .list_grants(&GrantFilter {
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Startup Seed Fund"); // priority 10 first

        let msme = storage
            .list_grants(&GrantFilter {
                category: Some("msme".to_string()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(msme.len(), 1);

        let searched = storage
            .list_grants(&GrantFilter {
                search: Some("seed funding".to_string()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_application_guard_ignores_rejected() {
        let (_dir, storage, grant_id) = storage_with_grants().await;
        let user = storage
            .create_user("a@b.in", "9876543210", "hash", "Asha", None)
            .await
            .unwrap();

        assert!(!storage
            .has_active_grant_application(&user.id, &grant_id)
            .await
            .unwrap());

        storage
            .insert_grant_application(
                &user.id,
                &grant_id,
                "GA2025010112345",
                &serde_json::json!({}),
                &serde_json::json!([]),
            )
            .await
            .unwrap();

        assert!(storage
            .has_active_grant_application(&user.id, &grant_id)
            .await
            .unwrap());

        let grant = storage.grant_by_id(&grant_id).await.unwrap().unwrap();
        assert_eq!(grant.application_count, 1);
    }

    #[tokio::test]
    async fn favorites_are_idempotent() {
        let (_dir, storage, grant_id) = storage_with_grants().await;
        let user = storage
            .create_user("a@b.in", "9876543210", "hash", "Asha", None)
            .await
            .unwrap();

        assert!(storage.add_grant_favorite(&user.id, &grant_id).await.unwrap());
        assert!(!storage.add_grant_favorite(&user.id, &grant_id).await.unwrap());
        assert!(storage
            .remove_grant_favorite(&user.id, &grant_id)
            .await
            .unwrap());
        assert!(!storage
            .remove_grant_favorite(&user.id, &grant_id)
            .await
            .unwrap());
    }
}
