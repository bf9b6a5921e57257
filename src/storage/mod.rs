pub mod grants;

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

use crate::catalog::ServiceKind;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the portal indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ─── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub mobile: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub aadhaar_number: Option<String>,
    pub pan_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub date_of_birth: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub user_id: String,
    pub doc_type: String,
    pub file_name: String,
    pub stored_path: String,
    /// JSON object of OCR-extracted fields. Empty object when no extraction ran.
    pub extracted_data: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UtilityAccountRow {
    pub id: String,
    pub user_id: String,
    /// One of `gas` | `electricity` | `water` | `property`.
    pub service: String,
    pub provider: String,
    pub consumer_name: String,
    /// JSON object of service-specific fields (service_number, bp_number, …).
    pub details: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApplicationRow {
    pub id: String,
    pub user_id: String,
    pub service: String,
    pub application_type: String,
    /// `draft` | `pending` | `submitted` | `processing` | `completed` | `rejected`.
    pub status: String,
    pub form_data: String,
    pub external_reference: Option<String>,
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub aadhaar_number: Option<String>,
    pub pan_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub date_of_birth: Option<String>,
}

// ─── Storage ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("sevad.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── Users ────────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        email: &str,
        mobile: &str,
        hashed_password: &str,
        full_name: &str,
        city: Option<&str>,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let created_at = now();
        with_timeout(async {
            sqlx::query(
                "INSERT INTO users (id, email, mobile, hashed_password, full_name, city, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(email)
            .bind(mobile)
            .bind(hashed_password)
            .bind(full_name)
            .bind(city)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .context("Failed to insert user")?;
            Ok(())
        })
        .await?;
        self.user_by_id(&id)
            .await?
            .context("user vanished after insert")
    }

    pub async fn user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?)
        })
        .await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn user_by_mobile(&self, mobile: &str) -> Result<Option<UserRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE mobile = ?")
                    .bind(mobile)
                    .fetch_optional(&self.pool)
                    .await?,
            )
        })
        .await
    }

    /// Apply a partial profile update; unset fields keep their stored value.
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRow> {
        with_timeout(async {
            sqlx::query(
                "UPDATE users SET
                    full_name      = COALESCE(?, full_name),
                    aadhaar_number = COALESCE(?, aadhaar_number),
                    pan_number     = COALESCE(?, pan_number),
                    address        = COALESCE(?, address),
                    city           = COALESCE(?, city),
                    state          = COALESCE(?, state),
                    pincode        = COALESCE(?, pincode),
                    date_of_birth  = COALESCE(?, date_of_birth),
                    updated_at     = ?
                 WHERE id = ?",
            )
            .bind(&update.full_name)
            .bind(&update.aadhaar_number)
            .bind(&update.pan_number)
            .bind(&update.address)
            .bind(&update.city)
            .bind(&update.state)
            .bind(&update.pincode)
            .bind(&update.date_of_birth)
            .bind(now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;
        self.user_by_id(user_id)
            .await?
            .context("user not found after profile update")
    }

    // ─── Documents ────────────────────────────────────────────────────────────

    pub async fn insert_document(
        &self,
        user_id: &str,
        doc_type: &str,
        file_name: &str,
        stored_path: &str,
        extracted_data: &serde_json::Value,
    ) -> Result<DocumentRow> {
        let id = Uuid::new_v4().to_string();
        with_timeout(async {
            sqlx::query(
                "INSERT INTO documents (id, user_id, doc_type, file_name, stored_path, extracted_data, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(user_id)
            .bind(doc_type)
            .bind(file_name)
            .bind(stored_path)
            .bind(extracted_data.to_string())
            .bind(now())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;
        self.document_by_id(user_id, &id)
            .await?
            .context("document vanished after insert")
    }

    pub async fn documents_for_user(&self, user_id: &str) -> Result<Vec<DocumentRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, DocumentRow>(
                "SELECT * FROM documents WHERE user_id = ? ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn document_by_id(&self, user_id: &str, id: &str) -> Result<Option<DocumentRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, DocumentRow>(
                "SELECT * FROM documents WHERE id = ? AND user_id = ?",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await
    }

    /// Most recent document of `doc_type` for autofill.
    pub async fn latest_document_of_type(
        &self,
        user_id: &str,
        doc_type: &str,
    ) -> Result<Option<DocumentRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, DocumentRow>(
                "SELECT * FROM documents WHERE user_id = ? AND doc_type = ?
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(user_id)
            .bind(doc_type)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn delete_document(&self, user_id: &str, id: &str) -> Result<bool> {
        with_timeout(async {
            let result = sqlx::query("DELETE FROM documents WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    // ─── Utility accounts ─────────────────────────────────────────────────────

    pub async fn insert_account(
        &self,
        user_id: &str,
        service: ServiceKind,
        provider: &str,
        consumer_name: &str,
        details: &serde_json::Value,
    ) -> Result<UtilityAccountRow> {
        let id = Uuid::new_v4().to_string();
        with_timeout(async {
            sqlx::query(
                "INSERT INTO utility_accounts (id, user_id, service, provider, consumer_name, details, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(user_id)
            .bind(service.as_str())
            .bind(provider)
            .bind(consumer_name)
            .bind(details.to_string())
            .bind(now())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;
        self.account_by_id(user_id, &id)
            .await?
            .context("account vanished after insert")
    }

    pub async fn accounts_for_user(
        &self,
        user_id: &str,
        service: Option<ServiceKind>,
    ) -> Result<Vec<UtilityAccountRow>> {
        with_timeout(async {
            let rows = match service {
                Some(kind) => {
                    sqlx::query_as::<_, UtilityAccountRow>(
                        "SELECT * FROM utility_accounts WHERE user_id = ? AND service = ?
                         ORDER BY created_at",
                    )
                    .bind(user_id)
                    .bind(kind.as_str())
                    .fetch_all(&self.pool)
                    .await?
                }
                None => {
                    sqlx::query_as::<_, UtilityAccountRow>(
                        "SELECT * FROM utility_accounts WHERE user_id = ? ORDER BY created_at",
                    )
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        })
        .await
    }

    pub async fn account_by_id(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<UtilityAccountRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, UtilityAccountRow>(
                "SELECT * FROM utility_accounts WHERE id = ? AND user_id = ?",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn delete_account(&self, user_id: &str, id: &str) -> Result<bool> {
        with_timeout(async {
            let result = sqlx::query("DELETE FROM utility_accounts WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    // ─── Applications ─────────────────────────────────────────────────────────

    pub async fn insert_application(
        &self,
        user_id: &str,
        service: ServiceKind,
        application_type: &str,
        form_data: &serde_json::Value,
    ) -> Result<ApplicationRow> {
        let id = Uuid::new_v4().to_string();
        with_timeout(async {
            sqlx::query(
                "INSERT INTO applications (id, user_id, service, application_type, status, form_data, created_at)
                 VALUES (?, ?, ?, ?, 'draft', ?, ?)",
            )
            .bind(&id)
            .bind(user_id)
            .bind(service.as_str())
            .bind(application_type)
            .bind(form_data.to_string())
            .bind(now())
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;
        self.application_by_id(user_id, &id)
            .await?
            .context("application vanished after insert")
    }

    pub async fn applications_for_user(&self, user_id: &str) -> Result<Vec<ApplicationRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, ApplicationRow>(
                "SELECT * FROM applications WHERE user_id = ? ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn application_by_id(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<ApplicationRow>> {
        with_timeout(async {
            Ok(sqlx::query_as::<_, ApplicationRow>(
                "SELECT * FROM applications WHERE id = ? AND user_id = ?",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await
    }

    /// Move a draft application to `pending` and stamp `submitted_at`.
    pub async fn mark_application_submitted(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<ApplicationRow>> {
        let stamped = now();
        with_timeout(async {
            sqlx::query(
                "UPDATE applications SET status = 'pending', submitted_at = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
            )
            .bind(&stamped)
            .bind(&stamped)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await?;
        self.application_by_id(user_id, id).await
    }
}
