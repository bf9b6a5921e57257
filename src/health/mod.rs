// SPDX-License-Identifier: MIT
//! Health checks for the `/health` endpoint.
//!
//! Each check implements the [`SystemHealthCheck`] trait and reports whether a
//! subsystem is healthy, degraded, or unavailable.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

/// Severity level reported by a health check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// The subsystem is operating normally.
    Ok,
    /// The subsystem is functional but degraded.
    Degraded,
    /// The subsystem is unavailable or critically broken.
    Critical,
}

impl CheckStatus {
    /// Returns the worst (highest-severity) of two statuses.
    pub fn worst(a: CheckStatus, b: CheckStatus) -> CheckStatus {
        match (&a, &b) {
            (CheckStatus::Critical, _) | (_, CheckStatus::Critical) => CheckStatus::Critical,
            (CheckStatus::Degraded, _) | (_, CheckStatus::Degraded) => CheckStatus::Degraded,
            _ => CheckStatus::Ok,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "ok"),
            CheckStatus::Degraded => write!(f, "degraded"),
            CheckStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Result of running a single health check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    /// Machine-readable name of this check (e.g., `"database"`).
    pub name: String,
    /// Human-readable message describing the result.
    pub message: String,
    pub status: CheckStatus,
    /// ISO-8601 timestamp when the check was run.
    pub checked_at: String,
    /// Optional latency measurement in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckResult {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            status: CheckStatus::Ok,
            checked_at: Utc::now().to_rfc3339(),
            latency_ms: None,
        }
    }

    fn ok_with_latency(
        name: impl Into<String>,
        message: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            ..Self::ok(name, message)
        }
    }

    fn critical(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            status: CheckStatus::Critical,
            checked_at: Utc::now().to_rfc3339(),
            latency_ms: None,
        }
    }
}

/// Async health check trait.
#[async_trait]
pub trait SystemHealthCheck: Send + Sync {
    async fn run(&self) -> CheckResult;
}

// ─── Database check ───────────────────────────────────────────────────────────

/// Checks that the SQLite pool can execute a simple query.
pub struct DatabaseHealthCheck {
    pool: SqlitePool,
}

impl DatabaseHealthCheck {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemHealthCheck for DatabaseHealthCheck {
    async fn run(&self) -> CheckResult {
        let start = std::time::Instant::now();
        let result: Result<(i64,), sqlx::Error> =
            sqlx::query_as("SELECT 1").fetch_one(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => CheckResult::ok_with_latency(
                "database",
                format!("SQLite reachable ({latency_ms}ms)"),
                latency_ms,
            ),
            Err(e) => CheckResult::critical("database", format!("SQLite query failed: {e}")),
        }
    }
}

// ─── Uploads check ────────────────────────────────────────────────────────────

/// Checks that the uploads directory exists and is writable.
pub struct UploadsHealthCheck {
    uploads_dir: PathBuf,
}

impl UploadsHealthCheck {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    fn is_writable(path: &Path) -> bool {
        // Attempt to create a temporary file in the directory.
        let probe = path.join(".health_probe");
        match std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&probe)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
                true
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl SystemHealthCheck for UploadsHealthCheck {
    async fn run(&self) -> CheckResult {
        let path = self.uploads_dir.clone();
        // Run the blocking FS operations on a thread pool thread.
        let result = tokio::task::spawn_blocking(move || {
            if !path.exists() {
                std::fs::create_dir_all(&path)
                    .map_err(|e| format!("uploads dir cannot be created: {e}"))?;
            }
            if !Self::is_writable(&path) {
                return Err(format!("uploads dir is not writable: {}", path.display()));
            }
            Ok(path)
        })
        .await;

        match result {
            Ok(Ok(p)) => CheckResult::ok("uploads", format!("uploads dir writable: {}", p.display())),
            Ok(Err(msg)) => CheckResult::critical("uploads", msg),
            Err(e) => CheckResult::critical("uploads", format!("spawn_blocking error: {e}")),
        }
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
pub struct HealthReport {
    pub status: CheckStatus,
    pub checks: Vec<CheckResult>,
}

/// Run every check and fold the worst status.
pub async fn run_checks(checks: &[&dyn SystemHealthCheck]) -> HealthReport {
    let mut results = Vec::with_capacity(checks.len());
    let mut status = CheckStatus::Ok;
    for check in checks {
        let result = check.run().await;
        status = CheckStatus::worst(status, result.status.clone());
        results.push(result);
    }
    HealthReport {
        status,
        checks: results,
    }
}
