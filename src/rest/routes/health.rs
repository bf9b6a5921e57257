// rest/routes/health.rs — portal health report.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::health::{run_checks, DatabaseHealthCheck, HealthReport, SystemHealthCheck, UploadsHealthCheck};
use crate::AppContext;

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<HealthReport> {
    let database = DatabaseHealthCheck::new(ctx.storage.pool());
    let uploads = UploadsHealthCheck::new(ctx.config.uploads_dir.clone());
    let checks: [&dyn SystemHealthCheck; 2] = [&database, &uploads];
    Json(run_checks(&checks).await)
}
