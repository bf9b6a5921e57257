// rest/routes/accounts.rs — utility account CRUD, scoped to the current user.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::catalog::ServiceKind;
use crate::rest::error::ApiError;
use crate::rest::routes::users::account_json;
use crate::AppContext;

fn parse_service(service: &str) -> Result<ServiceKind, ApiError> {
    ServiceKind::parse(service)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid service category: {service}")))
}

#[derive(Debug, Deserialize)]
pub struct AccountCreate {
    pub provider: String,
    pub consumer_name: String,
    /// Service-specific fields (service_number, bp_number, connection_id, …).
    #[serde(default)]
    pub details: Value,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Path(service): Path<String>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AccountCreate>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_service(&service)?;
    if body.provider.trim().is_empty() {
        return Err(ApiError::BadRequest("Provider is required".to_string()));
    }
    if body.consumer_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Consumer name is required".to_string()));
    }
    let details = if body.details.is_null() {
        json!({})
    } else {
        body.details
    };

    let account = ctx
        .storage
        .insert_account(
            &user.id,
            kind,
            body.provider.trim(),
            body.consumer_name.trim(),
            &details,
        )
        .await?;
    Ok(Json(account_json(&account)))
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Path(service): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_service(&service)?;
    let accounts = ctx.storage.accounts_for_user(&user.id, Some(kind)).await?;
    let list: Vec<Value> = accounts.iter().map(account_json).collect();
    Ok(Json(json!({
        "service": kind.as_str(),
        "count": list.len(),
        "accounts": list,
    })))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path((service, id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    parse_service(&service)?;
    if ctx.storage.delete_account(&user.id, &id).await? {
        Ok(Json(json!({ "message": "Account deleted" })))
    } else {
        Err(ApiError::NotFound("Account not found".to_string()))
    }
}
