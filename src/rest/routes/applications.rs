// rest/routes/applications.rs — draft/submit lifecycle for service applications.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::catalog::ServiceKind;
use crate::rest::error::ApiError;
use crate::storage::ApplicationRow;
use crate::AppContext;

fn application_json(app: &ApplicationRow) -> Value {
    let form_data: Value = serde_json::from_str(&app.form_data).unwrap_or_else(|_| json!({}));
    json!({
        "id": app.id,
        "service_type": app.service,
        "application_type": app.application_type,
        "status": app.status,
        "form_data": form_data,
        "external_reference": app.external_reference,
        "submitted_at": app.submitted_at,
        "created_at": app.created_at,
    })
}

#[derive(Debug, Deserialize)]
pub struct ApplicationCreate {
    pub service_type: ServiceKind,
    pub application_type: String,
    #[serde(default)]
    pub form_data: Value,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ApplicationCreate>,
) -> Result<Json<Value>, ApiError> {
    if body.application_type.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "application_type is required".to_string(),
        ));
    }
    let form_data = if body.form_data.is_null() {
        json!({})
    } else {
        body.form_data
    };
    let app = ctx
        .storage
        .insert_application(
            &user.id,
            body.service_type,
            body.application_type.trim(),
            &form_data,
        )
        .await?;
    Ok(Json(application_json(&app)))
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let apps = ctx.storage.applications_for_user(&user.id).await?;
    let list: Vec<Value> = apps.iter().map(application_json).collect();
    Ok(Json(json!({ "applications": list })))
}

pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let app = ctx
        .storage
        .application_by_id(&user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;
    Ok(Json(application_json(&app)))
}

pub async fn submit(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let app = ctx
        .storage
        .mark_application_submitted(&user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;
    Ok(Json(json!({
        "message": "Application submitted",
        "status": app.status,
    })))
}

/// Merge the profile and the first matching utility account into pre-fill
/// data for one application form.
pub async fn prefill(
    State(ctx): State<Arc<AppContext>>,
    Path((service, _application_type)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let kind = ServiceKind::parse(&service)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid service category: {service}")))?;

    let mut prefill = json!({
        "full_name": user.full_name,
        "email": user.email,
        "mobile": user.mobile,
        "address": user.address,
        "city": user.city,
        "pincode": user.pincode,
        "aadhaar_number": user.aadhaar_number,
        "pan_number": user.pan_number,
    });

    let accounts = ctx.storage.accounts_for_user(&user.id, Some(kind)).await?;
    if let Some(account) = accounts.first() {
        let map = prefill.as_object_mut().expect("prefill is an object");
        map.insert("provider".to_string(), json!(account.provider));
        map.insert("consumer_name".to_string(), json!(account.consumer_name));
        if let Ok(Value::Object(details)) = serde_json::from_str::<Value>(&account.details) {
            map.extend(details);
        }
    }
    Ok(Json(prefill))
}
