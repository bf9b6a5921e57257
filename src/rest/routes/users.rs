// rest/routes/users.rs — profile updates and form auto-fill data.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::catalog::ServiceKind;
use crate::rest::error::ApiError;
use crate::storage::{ProfileUpdate, UserRow, UtilityAccountRow};
use crate::AppContext;

/// Public view of a user row (no password hash).
pub fn user_json(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "mobile": user.mobile,
        "full_name": user.full_name,
        "aadhaar_number": user.aadhaar_number,
        "pan_number": user.pan_number,
        "address": user.address,
        "city": user.city,
        "state": user.state,
        "pincode": user.pincode,
        "date_of_birth": user.date_of_birth,
        "created_at": user.created_at,
    })
}

pub fn account_json(account: &UtilityAccountRow) -> Value {
    let details: Value =
        serde_json::from_str(&account.details).unwrap_or_else(|_| json!({}));
    json!({
        "id": account.id,
        "service": account.service,
        "provider": account.provider,
        "consumer_name": account.consumer_name,
        "details": details,
        "created_at": account.created_at,
    })
}

pub async fn update_profile(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    let updated = ctx.storage.update_profile(&user.id, &update).await?;
    Ok(Json(user_json(&updated)))
}

/// Profile plus all utility accounts, grouped by service, for client-side
/// form auto-fill.
pub async fn autofill_data(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let accounts = ctx.storage.accounts_for_user(&user.id, None).await?;
    let grouped: Value = ServiceKind::ALL
        .iter()
        .map(|kind| {
            let list: Vec<Value> = accounts
                .iter()
                .filter(|a| a.service == kind.as_str())
                .map(account_json)
                .collect();
            (format!("{}_accounts", kind.as_str()), json!(list))
        })
        .collect::<serde_json::Map<String, Value>>()
        .into();

    let mut body = json!({ "user": user_json(&user) });
    if let (Some(map), Value::Object(groups)) = (body.as_object_mut(), grouped) {
        map.extend(groups);
    }
    Ok(Json(body))
}
