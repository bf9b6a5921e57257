// rest/routes/grants.rs — grants catalog, eligibility scoring, applications,
// and favorites.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::grants::eligibility::{evaluate, EligibilityRequest};
use crate::rest::error::ApiError;
use crate::storage::grants::{GrantFilter, GrantRow};
use crate::AppContext;

fn json_field(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

fn grant_json(grant: &GrantRow) -> Value {
    json!({
        "id": grant.id,
        "name": grant.name,
        "name_local": grant.name_local,
        "scheme_number": grant.scheme_number,
        "category": grant.category,
        "ministry": grant.ministry,
        "level": grant.level,
        "min_amount": grant.min_amount,
        "max_amount": grant.max_amount,
        "amount_display": grant.amount_display,
        "description": grant.description,
        "eligibility_summary": grant.eligibility_summary,
        "status": grant.status,
        "application_end_date": grant.application_end_date,
        "tags": json_field(&grant.tags),
        "priority": grant.priority,
        "view_count": grant.view_count,
        "application_count": grant.application_count,
    })
}

fn grant_detail_json(grant: &GrantRow) -> Value {
    let mut body = grant_json(grant);
    let map = body.as_object_mut().expect("grant json is an object");
    map.insert("objective".to_string(), json!(grant.objective));
    map.insert("benefits".to_string(), json_field(&grant.benefits));
    map.insert(
        "eligibility_criteria".to_string(),
        json_field(&grant.eligibility_criteria),
    );
    map.insert(
        "required_documents".to_string(),
        json_field(&grant.required_documents),
    );
    map.insert(
        "application_start_date".to_string(),
        json!(grant.application_start_date),
    );
    map.insert(
        "official_website".to_string(),
        json!(grant.official_website),
    );
    body
}

#[derive(Debug, Deserialize)]
pub struct GrantListQuery {
    pub category: Option<String>,
    pub ministry: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub search: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<GrantListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = GrantFilter {
        category: query.category,
        ministry: query.ministry,
        level: query.level,
        status: query.status,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        search: query.search,
        skip: query.skip,
        limit: query.limit.clamp(1, 200),
    };
    let grants = ctx.storage.list_grants(&filter).await?;
    let list: Vec<Value> = grants.iter().map(grant_json).collect();
    Ok(Json(json!({ "grants": list })))
}

pub async fn detail(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let grant = ctx
        .storage
        .grant_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Grant not found".to_string()))?;
    ctx.storage.increment_grant_views(&id).await?;
    Ok(Json(grant_detail_json(&grant)))
}

pub async fn categories(State(ctx): State<Arc<AppContext>>) -> Result<Json<Value>, ApiError> {
    let counts = ctx.storage.grant_category_counts().await?;
    let list: Vec<Value> = counts
        .iter()
        .map(|(category, count)| json!({ "value": category, "count": count }))
        .collect();
    Ok(Json(json!({ "categories": list })))
}

#[derive(Debug, Deserialize)]
pub struct EligibilityCheckRequest {
    pub grant_id: String,
    #[serde(flatten)]
    pub answers: EligibilityRequest,
}

pub async fn check_eligibility(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(_user): CurrentUser,
    Json(body): Json<EligibilityCheckRequest>,
) -> Result<Json<Value>, ApiError> {
    let grant = ctx
        .storage
        .grant_by_id(&body.grant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Grant not found".to_string()))?;
    let criteria = json_field(&grant.eligibility_criteria);
    let report = evaluate(&criteria, &body.answers);
    Ok(Json(serde_json::to_value(report).map_err(anyhow::Error::from)?))
}

#[derive(Debug, Deserialize)]
pub struct GrantApplicationRequest {
    pub grant_id: String,
    #[serde(default)]
    pub form_data: Value,
    #[serde(default)]
    pub uploaded_documents: Vec<String>,
}

pub async fn apply(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<GrantApplicationRequest>,
) -> Result<Json<Value>, ApiError> {
    let grant = ctx
        .storage
        .grant_by_id(&body.grant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Grant not found".to_string()))?;

    if ctx
        .storage
        .has_active_grant_application(&user.id, &grant.id)
        .await?
    {
        return Err(ApiError::BadRequest(
            "You have already applied for this grant".to_string(),
        ));
    }

    let form_data = if body.form_data.is_null() {
        json!({})
    } else {
        body.form_data
    };
    let number = crate::grants::application_number(Utc::now());
    let application = ctx
        .storage
        .insert_grant_application(
            &user.id,
            &grant.id,
            &number,
            &form_data,
            &json!(body.uploaded_documents),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "application_number": application.application_number,
        "message": "Application submitted successfully",
        "application_id": application.id,
    })))
}

pub async fn my_applications(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let applications = ctx.storage.grant_applications_for_user(&user.id).await?;
    let mut list = Vec::with_capacity(applications.len());
    for app in &applications {
        let grant = ctx.storage.grant_by_id(&app.grant_id).await?;
        list.push(json!({
            "id": app.id,
            "application_number": app.application_number,
            "grant_name": grant.as_ref().map(|g| g.name.clone()).unwrap_or_else(|| "Unknown".to_string()),
            "grant_amount": grant.as_ref().and_then(|g| g.amount_display.clone()),
            "status": app.status,
            "submitted_at": app.submitted_at,
            "timeline": json_field(&app.timeline),
        }));
    }
    Ok(Json(json!({ "applications": list })))
}

pub async fn add_favorite(
    State(ctx): State<Arc<AppContext>>,
    Path(grant_id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    ctx.storage
        .grant_by_id(&grant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Grant not found".to_string()))?;
    let added = ctx.storage.add_grant_favorite(&user.id, &grant_id).await?;
    let message = if added {
        "Added to favorites"
    } else {
        "Already in favorites"
    };
    Ok(Json(json!({ "message": message })))
}

pub async fn remove_favorite(
    State(ctx): State<Arc<AppContext>>,
    Path(grant_id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    if ctx
        .storage
        .remove_grant_favorite(&user.id, &grant_id)
        .await?
    {
        Ok(Json(json!({ "message": "Removed from favorites" })))
    } else {
        Err(ApiError::NotFound("Not in favorites".to_string()))
    }
}
