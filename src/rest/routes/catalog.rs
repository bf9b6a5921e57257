// rest/routes/catalog.rs — read-only supplier directory endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::{ServiceKind, Supplier};
use crate::rest::error::ApiError;
use crate::AppContext;

fn parse_category(category: &str) -> Result<ServiceKind, ApiError> {
    ServiceKind::parse(category)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid category: {category}")))
}

fn suppliers_json(category: ServiceKind, suppliers: &[&Supplier], kind: &str) -> Value {
    json!({
        "category": category.as_str(),
        "type": kind,
        "count": suppliers.len(),
        "suppliers": suppliers,
    })
}

pub async fn categories() -> Json<Value> {
    Json(json!({
        "categories": ServiceKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
    }))
}

pub async fn by_category(
    State(ctx): State<Arc<AppContext>>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_category(&category)?;
    let suppliers: Vec<&Supplier> = ctx.suppliers.category(kind).iter().collect();
    Ok(Json(suppliers_json(kind, &suppliers, "all")))
}

pub async fn online(
    State(ctx): State<Arc<AppContext>>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_category(&category)?;
    let suppliers: Vec<&Supplier> = ctx
        .suppliers
        .category(kind)
        .iter()
        .filter(|s| s.online_available)
        .collect();
    Ok(Json(suppliers_json(kind, &suppliers, "online")))
}

pub async fn automation_enabled(
    State(ctx): State<Arc<AppContext>>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_category(&category)?;
    let suppliers: Vec<&Supplier> = ctx
        .suppliers
        .category(kind)
        .iter()
        .filter(|s| s.automation_enabled)
        .collect();
    Ok(Json(suppliers_json(kind, &suppliers, "automation_enabled")))
}

pub async fn supplier(
    State(ctx): State<Arc<AppContext>>,
    Path(supplier_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (kind, supplier) = ctx
        .suppliers
        .find(&supplier_id)
        .ok_or_else(|| ApiError::NotFound(format!("Supplier '{supplier_id}' not found")))?;
    Ok(Json(json!({
        "category": kind.as_str(),
        "supplier": supplier,
    })))
}

pub async fn search(
    State(ctx): State<Arc<AppContext>>,
    Path(query): Path<String>,
) -> Json<Value> {
    let mut results = serde_json::Map::new();
    for (kind, supplier) in ctx.suppliers.search(&query) {
        results
            .entry(kind.as_str().to_string())
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .expect("entry is an array")
            .push(json!(supplier));
    }
    Json(json!({ "query": query, "results": results }))
}
