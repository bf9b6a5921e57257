// rest/routes/documents.rs — document upload records over the blob store.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::rest::error::ApiError;
use crate::storage::DocumentRow;
use crate::AppContext;

fn document_json(doc: &DocumentRow) -> Value {
    let extracted: Value = serde_json::from_str(&doc.extracted_data).unwrap_or_else(|_| json!({}));
    json!({
        "id": doc.id,
        "doc_type": doc.doc_type,
        "file_name": doc.file_name,
        "stored_path": doc.stored_path,
        "extracted_data": extracted,
        "created_at": doc.created_at,
    })
}

/// Multipart upload: a `document_type` field plus one `file` part.
pub async fn upload(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut doc_type: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("document_type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {e}")))?;
                doc_type = Some(value.trim().to_string());
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload.bin".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed file part: {e}")))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let doc_type = doc_type
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("document_type is required".to_string()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

    let stored_path = ctx
        .documents
        .save(&user.id, &doc_type, &file_name, &bytes)
        .await?;

    // No OCR pipeline is wired up; extracted data stays empty.
    let extracted = json!({});
    let row = ctx
        .storage
        .insert_document(&user.id, &doc_type, &file_name, &stored_path, &extracted)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Document uploaded successfully",
        "document_id": row.id,
        "extracted_data": extracted,
        "file_name": row.file_name,
    })))
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let documents = ctx.storage.documents_for_user(&user.id).await?;
    let list: Vec<Value> = documents.iter().map(document_json).collect();
    Ok(Json(json!({ "documents": list })))
}

pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let document = ctx
        .storage
        .document_by_id(&user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    Ok(Json(document_json(&document)))
}

/// Extracted data of the most recent document of this type.
pub async fn autofill(
    State(ctx): State<Arc<AppContext>>,
    Path(doc_type): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let data = match ctx
        .storage
        .latest_document_of_type(&user.id, &doc_type)
        .await?
    {
        Some(doc) => serde_json::from_str(&doc.extracted_data).unwrap_or_else(|_| json!({})),
        None => json!({}),
    };
    Ok(Json(json!({ "data": data })))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let document = ctx
        .storage
        .document_by_id(&user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    ctx.documents.delete(&document.stored_path).await?;
    ctx.storage.delete_document(&user.id, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Document deleted successfully",
    })))
}
