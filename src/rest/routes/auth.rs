// rest/routes/auth.rs — registration, login, and the current-user probe.

use axum::extract::State;
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::rest::error::ApiError;
use crate::rest::routes::users::user_json;
use crate::AppContext;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub city: Option<String>,
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = body.email.trim().to_lowercase();
    let mobile = body.mobile.trim().to_string();
    let password = body.password.trim();
    let full_name = body.full_name.trim();

    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if mobile.is_empty() {
        return Err(ApiError::BadRequest("Mobile number is required".to_string()));
    }
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if full_name.is_empty() {
        return Err(ApiError::BadRequest("Full name is required".to_string()));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "Mobile number must be 10 digits".to_string(),
        ));
    }

    if ctx.storage.user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }
    if ctx.storage.user_by_mobile(&mobile).await?.is_some() {
        return Err(ApiError::BadRequest(
            "Mobile number already registered".to_string(),
        ));
    }

    // bcrypt is CPU-bound; keep it off the async worker threads.
    let keys = ctx.auth.clone();
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || keys.hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;

    let user = ctx
        .storage
        .create_user(&email, &mobile, &hashed, full_name, body.city.as_deref())
        .await?;
    Ok(Json(user_json(&user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Clients send either `email` or `username`.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = body
        .email
        .or(body.username)
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email and password required".to_string()))?;
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password required".to_string()));
    }

    let invalid = || ApiError::Unauthorized("Incorrect email or password".to_string());
    let user = ctx.storage.user_by_email(&email).await?.ok_or_else(invalid)?;

    let keys = ctx.auth.clone();
    let hashed = user.hashed_password.clone();
    let verified = tokio::task::spawn_blocking(move || keys.verify_password(&body.password, &hashed))
        .await
        .map_err(anyhow::Error::from)?;
    if !verified {
        return Err(invalid());
    }

    let token = ctx.auth.issue_token(&user.id)?;
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
    })))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(user_json(&user))
}
