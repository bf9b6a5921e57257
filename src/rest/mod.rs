// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging the portal services: auth, profile, utility
// accounts, documents, applications, grants, automation stubs, the supplier
// catalog, and the WhatsApp webhook.

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::AppContext;

pub async fn start_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.config.cors_origins);

    Router::new()
        // Root + health (no auth)
        .route("/", get(index))
        .route("/health", get(routes::health::health))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Users
        .route("/api/users/profile", put(routes::users::update_profile))
        .route("/api/users/autofill-data", get(routes::users::autofill_data))
        // Utility accounts
        .route(
            "/api/services/{service}/accounts",
            get(routes::accounts::list).post(routes::accounts::create),
        )
        .route(
            "/api/services/{service}/accounts/{id}",
            delete(routes::accounts::remove),
        )
        // Documents
        .route("/api/documents/upload", post(routes::documents::upload))
        .route("/api/documents", get(routes::documents::list))
        .route(
            "/api/documents/autofill/{doc_type}",
            get(routes::documents::autofill),
        )
        .route(
            "/api/documents/{id}",
            get(routes::documents::get_one).delete(routes::documents::remove),
        )
        // Applications
        .route(
            "/api/applications",
            get(routes::applications::list).post(routes::applications::create),
        )
        .route(
            "/api/applications/prefill/{service}/{application_type}",
            get(routes::applications::prefill),
        )
        .route("/api/applications/{id}", get(routes::applications::get_one))
        .route(
            "/api/applications/{id}/submit",
            post(routes::applications::submit),
        )
        // Grants
        .route("/api/grants", get(routes::grants::list))
        .route(
            "/api/grants/categories/list",
            get(routes::grants::categories),
        )
        .route(
            "/api/grants/check-eligibility",
            post(routes::grants::check_eligibility),
        )
        .route("/api/grants/apply", post(routes::grants::apply))
        .route(
            "/api/grants/applications/my",
            get(routes::grants::my_applications),
        )
        .route(
            "/api/grants/favorites/{grant_id}",
            post(routes::grants::add_favorite).delete(routes::grants::remove_favorite),
        )
        .route("/api/grants/{id}", get(routes::grants::detail))
        // Automation stubs
        .route(
            "/api/automation/torrent-power/name-change",
            post(routes::automation::torrent_power_name_change),
        )
        .route(
            "/api/automation/gujarat-gas/name-change",
            post(routes::automation::gujarat_gas_name_change),
        )
        .route(
            "/api/automation/water/name-change",
            post(routes::automation::water_name_change),
        )
        .route("/api/automation/health", get(routes::automation::health))
        // Supplier catalog
        .route("/api/catalog/categories", get(routes::catalog::categories))
        .route(
            "/api/catalog/supplier/{supplier_id}",
            get(routes::catalog::supplier),
        )
        .route("/api/catalog/search/{query}", get(routes::catalog::search))
        .route("/api/catalog/{category}", get(routes::catalog::by_category))
        .route(
            "/api/catalog/{category}/online",
            get(routes::catalog::online),
        )
        .route(
            "/api/catalog/{category}/automation",
            get(routes::catalog::automation_enabled),
        )
        // WhatsApp webhook + status probe
        .route(
            "/api/whatsapp/webhook",
            get(routes::whatsapp::verify).post(routes::whatsapp::webhook),
        )
        .route("/api/whatsapp/status", get(routes::whatsapp::status))
        .layer(cors)
        .with_state(ctx)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Seva Citizen Services Portal",
        "services": ["Electricity", "Gas", "Water", "Property"],
        "docs": "/docs",
    }))
}
