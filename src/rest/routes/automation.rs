// rest/routes/automation.rs — stub provider submissions.
//
// No real automation runs behind these endpoints; see crate::automation.

use axum::Json;
use serde_json::{json, Value};

use crate::automation::{
    submit_gujarat_gas_name_change, submit_torrent_power_name_change, submit_water_name_change,
    GasNameChange, TorrentPowerNameChange,
};
use crate::rest::error::ApiError;

pub async fn torrent_power_name_change(
    Json(body): Json<TorrentPowerNameChange>,
) -> Result<Json<Value>, ApiError> {
    if body.email != body.confirm_email {
        return Err(ApiError::BadRequest(
            "Email addresses do not match".to_string(),
        ));
    }
    let outcome = submit_torrent_power_name_change(&body).map_err(ApiError::BadRequest)?;
    Ok(Json(serde_json::to_value(outcome).map_err(anyhow::Error::from)?))
}

pub async fn gujarat_gas_name_change(
    Json(body): Json<GasNameChange>,
) -> Result<Json<Value>, ApiError> {
    let outcome = submit_gujarat_gas_name_change(&body).map_err(ApiError::BadRequest)?;
    Ok(Json(serde_json::to_value(outcome).map_err(anyhow::Error::from)?))
}

pub async fn water_name_change(
    Json(body): Json<GasNameChange>,
) -> Result<Json<Value>, ApiError> {
    let outcome = submit_water_name_change(&body).map_err(ApiError::BadRequest)?;
    Ok(Json(serde_json::to_value(outcome).map_err(anyhow::Error::from)?))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "automation",
        "available_providers": ["torrent-power", "gujarat-gas", "water"],
    }))
}
