use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use ember_core::NewPin;
use ember_types::api::{CreatePinRequest, PinListResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::middleware::Claims;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub longitude: f64,
    pub latitude: f64,
    pub radius_km: f64,
}

// POST /pins
pub async fn create_pin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePinRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = NewPin {
        emotion: req.emotion,
        message: req.message,
        longitude: req.longitude,
        latitude: req.latitude,
        visibility: req.visibility,
        expires_at: req.expires_at,
    };
    let pin = blocking(move || Ok(state.pins.create_pin(claims.sub, new)?)).await?;

    Ok((StatusCode::CREATED, Json(pin)))
}

// GET /pins/me
pub async fn my_pins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let pins = blocking(move || Ok(state.pins.query_own_pins(claims.sub)?)).await?;
    Ok(Json(PinListResponse { pins }))
}

// GET /pins/friends
pub async fn friend_pins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let pins = blocking(move || Ok(state.pins.query_friend_pins(claims.sub)?)).await?;
    Ok(Json(PinListResponse { pins }))
}

// GET /pins/nearby?longitude=..&latitude=..&radius_km=..
pub async fn nearby_pins(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let pins = blocking(move || {
        Ok(state
            .pins
            .query_nearby_pins(claims.sub, query.longitude, query.latitude, query.radius_km)?)
    })
    .await?;
    Ok(Json(PinListResponse { pins }))
}
