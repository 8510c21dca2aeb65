use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use ember_types::api::{MeResponse, UserProfileResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Claims;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let id = claims.sub;
    let row = blocking(move || Ok(state.db.get_user_by_id(&id.to_string())?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;

    Ok(Json(MeResponse::from(row.into_model())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let viewer = claims.sub;
    let (row, relationship) = blocking(move || {
        let Some(row) = state.db.get_user_by_id(&user_id.to_string())? else {
            return Err(ApiError::NotFound(format!("user {user_id}")));
        };
        let relationship = state.relationships.relationship(viewer, user_id)?;
        Ok((row, relationship))
    })
    .await?;

    let user = row.into_model();
    Ok(Json(UserProfileResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        bio: user.bio,
        relationship,
    }))
}
