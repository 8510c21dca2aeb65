use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use ember_types::api::{
    FriendRequestEntry, FriendRequestsResponse, FriendsResponse, UpdateFriendRequest,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Claims;

// GET /friends
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let friends = blocking(move || Ok(state.relationships.list_friends(claims.sub)?)).await?;

    Ok(Json(FriendsResponse {
        friends: friends.into_iter().map(Into::into).collect(),
    }))
}

// DELETE /friends/{friend_id}
pub async fn delete_friend(
    State(state): State<AppState>,
    Path(friend_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let removed =
        blocking(move || Ok(state.relationships.delete_friendship(claims.sub, friend_id)?)).await?;

    if !removed {
        return Err(ApiError::NotFound("friend does not exist".into()));
    }
    Ok(Json(json!({ "removed": true })))
}

// GET /friends/requests
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let requests =
        blocking(move || Ok(state.relationships.list_friend_requests(claims.sub)?)).await?;

    Ok(Json(FriendRequestsResponse {
        incoming_requests: requests.incoming.into_iter().map(FriendRequestEntry::from).collect(),
        outgoing_requests: requests.outgoing.into_iter().map(FriendRequestEntry::from).collect(),
    }))
}

// POST /friends/requests/{friend_id}
pub async fn send_request(
    State(state): State<AppState>,
    Path(friend_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let created = blocking(move || {
        Ok(state.relationships.create_friend_request(claims.sub, friend_id)?)
    })
    .await?;

    if !created {
        return Err(ApiError::Conflict("friendship already exists or is pending".into()));
    }
    Ok((StatusCode::CREATED, Json(json!({ "created": true }))))
}

// PATCH /friends/requests/{friend_id}
pub async fn update_request(
    State(state): State<AppState>,
    Path(friend_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateFriendRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller = claims.sub;

    let (done, body) = match req.status.as_str() {
        "accepted" => {
            let accepted = blocking(move || {
                Ok(state.relationships.accept_friend_request(caller, friend_id)?)
            })
            .await?;
            (accepted, json!({ "accepted": true }))
        }
        "rejected" => {
            let rejected = blocking(move || {
                Ok(state.relationships.reject_friend_request(caller, friend_id)?)
            })
            .await?;
            (rejected, json!({ "rejected": true }))
        }
        other => return Err(ApiError::BadRequest(format!("unsupported status '{other}'"))),
    };

    if !done {
        return Err(ApiError::NotFound("no pending friend request from this user".into()));
    }
    Ok(Json(body))
}
