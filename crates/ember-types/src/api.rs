use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Pin, RelationshipStatus, User};

// -- JWT Claims --

/// JWT claims issued at login/registration and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub relationship: RelationshipStatus,
}

// -- Friends --

#[derive(Debug, Serialize, Deserialize)]
pub struct Friend {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl From<User> for Friend {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendsResponse {
    pub friends: Vec<Friend>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendRequestEntry {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
}

impl From<User> for FriendRequestEntry {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendRequestsResponse {
    pub incoming_requests: Vec<FriendRequestEntry>,
    pub outgoing_requests: Vec<FriendRequestEntry>,
}

/// Body of `PATCH /friends/requests/{id}`. `status` is `"accepted"` or `"rejected"`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFriendRequest {
    pub status: String,
}

// -- Pins --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePinRequest {
    pub emotion: String,
    #[serde(default)]
    pub message: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    /// Parsed by the pin engine so unknown scopes surface as a domain error.
    pub visibility: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinListResponse {
    pub pins: Vec<Pin>,
}
