use std::sync::Arc;

use chrono::{DateTime, Utc};
use ember_db::Database;
use ember_db::models::format_timestamp;
use ember_db::pins::NewPinRow;
use ember_types::models::{Pin, Visibility};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::geo::{clamp_radius, validate_point};

/// Caller input for [`Pins::create_pin`].
#[derive(Debug, Clone)]
pub struct NewPin {
    pub emotion: String,
    pub message: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    /// Raw scope name: `public`, `friends` or `private`.
    pub visibility: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Pin storage plus the three visibility-scoped read paths.
///
/// A pin is visible to a requester when it is public, when the requester
/// owns it, or when it is friends-only and the two share an accepted edge.
#[derive(Clone)]
pub struct Pins {
    db: Arc<Database>,
}

impl Pins {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_pin(&self, owner: Uuid, new: NewPin) -> CoreResult<Pin> {
        let visibility: Visibility = new
            .visibility
            .parse()
            .map_err(|_| CoreError::InvalidVisibility(new.visibility.clone()))?;
        let point = validate_point(new.longitude, new.latitude)?;

        // Clients send "" for "no message".
        let message = new.message.as_deref().map(str::trim).filter(|m| !m.is_empty());

        let owner_id = owner.to_string();
        if !self.db.user_exists(&owner_id)? {
            return Err(CoreError::UserNotFound(owner));
        }

        let id = Uuid::new_v4().to_string();
        let expires_at = new.expires_at.map(format_timestamp);
        let row = self.db.insert_pin(&NewPinRow {
            id: &id,
            user_id: &owner_id,
            emotion: &new.emotion,
            message,
            longitude: point.longitude,
            latitude: point.latitude,
            visibility: visibility.as_str(),
            expires_at: expires_at.as_deref(),
        })?;

        info!(pin_id = %id, %owner, %visibility, "Pin created");
        Ok(row.into_model())
    }

    /// Everything `owner` has pinned, newest first.
    pub fn query_own_pins(&self, owner: Uuid) -> CoreResult<Vec<Pin>> {
        let rows = self.db.get_pins_by_owner(&owner.to_string())?;
        Ok(rows.into_iter().map(|r| r.into_model()).collect())
    }

    /// Public and friends-only pins of `requester`'s friends, newest first.
    pub fn query_friend_pins(&self, requester: Uuid) -> CoreResult<Vec<Pin>> {
        let rows = self.db.get_friend_pins(&requester.to_string())?;
        Ok(rows.into_iter().map(|r| r.into_model()).collect())
    }

    /// Pins visible to `requester` within `radius_km` of the point.
    ///
    /// The radius is capped at [`crate::geo::MAX_NEARBY_RADIUS_KM`]; zero
    /// returns every visible pin regardless of distance.
    pub fn query_nearby_pins(
        &self,
        requester: Uuid,
        longitude: f64,
        latitude: f64,
        radius_km: f64,
    ) -> CoreResult<Vec<Pin>> {
        let point = validate_point(longitude, latitude)?;
        let radius = clamp_radius(radius_km)?;

        let rows = self.db.get_visible_pins_near(
            &requester.to_string(),
            point.longitude,
            point.latitude,
            radius,
        )?;
        debug!(%requester, radius_km = radius, found = rows.len(), "Nearby pin query");
        Ok(rows.into_iter().map(|r| r.into_model()).collect())
    }
}
