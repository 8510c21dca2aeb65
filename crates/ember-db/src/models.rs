//! Database row types — these map directly to SQLite rows.
//! Distinct from ember-types models to keep the DB layer independent.
use chrono::{DateTime, NaiveDateTime, Utc};
use ember_types::models::{GeoPoint, Pin, User, Visibility};
use tracing::warn;
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Login material. Never converted into an API model.
pub struct CredentialsRow {
    pub id: String,
    pub username: String,
    pub password: String,
}

pub struct PinRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub emotion: String,
    pub message: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub visibility: String,
    pub created_at: String,
    pub expires_at: Option<String>,
}

/// Raw state of one directed friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStatus {
    Pending,
    Accepted,
}

impl EdgeStatus {
    pub(crate) fn from_sql(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }
}

impl UserRow {
    pub fn into_model(self) -> User {
        User {
            id: parse_uuid(&self.id, "user id"),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
            username: self.username,
            display_name: self.display_name,
            bio: self.bio,
        }
    }
}

impl PinRow {
    pub fn into_model(self) -> Pin {
        let visibility = self.visibility.parse().unwrap_or_else(|e| {
            warn!("Corrupt visibility on pin '{}': {}", self.id, e);
            Visibility::Private
        });

        Pin {
            id: parse_uuid(&self.id, "pin id"),
            owner_id: parse_uuid(&self.user_id, "pin owner"),
            owner_username: self.username,
            emotion: self.emotion,
            message: self.message,
            location: GeoPoint {
                longitude: self.longitude,
                latitude: self.latitude,
            },
            visibility,
            created_at: parse_timestamp(&self.created_at),
            expires_at: self.expires_at.as_deref().map(parse_timestamp),
        }
    }
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// Accepts RFC 3339 (what the schema writes) and SQLite's
/// `datetime('now')` form for rows written by hand.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Format an instant the way the schema's default expressions do.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_roundtrip_through_storage_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let stored = format_timestamp(at);
        assert_eq!(stored, "2025-03-14T15:09:26.000Z");
        assert_eq!(parse_timestamp(&stored), at);
    }

    #[test]
    fn sqlite_datetime_form_is_accepted() {
        let at = parse_timestamp("2025-03-14 15:09:26");
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap());
    }

    #[test]
    fn corrupt_visibility_degrades_to_private() {
        let row = PinRow {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            username: "ada".into(),
            emotion: "joy".into(),
            message: None,
            longitude: 0.0,
            latitude: 0.0,
            visibility: "everyone".into(),
            created_at: "2025-03-14T15:09:26.000Z".into(),
            expires_at: None,
        };
        assert_eq!(row.into_model().visibility, Visibility::Private);
    }
}
