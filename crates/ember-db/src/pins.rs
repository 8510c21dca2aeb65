use crate::Database;
use crate::models::PinRow;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, ToSql};

const PIN_COLUMNS: &str = "p.id, p.user_id, u.username, p.emotion, p.message, p.longitude, \
                           p.latitude, p.visibility, p.created_at, p.expires_at";

/// Insert parameters for one pin. Values are already validated.
pub struct NewPinRow<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub emotion: &'a str,
    pub message: Option<&'a str>,
    pub longitude: f64,
    pub latitude: f64,
    pub visibility: &'a str,
    pub expires_at: Option<&'a str>,
}

impl Database {
    // -- Pins --

    pub fn insert_pin(&self, pin: &NewPinRow<'_>) -> Result<PinRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pins (id, user_id, emotion, message, longitude, latitude, visibility, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    pin.id,
                    pin.user_id,
                    pin.emotion,
                    pin.message,
                    pin.longitude,
                    pin.latitude,
                    pin.visibility,
                    pin.expires_at,
                ],
            )?;

            conn.query_row(
                &format!("SELECT {PIN_COLUMNS} FROM pins p JOIN users u ON u.id = p.user_id WHERE p.id = ?1"),
                [pin.id],
                pin_from_row,
            )
            .optional()?
            .ok_or_else(|| anyhow!("Pin vanished after insert: {}", pin.id))
        })
    }

    /// Every pin owned by `user_id`, newest first.
    pub fn get_pins_by_owner(&self, user_id: &str) -> Result<Vec<PinRow>> {
        self.with_conn(|conn| {
            query_pins(
                conn,
                &format!(
                    "SELECT {PIN_COLUMNS}
                     FROM pins p
                     JOIN users u ON u.id = p.user_id
                     WHERE p.user_id = ?1
                     ORDER BY p.created_at DESC, p.rowid DESC"
                ),
                &[&user_id],
            )
        })
    }

    /// `public`/`friends` pins of everyone `user_id` has an accepted
    /// edge to. `private` pins never match.
    pub fn get_friend_pins(&self, user_id: &str) -> Result<Vec<PinRow>> {
        self.with_conn(|conn| {
            query_pins(
                conn,
                &format!(
                    "SELECT {PIN_COLUMNS}
                     FROM pins p
                     JOIN users u ON u.id = p.user_id
                     WHERE p.visibility IN ('public', 'friends')
                       AND p.user_id IN (
                           SELECT friend_id FROM friendships
                           WHERE user_id = ?1 AND status = 'accepted'
                       )
                     ORDER BY p.created_at DESC, p.rowid DESC"
                ),
                &[&user_id],
            )
        })
    }

    /// Pins visible to `viewer_id`, optionally limited to `radius_km`
    /// around the given point. A radius of zero disables the distance filter.
    pub fn get_visible_pins_near(
        &self,
        viewer_id: &str,
        longitude: f64,
        latitude: f64,
        radius_km: f64,
    ) -> Result<Vec<PinRow>> {
        self.with_conn(|conn| {
            query_pins(
                conn,
                &format!(
                    "SELECT {PIN_COLUMNS}
                     FROM pins p
                     JOIN users u ON u.id = p.user_id
                     WHERE (
                         p.visibility = 'public'
                         OR p.user_id = ?1
                         OR (
                             p.visibility = 'friends'
                             AND EXISTS (
                                 SELECT 1 FROM friendships f
                                 WHERE f.status = 'accepted'
                                   AND ((f.user_id = ?1 AND f.friend_id = p.user_id)
                                     OR (f.user_id = p.user_id AND f.friend_id = ?1))
                             )
                         )
                     )
                     AND (?4 <= 0 OR geo_distance_km(p.longitude, p.latitude, ?2, ?3) <= ?4)
                     ORDER BY p.created_at DESC, p.rowid DESC"
                ),
                &[&viewer_id, &longitude, &latitude, &radius_km],
            )
        })
    }
}

fn query_pins(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<PinRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, pin_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn pin_from_row(row: &Row<'_>) -> rusqlite::Result<PinRow> {
    Ok(PinRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        emotion: row.get(3)?,
        message: row.get(4)?,
        longitude: row.get(5)?,
        latitude: row.get(6)?,
        visibility: row.get(7)?,
        created_at: row.get(8)?,
        expires_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            db.create_user(id, &format!("user-{id}"), &format!("{id}@example.com"), "h", None)
                .unwrap();
        }
        db
    }

    fn pin(db: &Database, id: &str, owner: &str, visibility: &str, lon: f64, lat: f64) {
        db.insert_pin(&NewPinRow {
            id,
            user_id: owner,
            emotion: "joy",
            message: None,
            longitude: lon,
            latitude: lat,
            visibility,
            expires_at: None,
        })
        .unwrap();
    }

    fn ids(rows: Vec<PinRow>) -> Vec<String> {
        rows.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn insert_returns_joined_row() {
        let db = setup();
        let row = db
            .insert_pin(&NewPinRow {
                id: "p1",
                user_id: "a",
                emotion: "calm",
                message: Some("by the sea"),
                longitude: -123.12,
                latitude: 49.28,
                visibility: "public",
                expires_at: None,
            })
            .unwrap();
        assert_eq!(row.username, "user-a");
        assert_eq!(row.message.as_deref(), Some("by the sea"));
        assert!(row.created_at.ends_with('Z'));
    }

    #[test]
    fn schema_rejects_unknown_visibility_and_bad_coordinates() {
        let db = setup();
        let mut row = NewPinRow {
            id: "p1",
            user_id: "a",
            emotion: "joy",
            message: None,
            longitude: 0.0,
            latitude: 0.0,
            visibility: "everyone",
            expires_at: None,
        };
        assert!(db.insert_pin(&row).is_err());
        row.visibility = "public";
        row.latitude = 91.0;
        assert!(db.insert_pin(&row).is_err());
    }

    #[test]
    fn own_pins_newest_first() {
        let db = setup();
        pin(&db, "p1", "a", "private", 0.0, 0.0);
        pin(&db, "p2", "a", "public", 0.0, 0.0);
        pin(&db, "p3", "b", "public", 0.0, 0.0);
        assert_eq!(ids(db.get_pins_by_owner("a").unwrap()), vec!["p2", "p1"]);
    }

    #[test]
    fn nearby_filters_by_distance_unless_radius_is_zero() {
        let db = setup();
        pin(&db, "near", "a", "public", -123.12, 49.28);
        pin(&db, "far", "a", "public", -122.33, 47.61);

        let close = db.get_visible_pins_near("b", -123.12, 49.28, 1.0).unwrap();
        assert_eq!(ids(close), vec!["near"]);

        let all = db.get_visible_pins_near("b", -123.12, 49.28, 0.0).unwrap();
        assert_eq!(ids(all), vec!["far", "near"]);
    }

    #[test]
    fn expiry_does_not_hide_visible_pins() {
        let db = setup();
        db.insert_pin(&NewPinRow {
            id: "old",
            user_id: "a",
            emotion: "joy",
            message: None,
            longitude: 0.0,
            latitude: 0.0,
            visibility: "public",
            expires_at: Some("2000-01-01T00:00:00.000Z"),
        })
        .unwrap();

        assert_eq!(ids(db.get_visible_pins_near("a", 0.0, 0.0, 0.0).unwrap()), vec!["old"]);
        assert_eq!(ids(db.get_visible_pins_near("b", 0.0, 0.0, 0.0).unwrap()), vec!["old"]);
        assert_eq!(ids(db.get_pins_by_owner("a").unwrap()), vec!["old"]);

        let row = db.get_pins_by_owner("a").unwrap().remove(0);
        assert_eq!(row.expires_at.as_deref(), Some("2000-01-01T00:00:00.000Z"));
    }
}
