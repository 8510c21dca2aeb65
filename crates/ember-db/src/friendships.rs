use crate::Database;
use crate::migrations::NOW;
use crate::models::{EdgeStatus, UserRow};
use crate::queries::{USER_COLUMNS, user_from_row};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Friendship edges --

    /// Insert `requester -> target` as pending unless an edge already links
    /// the pair in either direction. Check and insert are one statement.
    /// Returns whether a row was inserted.
    pub fn insert_friend_request(&self, requester_id: &str, target_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO friendships (user_id, friend_id, status)
                 SELECT ?1, ?2, 'pending'
                 WHERE NOT EXISTS (
                     SELECT 1 FROM friendships
                     WHERE status IN ('pending', 'accepted')
                       AND ((user_id = ?1 AND friend_id = ?2)
                         OR (user_id = ?2 AND friend_id = ?1))
                 )",
                (requester_id, target_id),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Promote the pending `requester -> accepter` edge and add the mirror
    /// `accepter -> requester`, all in one transaction. Returns `false`
    /// without touching anything when there is no such pending edge.
    pub fn accept_friend_request(&self, accepter_id: &str, requester_id: &str) -> Result<bool> {
        self.with_tx(|tx| {
            let updated = tx.execute(
                &format!(
                    "UPDATE friendships SET status = 'accepted', created_at = {NOW}
                     WHERE user_id = ?1 AND friend_id = ?2 AND status = 'pending'"
                ),
                (requester_id, accepter_id),
            )?;
            if updated == 0 {
                return Ok(false);
            }

            // Stray request in the other direction, if both sides asked.
            tx.execute(
                "DELETE FROM friendships WHERE user_id = ?1 AND friend_id = ?2 AND status = 'pending'",
                (accepter_id, requester_id),
            )?;

            tx.execute(
                "INSERT INTO friendships (user_id, friend_id, status) VALUES (?1, ?2, 'accepted')",
                (accepter_id, requester_id),
            )?;

            Ok(true)
        })
    }

    /// Drop the pending `requester -> rejecter` edge. Accepted edges are untouched.
    pub fn reject_friend_request(&self, rejecter_id: &str, requester_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM friendships WHERE user_id = ?1 AND friend_id = ?2 AND status = 'pending'",
                (requester_id, rejecter_id),
            )?;
            Ok(deleted > 0)
        })
    }

    /// Remove every edge between the pair, both directions, any status.
    pub fn delete_friendship(&self, user_a: &str, user_b: &str) -> Result<bool> {
        self.with_tx(|tx| {
            let forward = tx.execute(
                "DELETE FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
                (user_a, user_b),
            )?;
            let backward = tx.execute(
                "DELETE FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
                (user_b, user_a),
            )?;
            Ok(forward + backward > 0)
        })
    }

    pub fn get_friends(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS}
                     FROM friendships f
                     JOIN users u ON u.id = f.friend_id
                     WHERE f.user_id = ?1 AND f.status = 'accepted'
                     ORDER BY u.username"
                ),
                user_id,
            )
        })
    }

    /// Users who sent `user_id` a request that is still pending.
    pub fn get_incoming_requests(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS}
                     FROM friendships f
                     JOIN users u ON u.id = f.user_id
                     WHERE f.friend_id = ?1 AND f.status = 'pending'
                     ORDER BY f.created_at DESC"
                ),
                user_id,
            )
        })
    }

    /// Users `user_id` asked who have not answered yet.
    pub fn get_outgoing_requests(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS}
                     FROM friendships f
                     JOIN users u ON u.id = f.friend_id
                     WHERE f.user_id = ?1 AND f.status = 'pending'
                     ORDER BY f.created_at DESC"
                ),
                user_id,
            )
        })
    }

    /// Status of the directed edge `from -> to`, if any.
    pub fn get_edge(&self, from_id: &str, to_id: &str) -> Result<Option<EdgeStatus>> {
        self.with_conn(|conn| {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
                    (from_id, to_id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(status.as_deref().and_then(EdgeStatus::from_sql))
        })
    }
}

fn query_users(conn: &Connection, sql: &str, user_id: &str) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user_id], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
