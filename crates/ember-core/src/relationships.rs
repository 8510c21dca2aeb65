use std::sync::Arc;

use ember_db::Database;
use ember_db::models::EdgeStatus;
use ember_types::models::{FriendRequests, RelationshipStatus, User};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Friendship state machine over the store's edge table.
///
/// Per unordered pair: `NONE -> PENDING(dir) -> ACCEPTED -> NONE`, with
/// `PENDING -> NONE` through reject or delete. Accepted friendships are two
/// mirrored edges so each side can list friends with a one-directional scan.
#[derive(Clone)]
pub struct Relationships {
    db: Arc<Database>,
}

impl Relationships {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Send a request from `requester` to `target`.
    ///
    /// `Ok(false)` when the pair already has a pending or accepted edge in
    /// either direction.
    pub fn create_friend_request(&self, requester: Uuid, target: Uuid) -> CoreResult<bool> {
        if requester == target {
            return Err(CoreError::SelfReference);
        }

        let requester_id = requester.to_string();
        let target_id = target.to_string();

        if !self.db.user_exists(&requester_id)? {
            return Err(CoreError::RequesterNotFound(requester));
        }
        if !self.db.user_exists(&target_id)? {
            return Err(CoreError::TargetNotFound(target));
        }

        let created = self.db.insert_friend_request(&requester_id, &target_id)?;
        if created {
            info!(%requester, %target, "Friend request created");
        } else {
            debug!(%requester, %target, "Friend request skipped, relation already exists");
        }
        Ok(created)
    }

    /// Accept the pending request `requester -> accepter`.
    ///
    /// `Ok(false)` and no mutation when no such pending request exists, which
    /// makes repeated accepts harmless.
    pub fn accept_friend_request(&self, accepter: Uuid, requester: Uuid) -> CoreResult<bool> {
        if accepter == requester {
            return Err(CoreError::SelfReference);
        }

        let accepted = self
            .db
            .accept_friend_request(&accepter.to_string(), &requester.to_string())?;
        if accepted {
            info!(%accepter, %requester, "Friend request accepted");
        } else {
            debug!(%accepter, %requester, "No pending friend request to accept");
        }
        Ok(accepted)
    }

    /// Drop the pending request `requester -> rejecter`.
    pub fn reject_friend_request(&self, rejecter: Uuid, requester: Uuid) -> CoreResult<bool> {
        if rejecter == requester {
            return Err(CoreError::SelfReference);
        }

        let rejected = self
            .db
            .reject_friend_request(&rejecter.to_string(), &requester.to_string())?;
        if rejected {
            info!(%rejecter, %requester, "Friend request rejected");
        } else {
            debug!(%rejecter, %requester, "No pending friend request to reject");
        }
        Ok(rejected)
    }

    /// Unfriend. Also cancels a pending request in either direction.
    pub fn delete_friendship(&self, user_a: Uuid, user_b: Uuid) -> CoreResult<bool> {
        if user_a == user_b {
            return Err(CoreError::SelfReference);
        }

        let removed = self
            .db
            .delete_friendship(&user_a.to_string(), &user_b.to_string())?;
        if removed {
            info!(%user_a, %user_b, "Friendship removed");
        } else {
            debug!(%user_a, %user_b, "No friendship to remove");
        }
        Ok(removed)
    }

    /// Accepted friends of `user`, by username.
    pub fn list_friends(&self, user: Uuid) -> CoreResult<Vec<User>> {
        let rows = self.db.get_friends(&user.to_string())?;
        Ok(rows.into_iter().map(|r| r.into_model()).collect())
    }

    pub fn list_friend_requests(&self, user: Uuid) -> CoreResult<FriendRequests> {
        let id = user.to_string();
        let incoming = self.db.get_incoming_requests(&id)?;
        let outgoing = self.db.get_outgoing_requests(&id)?;

        Ok(FriendRequests {
            incoming: incoming.into_iter().map(|r| r.into_model()).collect(),
            outgoing: outgoing.into_iter().map(|r| r.into_model()).collect(),
        })
    }

    /// Where `viewer` stands with `other`.
    pub fn relationship(&self, viewer: Uuid, other: Uuid) -> CoreResult<RelationshipStatus> {
        if viewer == other {
            return Ok(RelationshipStatus::None);
        }

        let viewer_id = viewer.to_string();
        let other_id = other.to_string();
        let forward = self.db.get_edge(&viewer_id, &other_id)?;
        let backward = self.db.get_edge(&other_id, &viewer_id)?;

        Ok(match (forward, backward) {
            (Some(EdgeStatus::Accepted), _) | (_, Some(EdgeStatus::Accepted)) => {
                RelationshipStatus::Friends
            }
            (Some(EdgeStatus::Pending), _) => RelationshipStatus::Outgoing,
            (_, Some(EdgeStatus::Pending)) => RelationshipStatus::Incoming,
            (None, None) => RelationshipStatus::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        db: Arc<Database>,
        rel: Relationships,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Arc::new(Database::open_in_memory().unwrap());
            let rel = Relationships::new(db.clone());
            Self { db, rel }
        }

        fn user(&self, name: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.db
                .create_user(&id.to_string(), name, &format!("{name}@example.com"), "h", None)
                .unwrap();
            id
        }

        fn friend_ids(&self, user: Uuid) -> Vec<Uuid> {
            self.rel
                .list_friends(user)
                .unwrap()
                .into_iter()
                .map(|u| u.id)
                .collect()
        }

        fn befriend(&self, a: Uuid, b: Uuid) {
            assert!(self.rel.create_friend_request(a, b).unwrap());
            assert!(self.rel.accept_friend_request(b, a).unwrap());
        }
    }

    #[test]
    fn request_is_exclusive_in_both_directions() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));

        assert!(f.rel.create_friend_request(a, b).unwrap());
        assert!(!f.rel.create_friend_request(b, a).unwrap());
        assert!(!f.rel.create_friend_request(a, b).unwrap());
    }

    #[test]
    fn self_request_fails() {
        let f = Fixture::new();
        let a = f.user("ada");
        assert!(matches!(
            f.rel.create_friend_request(a, a),
            Err(CoreError::SelfReference)
        ));

        // Even for ids the store has never seen.
        let ghost = Uuid::new_v4();
        assert!(matches!(
            f.rel.create_friend_request(ghost, ghost),
            Err(CoreError::SelfReference)
        ));
    }

    #[test]
    fn missing_users_are_told_apart() {
        let f = Fixture::new();
        let a = f.user("ada");
        let ghost = Uuid::new_v4();

        assert!(matches!(
            f.rel.create_friend_request(a, ghost),
            Err(CoreError::TargetNotFound(id)) if id == ghost
        ));
        assert!(matches!(
            f.rel.create_friend_request(ghost, a),
            Err(CoreError::RequesterNotFound(id)) if id == ghost
        ));
    }

    #[test]
    fn accept_creates_mirrored_friendship() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.befriend(a, b);

        assert_eq!(f.friend_ids(a), vec![b]);
        assert_eq!(f.friend_ids(b), vec![a]);
        assert_eq!(f.rel.relationship(a, b).unwrap(), RelationshipStatus::Friends);
        assert_eq!(f.rel.relationship(b, a).unwrap(), RelationshipStatus::Friends);
    }

    #[test]
    fn second_accept_is_a_no_op() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.befriend(a, b);

        assert!(!f.rel.accept_friend_request(b, a).unwrap());
        assert_eq!(f.friend_ids(a), vec![b]);
        assert_eq!(f.friend_ids(b), vec![a]);
    }

    #[test]
    fn requester_cannot_accept_own_request() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.rel.create_friend_request(a, b).unwrap();

        assert!(!f.rel.accept_friend_request(a, b).unwrap());
        assert!(f.friend_ids(a).is_empty());
        assert_eq!(f.rel.relationship(a, b).unwrap(), RelationshipStatus::Outgoing);
        assert_eq!(f.rel.relationship(b, a).unwrap(), RelationshipStatus::Incoming);
    }

    #[test]
    fn reject_clears_request_and_allows_a_new_one() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.rel.create_friend_request(a, b).unwrap();

        assert!(f.rel.reject_friend_request(b, a).unwrap());
        assert!(!f.rel.reject_friend_request(b, a).unwrap());
        assert_eq!(f.rel.relationship(a, b).unwrap(), RelationshipStatus::None);

        assert!(f.rel.create_friend_request(b, a).unwrap());
    }

    #[test]
    fn reject_leaves_friendship_alone() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.befriend(a, b);

        assert!(!f.rel.reject_friend_request(b, a).unwrap());
        assert!(!f.rel.reject_friend_request(a, b).unwrap());
        assert_eq!(f.friend_ids(a), vec![b]);
    }

    #[test]
    fn delete_removes_both_sides() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.befriend(a, b);

        assert!(f.rel.delete_friendship(a, b).unwrap());
        assert!(f.friend_ids(a).is_empty());
        assert!(f.friend_ids(b).is_empty());
        assert!(!f.rel.delete_friendship(b, a).unwrap());

        // Back to NONE: a fresh request is possible.
        assert!(f.rel.create_friend_request(b, a).unwrap());
    }

    #[test]
    fn delete_cancels_pending_request() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));
        f.rel.create_friend_request(a, b).unwrap();

        assert!(f.rel.delete_friendship(a, b).unwrap());
        let requests = f.rel.list_friend_requests(b).unwrap();
        assert!(requests.incoming.is_empty());
    }

    #[test]
    fn friend_requests_split_by_direction() {
        let f = Fixture::new();
        let (a, b, c) = (f.user("ada"), f.user("bob"), f.user("cyd"));
        f.rel.create_friend_request(a, b).unwrap();
        f.rel.create_friend_request(c, a).unwrap();

        let requests = f.rel.list_friend_requests(a).unwrap();
        let outgoing: Vec<_> = requests.outgoing.iter().map(|u| u.id).collect();
        let incoming: Vec<_> = requests.incoming.iter().map(|u| u.id).collect();
        assert_eq!(outgoing, vec![b]);
        assert_eq!(incoming, vec![c]);

        f.rel.accept_friend_request(a, c).unwrap();
        let requests = f.rel.list_friend_requests(a).unwrap();
        assert!(requests.incoming.is_empty());
        assert_eq!(requests.outgoing.len(), 1);
    }

    #[test]
    fn friends_are_listed_by_username() {
        let f = Fixture::new();
        let (me, zed, amy) = (f.user("me"), f.user("zed"), f.user("amy"));
        f.befriend(me, zed);
        f.befriend(amy, me);

        assert_eq!(f.friend_ids(me), vec![amy, zed]);
    }

    #[test]
    fn concurrent_opposite_requests_leave_one_edge() {
        let f = Fixture::new();
        let (a, b) = (f.user("ada"), f.user("bob"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let rel = f.rel.clone();
                let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                std::thread::spawn(move || rel.create_friend_request(from, to).unwrap())
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|c| *c)
            .count();
        assert_eq!(created, 1);
    }
}
