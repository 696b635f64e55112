// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral in-process session storage for the conversational flow.
//!
//! The registry is pure state storage with per-key replace semantics and
//! no business logic. It has no persistence, no capacity bound, and no
//! eviction timer: abandoned sessions live for the process lifetime. That
//! is an accepted scope decision for a single-process deployment, not an
//! invariant callers may strengthen silently.

use std::path::PathBuf;

use dashmap::DashMap;
use uuid::Uuid;

use crate::types::{MediaInfo, MediaKind, SessionId, UserId};

/// An artifact parked between fetch completion and the rename sub-flow.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedArtifact {
    pub path: PathBuf,
    pub title: String,
    pub kind: MediaKind,
}

/// Per-interaction state, visible only to its owning user.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user: UserId,
    pub chat_id: i64,
    /// Status message edited in place during acquisition progress.
    pub status_message_id: Option<i32>,
    pub info: MediaInfo,
    pub awaiting_rename: bool,
    pub staged: Option<StagedArtifact>,
}

impl Session {
    /// Creates a new session with a freshly generated identifier.
    pub fn new(user: UserId, chat_id: i64, info: MediaInfo) -> Self {
        Self {
            id: SessionId(Uuid::new_v4().to_string()),
            user,
            chat_id,
            status_message_id: None,
            info,
            awaiting_rename: false,
            staged: None,
        }
    }
}

/// Concurrency-safe keyed store for sessions, passed as an explicit
/// dependency into the conversation handlers and the orchestrator.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session and returns its identifier.
    pub fn create(&self, session: Session) -> SessionId {
        let id = session.id.clone();
        self.inner.insert(id.clone(), session);
        id
    }

    /// Returns a snapshot of the session, if it exists.
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.inner.get(id).map(|entry| entry.clone())
    }

    /// Applies `f` to the session under the map's entry lock.
    ///
    /// Returns `false` when the session is absent.
    pub fn update(&self, id: &SessionId, f: impl FnOnce(&mut Session)) -> bool {
        match self.inner.get_mut(id) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the session.
    pub fn remove(&self, id: &SessionId) -> Option<Session> {
        self.inner.remove(id).map(|(_, session)| session)
    }

    /// Finds the session awaiting a rename reply for `user`.
    ///
    /// Matching is scoped by user, not by session: if a user somehow has
    /// two concurrent acquisitions in the rename sub-state, the reply
    /// attaches to whichever session the scan visits first.
    pub fn find_awaiting_rename_for(&self, user: UserId) -> Option<Session> {
        self.inner
            .iter()
            .find(|entry| entry.awaiting_rename && entry.user == user)
            .map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> MediaInfo {
        MediaInfo {
            title: "Test Clip".into(),
            uploader: None,
            duration_secs: Some(30),
            view_count: None,
            upload_date: None,
            description: None,
            thumbnail_url: None,
            webpage_url: "https://example.com/watch?v=x".into(),
            formats: vec![],
        }
    }

    #[test]
    fn create_get_remove_round_trip() {
        let registry = SessionRegistry::new();
        let id = registry.create(Session::new(UserId(7), 7, info()));

        let session = registry.get(&id).expect("session present");
        assert_eq!(session.user, UserId(7));
        assert!(!session.awaiting_rename);

        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn get_absent_session_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.get(&SessionId("nope".into())).is_none());
    }

    #[test]
    fn update_mutates_in_place() {
        let registry = SessionRegistry::new();
        let id = registry.create(Session::new(UserId(1), 1, info()));

        assert!(registry.update(&id, |s| s.status_message_id = Some(42)));
        assert_eq!(registry.get(&id).unwrap().status_message_id, Some(42));

        assert!(!registry.update(&SessionId("gone".into()), |_| {}));
    }

    #[test]
    fn rename_scan_is_scoped_by_user() {
        let registry = SessionRegistry::new();
        let mine = registry.create(Session::new(UserId(1), 1, info()));
        registry.create(Session::new(UserId(2), 2, info()));
        registry.update(&mine, |s| s.awaiting_rename = true);

        let found = registry.find_awaiting_rename_for(UserId(1)).unwrap();
        assert_eq!(found.id, mine);
        assert!(registry.find_awaiting_rename_for(UserId(3)).is_none());
        // User 2 has a session, but not in the rename sub-state.
        assert!(registry.find_awaiting_rename_for(UserId(2)).is_none());
    }

    #[test]
    fn sessions_have_distinct_generated_ids() {
        let a = Session::new(UserId(1), 1, info());
        let b = Session::new(UserId(1), 1, info());
        assert_ne!(a.id, b.id);
    }
}
