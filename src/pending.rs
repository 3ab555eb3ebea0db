//! # Pending Submission Store
//!
//! Transient per-user state recording which channel-verification task a
//! just-uploaded photo is expected to satisfy. The store is an explicit
//! shared structure handed to the handlers through the dispatcher rather
//! than a module-level global, but it is still process memory only: a
//! restart loses pending entries and the user re-triggers the submission.

use std::collections::HashMap;

use parking_lot::Mutex;

/// What a pending photo upload is supposed to prove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub link_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    /// Channel description recorded at link submission time; this is the
    /// phrase the OCR text must contain
    pub description: String,
}

/// Thread-safe map from Telegram user ID to their pending submission
#[derive(Debug, Default)]
pub struct PendingSubmissions {
    entries: Mutex<HashMap<i64, PendingSubmission>>,
}

impl PendingSubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the pending submission for a user
    pub fn insert(&self, user_id: i64, submission: PendingSubmission) {
        self.entries.lock().insert(user_id, submission);
    }

    /// Look up the pending submission for a user without consuming it
    pub fn get(&self, user_id: i64) -> Option<PendingSubmission> {
        self.entries.lock().get(&user_id).cloned()
    }

    /// Remove and return the pending submission for a user
    pub fn take(&self, user_id: i64) -> Option<PendingSubmission> {
        self.entries.lock().remove(&user_id)
    }

    /// Number of users with a pending submission
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(link_id: i64) -> PendingSubmission {
        PendingSubmission {
            link_id,
            chat_id: 77,
            message_id: 5,
            description: "Tech Channel".to_string(),
        }
    }

    #[test]
    fn test_insert_get_take() {
        let store = PendingSubmissions::new();
        assert!(store.is_empty());

        store.insert(1, submission(10));
        assert_eq!(store.get(1).unwrap().link_id, 10);
        assert_eq!(store.len(), 1);

        // get does not consume
        assert!(store.get(1).is_some());

        let taken = store.take(1).unwrap();
        assert_eq!(taken.link_id, 10);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_insert_replaces_previous_entry() {
        let store = PendingSubmissions::new();
        store.insert(1, submission(10));
        store.insert(1, submission(20));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().link_id, 20);
    }
}
