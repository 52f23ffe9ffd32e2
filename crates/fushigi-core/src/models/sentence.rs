//! Sentence tag links between journal entries and grammar points

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::SyncRecord;
use crate::util::contains_folded;

/// A sentence from a journal entry tagged with a grammar point.
///
/// Both references are taken as given from the remote; they are not checked
/// against the local grammar or journal caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub grammar_id: Uuid,
    /// Substring of the journal text
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRemote {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub grammar_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<SentenceRemote> for Sentence {
    fn from(remote: SentenceRemote) -> Self {
        Self {
            id: remote.id,
            journal_entry_id: remote.journal_entry_id,
            grammar_id: remote.grammar_id,
            content: remote.content,
            created_at: remote.created_at,
        }
    }
}

impl SyncRecord for Sentence {
    type Remote = SentenceRemote;

    const KIND: &'static str = "sentence tags";

    fn id(&self) -> Uuid {
        self.id
    }

    fn remote_id(remote: &Self::Remote) -> Uuid {
        remote.id
    }

    fn from_remote(remote: Self::Remote) -> Self {
        remote.into()
    }

    fn merge_from(&mut self, remote: Self::Remote) {
        self.journal_entry_id = remote.journal_entry_id;
        self.grammar_id = remote.grammar_id;
        self.content = remote.content;
        self.created_at = remote.created_at;
    }

    fn matches(&self, needle: &str) -> bool {
        contains_folded(&self.content, needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_snake_case_references() {
        let payload = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "journal_entry_id": "00000000-0000-0000-0000-000000000002",
            "grammar_id": "00000000-0000-0000-0000-000000000003",
            "content": "雨が降ってもいい",
            "created_at": "2025-08-24T10:00:00Z"
        }"#;

        let sentence = Sentence::from_remote(serde_json::from_str(payload).unwrap());
        assert_eq!(sentence.journal_entry_id, Uuid::from_u128(2));
        assert_eq!(sentence.grammar_id, Uuid::from_u128(3));
    }
}
