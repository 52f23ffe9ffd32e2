//! Journal entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::SyncRecord;
use crate::util::contains_folded;

/// A journal entry that has been accepted by the backend.
///
/// Entries only get an identifier once a submission succeeds, so a
/// `JournalEntry` always carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_private: bool,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Get first line of the content, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Journal entry as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryRemote {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of a journal submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    #[serde(rename = "private")]
    pub is_private: bool,
}

impl From<JournalEntryRemote> for JournalEntry {
    fn from(remote: JournalEntryRemote) -> Self {
        Self {
            id: remote.id,
            title: remote.title,
            content: remote.content,
            is_private: remote.is_private,
            created_at: remote.created_at,
        }
    }
}

impl SyncRecord for JournalEntry {
    type Remote = JournalEntryRemote;

    const KIND: &'static str = "journal entries";

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
        self.title = remote.title;
        self.content = remote.content;
        self.is_private = remote.is_private;
        self.created_at = remote.created_at;
    }

    fn matches(&self, needle: &str) -> bool {
        contains_folded(&self.title, needle) || contains_folded(&self.content, needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_backend_payload() {
        let payload = r#"{
            "id": "6f1c2b8e-3f7a-4f57-9a43-2d5c4e0b9a11",
            "title": "初日",
            "content": "今日は雨でした。",
            "private": true,
            "created_at": "2025-08-24T09:30:00Z",
            "user_id": "11111111-1111-4111-8111-111111111111"
        }"#;

        let decoded: JournalEntryRemote = serde_json::from_str(payload).unwrap();
        assert!(decoded.is_private);
        assert_eq!(decoded.title, "初日");
        assert_eq!(decoded.created_at.to_rfc3339(), "2025-08-24T09:30:00+00:00");
    }

    #[test]
    fn submission_body_uses_private_key() {
        let body = NewJournalEntry {
            title: "t".to_string(),
            content: "c".to_string(),
            is_private: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "t", "content": "c", "private": false})
        );
    }

    #[test]
    fn matches_title_or_content_only() {
        let entry = JournalEntry {
            id: Uuid::nil(),
            title: "Rainy Day".to_string(),
            content: "傘を忘れた".to_string(),
            is_private: false,
            created_at: Utc::now(),
        };
        assert!(entry.matches("rainy"));
        assert!(entry.matches("傘"));
        assert!(!entry.matches("false"));
    }

    #[test]
    fn preview_uses_first_line() {
        let entry = JournalEntry {
            id: Uuid::nil(),
            title: "t".to_string(),
            content: "First line\nSecond line".to_string(),
            is_private: false,
            created_at: Utc::now(),
        };
        assert_eq!(entry.preview(50), "First line");
        assert_eq!(entry.preview(5), "First");
    }
}
