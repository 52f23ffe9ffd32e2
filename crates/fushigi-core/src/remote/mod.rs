//! Remote data provider contracts and the HTTP client implementing them.

mod client;

pub use client::ApiClient;

use crate::error::{RemoteResult, SubmitError};
use crate::models::NewJournalEntry;
use crate::sync::SyncRecord;

/// Source of truth for one record type.
///
/// Always yields the complete collection; paging, if any, is the
/// implementation's business.
#[allow(async_fn_in_trait)]
pub trait RemoteSource<R: SyncRecord> {
    async fn fetch_all(&self) -> RemoteResult<Vec<R::Remote>>;
}

/// One-shot journal entry creation.
#[allow(async_fn_in_trait)]
pub trait JournalSubmitter {
    /// Create the entry and return the server-assigned identifier.
    async fn create_entry(&self, entry: &NewJournalEntry) -> RemoteResult<String>;
}

/// Validate a journal entry before submission.
///
/// Title and content are trimmed; either being empty rejects the entry.
pub fn validate_entry(
    title: &str,
    content: &str,
    is_private: bool,
) -> Result<NewJournalEntry, SubmitError> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(SubmitError::Validation(
            "Please fill out all fields.".to_string(),
        ));
    }

    Ok(NewJournalEntry {
        title: title.to_string(),
        content: content.to_string(),
        is_private,
    })
}

/// Validate and submit a journal entry, returning a confirmation message.
///
/// Invalid input is rejected before the submitter is called.
pub async fn submit_journal_entry<S: JournalSubmitter>(
    submitter: &S,
    title: &str,
    content: &str,
    is_private: bool,
) -> Result<String, SubmitError> {
    let entry = validate_entry(title, content, is_private)?;
    let id = submitter.create_entry(&entry).await.map_err(|error| {
        tracing::warn!("Journal submission failed: {error}");
        error
    })?;
    tracing::info!("Journal entry saved with id {id}");
    Ok(format!("Journal saved (ID: {id})"))
}
