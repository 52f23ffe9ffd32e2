//! Journal and sentence stores.

use uuid::Uuid;

use super::SyncStore;
use crate::error::{Error, Result};
use crate::models::{JournalEntry, Sentence};

pub type JournalStore<L, P> = SyncStore<JournalEntry, L, P>;
pub type SentenceStore<L, P> = SyncStore<Sentence, L, P>;

impl<L, P> SyncStore<Sentence, L, P> {
    /// Sentence tags taken from one journal entry, in collection order.
    pub fn for_journal(&self, journal_entry_id: Uuid) -> Vec<Sentence> {
        self.with_items(|items| {
            items
                .iter()
                .filter(|sentence| sentence.journal_entry_id == journal_entry_id)
                .cloned()
                .collect()
        })
    }

    /// Sentence tags that exercise one grammar point, in collection order.
    pub fn for_grammar(&self, grammar_id: Uuid) -> Vec<Sentence> {
        self.with_items(|items| {
            items
                .iter()
                .filter(|sentence| sentence.grammar_id == grammar_id)
                .cloned()
                .collect()
        })
    }

    /// Request a link between a journal sentence and a grammar point.
    ///
    /// The backend has no endpoint for creating links yet, so a valid
    /// request is only logged. Links arrive through the regular sync.
    pub fn link_grammar(&self, journal_entry_id: Uuid, grammar_id: Uuid, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput(
                "sentence content cannot be empty".to_string(),
            ));
        }
        if journal_entry_id.is_nil() || grammar_id.is_nil() {
            return Err(Error::InvalidInput(
                "sentence link needs a journal entry and a grammar point".to_string(),
            ));
        }

        tracing::info!(
            "Sentence link requested: journal {journal_entry_id} -> grammar {grammar_id} ({} chars)",
            content.chars().count()
        );
        Ok(())
    }
}
