//! Data models for Fushigi

mod grammar;
mod journal;
mod sentence;
mod tags;

pub use grammar::{GrammarPoint, GrammarPointRemote};
pub use journal::{JournalEntry, JournalEntryRemote, NewJournalEntry};
pub use sentence::{Sentence, SentenceRemote};
pub use tags::{Context, SourceMode};
