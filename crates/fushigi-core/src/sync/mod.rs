//! Local-first synchronization of the grammar, journal and sentence
//! collections.
//!
//! Every store follows the same cycle: load what the local durable store
//! holds, pull the full remote collection, merge it in with remote values
//! winning, then persist. Records are never deleted by a sync.

mod flight;
mod grammar;
mod record;
mod sentence;
mod store;
pub mod views;

pub use flight::{FlightPermit, SingleFlight};
pub use grammar::{GrammarStore, DEFAULT_DAILY_SUBSET_SIZE};
pub use record::SyncRecord;
pub use sentence::{JournalStore, SentenceStore};
pub use store::{StoreOptions, StoreSnapshot, SyncOutcome, SyncStore};
pub use views::{RandomSelection, SelectionPolicy, SubsetCache};
