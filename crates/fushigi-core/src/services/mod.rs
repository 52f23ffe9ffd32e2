//! Application-level wiring of stores, database and backend client.

mod stores;

pub use stores::{AppGrammarStore, AppJournalStore, AppSentenceStore, AppStores, SyncReport};
