//! fushigi-core - Local-first sync layer for the Fushigi grammar journal
//!
//! This crate contains the models, local database, backend client and the
//! sync engine shared by every Fushigi front end.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use error::{Error, RemoteError, Result, SubmitError};
pub use models::{GrammarPoint, JournalEntry, Sentence};
pub use services::AppStores;
pub use state::{DataAvailability, HealthState, RecoveryAction, SystemHealth, SystemState};
pub use sync::{GrammarStore, JournalStore, SentenceStore, SyncOutcome, SyncRecord, SyncStore};
