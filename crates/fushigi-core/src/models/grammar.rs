//! Grammar point model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::SyncRecord;
use crate::util::contains_folded;

/// A reusable Japanese grammar pattern kept in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPoint {
    /// Identifier assigned by the remote source of truth
    pub id: Uuid,
    /// Usage context label (e.g. "spoken", "written", "business")
    pub context: String,
    /// The grammar pattern itself
    pub usage: String,
    /// Translation or explanation
    pub meaning: String,
    /// Short classification labels; order is not meaningful
    pub tags: Vec<String>,
}

/// Grammar point as served by the backend.
///
/// The backend also sends `notes`, `nuance` and `examples`; the local cache
/// does not keep them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPointRemote {
    pub id: Uuid,
    pub context: String,
    pub usage: String,
    pub meaning: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<GrammarPointRemote> for GrammarPoint {
    fn from(remote: GrammarPointRemote) -> Self {
        Self {
            id: remote.id,
            context: remote.context,
            usage: remote.usage,
            meaning: remote.meaning,
            tags: remote.tags,
        }
    }
}

impl SyncRecord for GrammarPoint {
    type Remote = GrammarPointRemote;

    const KIND: &'static str = "grammar points";

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
        self.context = remote.context;
        self.usage = remote.usage;
        self.meaning = remote.meaning;
        self.tags = remote.tags;
    }

    fn matches(&self, needle: &str) -> bool {
        contains_folded(&self.usage, needle)
            || contains_folded(&self.meaning, needle)
            || contains_folded(&self.context, needle)
            || self.tags.iter().any(|tag| contains_folded(tag, needle))
    }
}
