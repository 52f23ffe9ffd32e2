use uuid::Uuid;

/// A locally cached record that can be reconciled against its remote copy.
pub trait SyncRecord: Clone {
    /// Wire representation served by the remote data provider
    type Remote;

    /// Plural label used in log lines
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn remote_id(remote: &Self::Remote) -> Uuid;

    /// Build a new local record from a remote one.
    fn from_remote(remote: Self::Remote) -> Self;

    /// Overwrite every mutable field with the remote values.
    fn merge_from(&mut self, remote: Self::Remote);

    /// Whether the record matches a search needle. `needle` is lowercase and
    /// non-empty.
    fn matches(&self, needle: &str) -> bool;
}
