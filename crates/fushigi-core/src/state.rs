//! Health and availability state shared by every store.
//!
//! A store tracks two independent axes: whether it has data to show
//! ([`DataAvailability`]) and whether its collaborators are working
//! ([`SystemHealth`]). [`HealthState::system_state`] reduces the pair to the
//! single [`SystemState`] the UI renders.

use std::fmt;

use serde::Serialize;

/// Whether the store has usable data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataAvailability {
    Loading,
    Available,
    #[default]
    Empty,
}

impl DataAvailability {
    pub const ALL: [Self; 3] = [Self::Loading, Self::Available, Self::Empty];

    /// Availability implied by the current collection size.
    pub const fn for_len(len: usize) -> Self {
        if len == 0 {
            Self::Empty
        } else {
            Self::Available
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Loading => "Loading data...",
            Self::Available => "Data ready",
            Self::Empty => "No data available",
        }
    }
}

/// Health of the store's data sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SystemHealth {
    #[default]
    Healthy,
    /// The local durable store could not be read or written
    LocalFailure,
    /// The remote data provider could not be reached or decoded
    RemoteFailure,
}

impl SystemHealth {
    pub const ALL: [Self; 3] = [Self::Healthy, Self::LocalFailure, Self::RemoteFailure];

    pub const fn description(self) -> &'static str {
        match self {
            Self::Healthy => "All systems operational",
            Self::LocalFailure => "Local storage could not be read or written",
            Self::RemoteFailure => "Unable to reach the remote server",
        }
    }

    pub const fn has_error(self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

/// What the UI should offer to fix the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Re-read the local durable store
    ReloadLocal,
    /// Re-run the remote sync
    RetrySync,
    /// Load local and sync again; offered when there is simply no data yet
    Refresh,
}

impl RecoveryAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReloadLocal => "Retry",
            Self::RetrySync => "Retry Sync",
            Self::Refresh => "Refresh",
        }
    }
}

/// The presentable state that drives rendering decisions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SystemState {
    Loading,
    Normal,
    EmptyData,
    /// Data is present but may be stale because a source is failing
    DegradedOperation(String),
    /// No data and a source is failing
    CriticalError(String),
}

impl SystemState {
    pub fn description(&self) -> String {
        match self {
            Self::Loading => "Loading local data and fetching from the server".to_string(),
            Self::Normal => "Standard operation with full data set".to_string(),
            Self::EmptyData => "No data available".to_string(),
            Self::DegradedOperation(reason) => format!("Operating with local data only: {reason}"),
            Self::CriticalError(reason) => format!("Critical error: {reason}"),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::DegradedOperation(_) | Self::CriticalError(_))
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// The two-axis state machine driven by the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct HealthState {
    pub availability: DataAvailability,
    pub health: SystemHealth,
}

impl HealthState {
    pub const fn new(availability: DataAvailability, health: SystemHealth) -> Self {
        Self {
            availability,
            health,
        }
    }

    pub fn system_state(&self) -> SystemState {
        match (self.availability, self.health) {
            (DataAvailability::Loading, _) => SystemState::Loading,
            (DataAvailability::Empty, SystemHealth::Healthy) => SystemState::EmptyData,
            (DataAvailability::Empty, health @ (SystemHealth::LocalFailure | SystemHealth::RemoteFailure)) => {
                SystemState::CriticalError(health.description().to_string())
            }
            (DataAvailability::Available, SystemHealth::Healthy) => SystemState::Normal,
            (
                DataAvailability::Available,
                health @ (SystemHealth::LocalFailure | SystemHealth::RemoteFailure),
            ) => SystemState::DegradedOperation(health.description().to_string()),
        }
    }

    /// Recovery action for the current state, picked from the failing axis.
    pub const fn recovery_action(&self) -> Option<RecoveryAction> {
        match (self.availability, self.health) {
            (DataAvailability::Loading, _) | (DataAvailability::Available, SystemHealth::Healthy) => None,
            (DataAvailability::Empty, SystemHealth::Healthy) => Some(RecoveryAction::Refresh),
            (_, SystemHealth::LocalFailure) => Some(RecoveryAction::ReloadLocal),
            (_, SystemHealth::RemoteFailure) => Some(RecoveryAction::RetrySync),
        }
    }

    pub fn mark_loading(&mut self) {
        self.availability = DataAvailability::Loading;
    }

    pub fn on_local_load_failure(&mut self, len: usize) {
        self.health = SystemHealth::LocalFailure;
        self.availability = DataAvailability::for_len(len);
    }

    pub fn on_remote_sync_failure(&mut self, len: usize) {
        self.health = SystemHealth::RemoteFailure;
        self.availability = DataAvailability::for_len(len);
    }

    /// A remote round-trip succeeded.
    ///
    /// Clears a remote failure only; a local failure stays until a local
    /// operation succeeds.
    pub fn on_sync_success(&mut self, len: usize) {
        if self.health == SystemHealth::RemoteFailure {
            self.health = SystemHealth::Healthy;
        }
        self.availability = DataAvailability::for_len(len);
    }

    /// A local read or save succeeded. Clears a local failure only.
    pub fn on_local_success(&mut self, len: usize) {
        if self.health == SystemHealth::LocalFailure {
            self.health = SystemHealth::Healthy;
        }
        self.availability = DataAvailability::for_len(len);
    }

    /// Settle a `Loading` availability left behind by an abandoned operation.
    pub fn settle(&mut self, len: usize) -> bool {
        if self.availability == DataAvailability::Loading {
            self.availability = DataAvailability::for_len(len);
            true
        } else {
            false
        }
    }
}
