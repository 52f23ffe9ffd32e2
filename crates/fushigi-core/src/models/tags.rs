//! Classification labels used to pick and filter grammar points

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Usage context of a grammar point.
///
/// Grammar points store the context as free text so unknown labels from the
/// backend survive a sync; this enum covers the labels the app knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    #[default]
    All,
    Spoken,
    Written,
    Business,
}

impl Context {
    pub const ALL: [Self; 4] = [Self::All, Self::Spoken, Self::Written, Self::Business];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Spoken => "spoken",
            Self::Written => "written",
            Self::Business => "business",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::All => "All Contexts",
            Self::Spoken => "Spoken",
            Self::Written => "Written",
            Self::Business => "Business",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Context {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|context| context.as_str() == folded)
            .ok_or_else(|| format!("unknown context '{s}'"))
    }
}

/// Which daily practice subset to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Random,
    Srs,
}

impl SourceMode {
    /// Stable lowercase key, matching the serde form
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Srs => "srs",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Srs => "SRS",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
