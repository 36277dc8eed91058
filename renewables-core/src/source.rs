//! Source kinds and source selection.

use std::fmt;
use std::str::FromStr;

/// A renewable telemetry source. Determines the connector, the URL template,
/// and the payload parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Wind,
    Solar,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Wind, SourceKind::Solar];

    /// Name used in logs and as the output file prefix.
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Wind => "wind",
            SourceKind::Solar => "solar",
        }
    }

    /// Remote resource name under `<date>/renewables/`.
    pub fn resource(&self) -> &'static str {
        match self {
            SourceKind::Wind => "windgen.csv",
            SourceKind::Solar => "solargen.json",
        }
    }

    /// Content type the API serves for this source.
    pub fn content_type(&self) -> &'static str {
        match self {
            SourceKind::Wind => "text/csv",
            SourceKind::Solar => "application/json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which sources a run should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    Wind,
    Solar,
    All,
}

impl SourceSelection {
    /// Expand into source kinds, in a fixed order.
    pub fn kinds(&self) -> Vec<SourceKind> {
        match self {
            SourceSelection::Wind => vec![SourceKind::Wind],
            SourceSelection::Solar => vec![SourceKind::Solar],
            SourceSelection::All => SourceKind::ALL.to_vec(),
        }
    }
}

impl FromStr for SourceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wind" => Ok(SourceSelection::Wind),
            "solar" => Ok(SourceSelection::Solar),
            "all" => Ok(SourceSelection::All),
            other => Err(format!(
                "unknown source '{other}'. Valid: wind, solar, all"
            )),
        }
    }
}
