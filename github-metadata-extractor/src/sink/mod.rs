//! Terminal destinations of a run.

mod error;
mod files;

pub use error::SinkError;
pub use files::FileSink;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a run delivers its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// JSON files in the output directory.
    Files,
    /// Assets uploaded to the catalog.
    Catalog,
    /// Output is only returned to the caller.
    #[default]
    None,
}

impl SinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Catalog => "catalog",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "files" | "file" => Ok(Self::Files),
            "catalog" => Ok(Self::Catalog),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown sink '{other}', expected one of: files, catalog, none"
            )),
        }
    }
}

/// What a sink produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkOutcome {
    /// Files written, in write order.
    Files { paths: Vec<PathBuf> },
    /// Assets transformed and uploaded.
    Catalog { assets: usize, created: usize },
    None,
}
