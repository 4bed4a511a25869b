//! Record model: the two entity shapes and their markdown file format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod backlog;
pub mod meeting;

/// The two record kinds managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Backlog,
    Meeting,
}

impl RecordKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Meeting => "meeting",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = crate::error::StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "meeting" => Ok(Self::Meeting),
            _ => Err(crate::error::StoreError::validation(
                "kind",
                format!("'{s}' is not one of: backlog, meeting"),
            )),
        }
    }
}

/// Read the value after a bold `**Key:**` marker, if the line carries it.
pub(crate) fn field_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.strip_prefix(marker).map(str::trim)
}

pub(crate) use field_value as md_field;
