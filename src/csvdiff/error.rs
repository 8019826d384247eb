use std::fmt;

use thiserror::Error;

/// Which side of a comparison a snapshot sits on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SnapshotRole {
    New,
    Old,
}

impl fmt::Display for SnapshotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::Old => f.write_str("old"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvLoadError {
    #[error("empty or invalid CSV content")]
    Empty,

    #[error("'Policy' column not found in the {snapshot} file")]
    MissingPolicyColumn { snapshot: SnapshotRole },
}
