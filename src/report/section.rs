use serde::Serialize;

use crate::normalize::normalize_whitespace;

/// Status block of an underwriting activity report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
pub enum Section {
    #[serde(rename = "SUBMITTED")]
    Submitted,
    #[serde(rename = "UNDERWRITING REQUIREMENTS ADDED")]
    UnderwritingRequirementsAdded,
    #[serde(rename = "UNDERWRITING REQUIREMENTS UPDATED")]
    UnderwritingRequirementsUpdated,
    #[serde(rename = "ISSUED")]
    Issued,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "DECLINE")]
    Decline,
    #[serde(rename = "INCOMPLETE")]
    Incomplete,
    #[serde(rename = "WITHDRAWN")]
    Withdrawn,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Which line grammar applies to data lines inside a section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Grammar {
    PolicyActivity,
    Requirement,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::UnderwritingRequirementsAdded => "UNDERWRITING REQUIREMENTS ADDED",
            Self::UnderwritingRequirementsUpdated => "UNDERWRITING REQUIREMENTS UPDATED",
            Self::Issued => "ISSUED",
            Self::Delivered => "DELIVERED",
            Self::Decline => "DECLINE",
            Self::Incomplete => "INCOMPLETE",
            Self::Withdrawn => "WITHDRAWN",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn grammar(self) -> Grammar {
        match self {
            Self::UnderwritingRequirementsAdded | Self::UnderwritingRequirementsUpdated => {
                Grammar::Requirement
            }
            _ => Grammar::PolicyActivity,
        }
    }

    /// Recognizes a section header line. Rules are evaluated in priority
    /// order and the first match wins, so "UNDERWRITING REQUIREMENTS ADDED"
    /// never falls through to a plainer keyword.
    pub fn detect(line: &str) -> Option<Self> {
        let upper = collapse_upper(line);
        if upper.is_empty() {
            return None;
        }

        let requirements = upper.contains("UNDERWRITING REQUIREMENTS");
        if requirements && upper.contains("ADDED") {
            return Some(Self::UnderwritingRequirementsAdded);
        }
        if requirements && upper.contains("UPDATED") {
            return Some(Self::UnderwritingRequirementsUpdated);
        }

        const KEYWORDS: [(&str, Section); 6] = [
            ("SUBMITTED", Section::Submitted),
            ("ISSUED", Section::Issued),
            ("DELIVERED", Section::Delivered),
            ("DECLINE", Section::Decline),
            ("INCOMPLETE", Section::Incomplete),
            ("WITHDRAWN", Section::Withdrawn),
        ];

        KEYWORDS
            .iter()
            .find(|(keyword, _)| upper.contains(keyword))
            .map(|(_, section)| *section)
    }
}

/// Tracks the active underwriting section across lines.
#[derive(Debug, Default)]
pub struct SectionTracker {
    current: Section,
}

impl SectionTracker {
    pub fn current(&self) -> Section {
        self.current
    }

    /// Returns true when `line` was a header and has been consumed.
    pub fn observe(&mut self, line: &str) -> bool {
        match Section::detect(line) {
            Some(section) => {
                self.current = section;
                true
            }
            None => false,
        }
    }
}

/// Block of a return-drafts report.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum ReturnSection {
    #[serde(rename = "RETURNED ITEMS")]
    ReturnedItems,
    #[serde(rename = "RETURNED PRE-NOTES")]
    ReturnedPreNotes,
}

impl ReturnSection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReturnedItems => "RETURNED ITEMS",
            Self::ReturnedPreNotes => "RETURNED PRE-NOTES",
        }
    }

    pub fn detect(line: &str) -> Option<Self> {
        let upper = collapse_upper(line);
        if upper.contains("RETURNED ITEMS") {
            Some(Self::ReturnedItems)
        } else if upper.contains("RETURNED PRE-NOTES") || upper.contains("RETURNED PRE NOTES") {
            Some(Self::ReturnedPreNotes)
        } else {
            None
        }
    }
}

fn collapse_upper(line: &str) -> String {
    normalize_whitespace(line).to_uppercase()
}
