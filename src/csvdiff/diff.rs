use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::normalize::parse_decimal;

use super::error::{CsvLoadError, SnapshotRole};
use super::loader::load_csv_bytes;
use super::row::CsvRow;

/// Columns compared between two snapshots of the same policy.
pub const COMPARISON_FIELDS: [&str; 26] = [
    "WritingAgent",
    "AgentName",
    "Company",
    "Status",
    "DOB",
    "PolicyDate",
    "PaidtoDate",
    "RecvDate",
    "LastName",
    "FirstName",
    "MI",
    "Plan",
    "Face",
    "Form",
    "Mode",
    "ModePrem",
    "Address1",
    "Address2",
    "Address3",
    "Address4",
    "State",
    "Zip",
    "Phone",
    "Email",
    "App Date",
    "WrtPct",
];

/// Comparison fields read as numbers.
pub const NUMERIC_FIELDS: [&str; 3] = ["Face", "ModePrem", "WrtPct"];

/// Numeric differences up to and including one cent are ignored.
const NUMERIC_TOLERANCE_CENTS: i64 = 1;

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub fields: Vec<String>,
    pub numeric_fields: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            fields: COMPARISON_FIELDS.iter().map(|f| f.to_string()).collect(),
            numeric_fields: NUMERIC_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl DiffOptions {
    fn is_numeric(&self, field: &str) -> bool {
        self.numeric_fields.iter().any(|numeric| numeric == field)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChangeSet {
    pub added: Vec<CsvRow>,
    pub modified: Vec<CsvRow>,
}

impl ChangeSet {
    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub new_file: String,
    pub old_file: Option<String>,
    pub total_changes: usize,
    pub new_records: usize,
    pub modified_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub comparison_summary: ComparisonSummary,
    pub added_records: Vec<CsvRow>,
    pub modified_records: Vec<CsvRow>,
}

impl ComparisonResult {
    /// First upload of a spreadsheet: every row counts as added.
    pub fn first_snapshot(new_file: impl Into<String>, rows: Vec<CsvRow>) -> Self {
        Self::from_changes(
            new_file.into(),
            None,
            ChangeSet {
                added: rows,
                modified: Vec::new(),
            },
        )
    }

    pub fn from_changes(new_file: String, old_file: Option<String>, changes: ChangeSet) -> Self {
        Self {
            comparison_summary: ComparisonSummary {
                new_file,
                old_file,
                total_changes: changes.total(),
                new_records: changes.added.len(),
                modified_records: changes.modified.len(),
            },
            added_records: changes.added,
            modified_records: changes.modified,
        }
    }
}

/// Loads both snapshots and reports what changed from `old` to `new`.
pub fn compare_snapshots(
    new_content: &[u8],
    old_content: &[u8],
    new_file: &str,
    old_file: &str,
    options: &DiffOptions,
) -> Result<ComparisonResult, CsvLoadError> {
    let new = load_csv_bytes(new_content)?;
    let old = load_csv_bytes(old_content)?;
    let changes = diff_rows(&new.rows, &old.rows, options)?;
    info!(
        new_file,
        old_file,
        new_policy_column = %new.policy_column.name,
        old_policy_column = %old.policy_column.name,
        repaired = new.repaired || old.repaired,
        added = changes.added.len(),
        modified = changes.modified.len(),
        "compared snapshots"
    );
    Ok(ComparisonResult::from_changes(
        new_file.to_string(),
        Some(old_file.to_string()),
        changes,
    ))
}

/// Rows are matched on their policy value; a repeated policy keeps its last
/// row. Output is ordered by policy.
pub fn diff_rows(
    new: &[CsvRow],
    old: &[CsvRow],
    options: &DiffOptions,
) -> Result<ChangeSet, CsvLoadError> {
    let new_index = index_by_policy(new, SnapshotRole::New)?;
    let old_index = index_by_policy(old, SnapshotRole::Old)?;

    let mut changes = ChangeSet::default();
    for (policy, new_row) in new_index {
        match old_index.get(policy) {
            None => changes.added.push(new_row.clone()),
            Some(old_row) if row_changed(old_row, new_row, options) => {
                changes.modified.push(new_row.clone())
            }
            Some(_) => {}
        }
    }
    Ok(changes)
}

fn index_by_policy(rows: &[CsvRow], role: SnapshotRole) -> Result<BTreeMap<&str, &CsvRow>, CsvLoadError> {
    let index: BTreeMap<&str, &CsvRow> = rows
        .iter()
        .filter_map(|row| row.policy().map(|policy| (policy, row)))
        .collect();
    if index.is_empty() {
        return Err(CsvLoadError::MissingPolicyColumn { snapshot: role });
    }
    Ok(index)
}

fn row_changed(old: &CsvRow, new: &CsvRow, options: &DiffOptions) -> bool {
    options.fields.iter().any(|field| {
        field_differs(
            old.get(field).unwrap_or(""),
            new.get(field).unwrap_or(""),
            options.is_numeric(field),
        )
    })
}

/// Compares two cell values case-insensitively. Numeric cells that both
/// parse are compared exactly, ignoring differences of one cent or less;
/// anything else falls back to text.
pub fn field_differs(old: &str, new: &str, numeric: bool) -> bool {
    let old = old.trim().to_lowercase();
    let new = new.trim().to_lowercase();
    if numeric {
        if let (Some(a), Some(b)) = (numeric_value(&old), numeric_value(&new)) {
            let tolerance = Decimal::new(NUMERIC_TOLERANCE_CENTS, 2);
            return a
                .checked_sub(b)
                .is_none_or(|delta| delta.abs() > tolerance);
        }
    }
    old != new
}

fn numeric_value(value: &str) -> Option<Decimal> {
    if value.is_empty() {
        Some(Decimal::ZERO)
    } else {
        parse_decimal(value)
    }
}
