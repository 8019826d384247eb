use crate::report::is_valid_policy_number;

use super::table::RawTable;

/// Column names tried before the remaining headers, in priority order.
pub const POLICY_COLUMN_CANDIDATES: [&str; 7] = [
    "Policy",
    "Company",
    "PolicyNumber",
    "PolicyNo",
    "Policy_Number",
    "POLICY",
    "COMPANY",
];

/// Minimum share of valid policy numbers a column needs to win on score.
pub const POLICY_SCORE_THRESHOLD: f64 = 0.3;

const POLICY_SAMPLE_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMethod {
    Scored { score: f64 },
    NumericFirstRow,
    FirstColumn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyColumn {
    pub name: String,
    pub method: DetectionMethod,
}

/// Picks the column that most likely carries policy numbers.
///
/// Returns `None` only for a table without columns or rows.
pub fn detect_policy_column(table: &RawTable) -> Option<PolicyColumn> {
    if table.is_empty() || table.columns.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in candidate_columns(table) {
        let Some(index) = table.column_index(candidate) else {
            continue;
        };
        let Some(score) = column_score(table, index) else {
            continue;
        };
        if score > best.map_or(0.0, |(_, top)| top) {
            best = Some((candidate, score));
        }
    }

    if let Some((name, score)) = best.filter(|&(_, score)| score >= POLICY_SCORE_THRESHOLD) {
        return Some(PolicyColumn {
            name: name.to_string(),
            method: DetectionMethod::Scored { score },
        });
    }

    let first_row = &table.rows[0];
    let numeric = table.columns.iter().enumerate().find(|(index, _)| {
        let value = table.cell(first_row, *index).trim();
        !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
    });
    if let Some((_, name)) = numeric {
        return Some(PolicyColumn {
            name: name.clone(),
            method: DetectionMethod::NumericFirstRow,
        });
    }

    Some(PolicyColumn {
        name: table.columns[0].clone(),
        method: DetectionMethod::FirstColumn,
    })
}

fn candidate_columns(table: &RawTable) -> impl Iterator<Item = &str> {
    POLICY_COLUMN_CANDIDATES
        .into_iter()
        .chain(table.columns.iter().map(String::as_str))
        .filter(|name| !name.is_empty())
}

/// Share of non-empty sampled cells that hold a valid policy number.
fn column_score(table: &RawTable, index: usize) -> Option<f64> {
    let (total, valid) = table
        .rows
        .iter()
        .take(POLICY_SAMPLE_ROWS)
        .map(|row| table.cell(row, index))
        .filter(|value| !value.is_empty())
        .fold((0usize, 0usize), |(total, valid), value| {
            (total + 1, valid + usize::from(is_valid_policy_number(value)))
        });
    (total > 0).then(|| valid as f64 / total as f64)
}
