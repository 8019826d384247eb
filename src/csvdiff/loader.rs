use tracing::{debug, warn};

use super::error::CsvLoadError;
use super::policy_column::{PolicyColumn, detect_policy_column};
use super::row::CsvRow;
use super::table::{RawTable, unwrap_quoted_lines};

/// Rows inspected when deciding whether the file needs quote repair.
const REPAIR_SAMPLE_ROWS: usize = 50;

#[derive(Debug, Clone)]
pub struct LoadedCsv {
    pub rows: Vec<CsvRow>,
    pub policy_column: PolicyColumn,
    pub repaired: bool,
}

/// Decodes upload bytes and loads them. Invalid UTF-8 is replaced, a
/// leading byte-order mark is dropped.
pub fn load_csv_bytes(bytes: &[u8]) -> Result<LoadedCsv, CsvLoadError> {
    let text = String::from_utf8_lossy(bytes);
    load_csv(text.strip_prefix('\u{feff}').unwrap_or(&text))
}

pub fn load_csv(content: &str) -> Result<LoadedCsv, CsvLoadError> {
    let mut table = parse_or_empty(content);
    let mut repaired = false;

    if needs_quote_repair(&table) {
        if let Some(unwrapped) = unwrap_quoted_lines(content) {
            debug!(rows = table.rows.len(), "re-reading CSV with outer quotes stripped");
            table = parse_or_empty(&unwrapped);
            repaired = true;
        }
    }

    let policy_column = detect_policy_column(&table).ok_or(CsvLoadError::Empty)?;
    let policy_index = table.column_index(&policy_column.name);

    let rows: Vec<CsvRow> = table
        .rows
        .iter()
        .filter_map(|raw| {
            let mut row: CsvRow = table
                .columns
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(index, name)| (name.as_str(), clean_cell(table.cell(raw, index))))
                .collect();
            if let Some(index) = policy_index {
                row.insert(CsvRow::POLICY_FIELD, clean_cell(table.cell(raw, index)));
            }
            (!row.is_blank()).then_some(row)
        })
        .collect();

    if rows.is_empty() {
        return Err(CsvLoadError::Empty);
    }

    debug!(
        rows = rows.len(),
        policy_column = %policy_column.name,
        repaired,
        "loaded CSV snapshot"
    );
    Ok(LoadedCsv {
        rows,
        policy_column,
        repaired,
    })
}

fn parse_or_empty(content: &str) -> RawTable {
    match RawTable::parse(content) {
        Ok(table) => table,
        Err(error) => {
            warn!(%error, "CSV parse failed");
            RawTable::default()
        }
    }
}

fn clean_cell(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A file with no rows, or where at least half the sampled rows put all of
/// their text into the first column, was most likely quoted line by line.
fn needs_quote_repair(table: &RawTable) -> bool {
    let sample = &table.rows[..table.rows.len().min(REPAIR_SAMPLE_ROWS)];
    if sample.is_empty() {
        return true;
    }
    let collapsed = sample
        .iter()
        .filter(|row| {
            let first = table.cell(row, 0).trim();
            !first.is_empty()
                && (1..table.columns.len()).all(|index| table.cell(row, index).trim().is_empty())
        })
        .count();
    collapsed * 2 >= sample.len()
}
