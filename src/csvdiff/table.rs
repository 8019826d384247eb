use std::collections::HashMap;

use csv::ReaderBuilder;

/// Header-keyed cells as read from the CSV, before any trimming.
///
/// `columns` holds each distinct trimmed header once, in first-seen order.
/// A repeated header resolves to its last occurrence. Cells missing from a
/// short row are `None`; surplus cells are discarded.
#[derive(Debug, Default, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn parse(content: &str) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (position, header) in headers.iter().enumerate() {
            let name = header.trim().to_string();
            if !positions.contains_key(&name) {
                columns.push(name.clone());
            }
            positions.insert(name, position);
        }
        let indices: Vec<usize> = columns.iter().map(|name| positions[name]).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                indices
                    .iter()
                    .map(|&index| record.get(index).map(str::to_string))
                    .collect(),
            );
        }

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Raw cell text, `""` when the row is short.
    pub fn cell<'a>(&self, row: &'a [Option<String>], index: usize) -> &'a str {
        row.get(index).and_then(|value| value.as_deref()).unwrap_or("")
    }
}

/// Strips one layer of wrapping quotes from lines that were exported with
/// every physical line quoted and its inner quotes doubled. Returns `None`
/// when no line is wrapped.
pub fn unwrap_quoted_lines(content: &str) -> Option<String> {
    let mut rewritten = false;
    let lines: Vec<String> = content
        .lines()
        .map(|line| {
            let line = line.trim_end_matches('\r');
            if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
                rewritten = true;
                line[1..line.len() - 1].replace("\"\"", "\"")
            } else {
                line.to_string()
            }
        })
        .collect();
    rewritten.then(|| lines.join("\n"))
}
