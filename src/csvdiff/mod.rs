//! Spreadsheet snapshot loading and policy-keyed comparison.

mod diff;
mod error;
mod loader;
mod policy_column;
mod row;
mod table;
#[cfg(test)]
mod tests;

pub use diff::{ComparisonResult, DiffOptions, compare_snapshots};
pub use loader::load_csv_bytes;
