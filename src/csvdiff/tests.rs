use super::diff::{COMPARISON_FIELDS, NUMERIC_FIELDS, diff_rows, field_differs};
use super::error::{CsvLoadError, SnapshotRole};
use super::loader::load_csv;
use super::policy_column::{DetectionMethod, detect_policy_column};
use super::row::CsvRow;
use super::table::{RawTable, unwrap_quoted_lines};
use super::*;

const CLEAN: &str = "\
Policy,LastName,FirstName,Face,Status
0108338110,SMITH,JOHN,\"100,000.00\",Active
0108338111,DOE,JANE,\"50,000.00\",Pending
";

fn compare(new: &str, old: &str, options: &DiffOptions) -> ComparisonResult {
    compare_snapshots(new.as_bytes(), old.as_bytes(), "new.csv", "old.csv", options)
        .expect("snapshots compare")
}

fn quote_every_line(content: &str) -> String {
    content
        .lines()
        .map(|line| format!("\"{}\"", line.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn clean_file_loads_without_repair() {
    let loaded = load_csv(CLEAN).expect("csv should load");
    assert!(!loaded.repaired);
    assert_eq!(loaded.rows.len(), 2);
    assert_eq!(loaded.policy_column.name, "Policy");
    assert_eq!(loaded.rows[0].get("Face"), Some("100,000.00"));
    assert_eq!(loaded.rows[1].policy(), Some("0108338111"));
}

#[test]
fn doubly_quoted_export_is_repaired() {
    let wrapped = quote_every_line(CLEAN);
    let before = RawTable::parse(&wrapped).expect("csv should parse");
    assert_eq!(before.columns.len(), 1);

    let loaded = load_csv(&wrapped).expect("csv should load");
    let clean = load_csv(CLEAN).expect("csv should load");
    assert!(loaded.repaired);
    assert_eq!(loaded.rows, clean.rows);
    assert_eq!(loaded.rows[0].len(), 5);
}

#[test]
fn unwrap_leaves_ordinary_lines_alone() {
    let text = "a,b\n\"x\",y\n\"say \"\"hi\"\"\"";
    assert_eq!(
        unwrap_quoted_lines(text).as_deref(),
        Some("a,b\n\"x\",y\nsay \"hi\"")
    );
    assert_eq!(unwrap_quoted_lines("a,b\n\"x\",y\n"), None);
}

fn partly_wrapped(wrapped_rows: usize) -> String {
    let rows = [
        "0108338110,SMITH,Active",
        "0108338111,DOE,Pending",
        "0108338112,ROE,Issued",
        "0108338113,POE,Lapsed",
    ];
    let mut content = String::from("Policy,LastName,Status\n");
    for (index, row) in rows.iter().enumerate() {
        if index < wrapped_rows {
            content.push_str(&format!("\"{row}\"\n"));
        } else {
            content.push_str(&format!("{row}\n"));
        }
    }
    content
}

#[test]
fn repair_triggers_when_half_the_sample_is_collapsed() {
    let loaded = load_csv(&partly_wrapped(2)).expect("csv should load");
    assert!(loaded.repaired);
    assert!(loaded.rows.iter().all(|row| row.get("LastName").is_some()));
    assert_eq!(loaded.rows[0].policy(), Some("0108338110"));
}

#[test]
fn repair_skipped_below_half_collapsed() {
    let loaded = load_csv(&partly_wrapped(1)).expect("csv should load");
    assert!(!loaded.repaired);
    assert_eq!(loaded.rows[0].get("Policy"), Some("0108338110,SMITH,Active"));
    assert_eq!(loaded.rows[0].get("LastName"), None);
    assert_eq!(loaded.rows[1].get("LastName"), Some("DOE"));
}

#[test]
fn single_column_file_is_not_reported_as_repaired() {
    let loaded = load_csv("Policy\n0108338110\n0108338111\n").expect("csv should load");
    assert!(!loaded.repaired);
    assert_eq!(loaded.rows.len(), 2);
    assert_eq!(loaded.policy_column.name, "Policy");
}

#[test]
fn policy_column_found_by_score_over_preferred_name() {
    let csv = "\
Company,Ref,Name
ACME,0108338110,ALICE
ACME,0108338111,BOB
";
    let loaded = load_csv(csv).expect("csv should load");
    assert_eq!(loaded.policy_column.name, "Ref");
    assert_eq!(loaded.rows[0].policy(), Some("0108338110"));
    // the synthesized key is appended after the original columns
    assert_eq!(loaded.rows[0].iter().last(), Some(("Policy", Some("0108338110"))));
}

fn scored_table(valid: usize) -> RawTable {
    let mut content = String::from("Id,Policy\n");
    for row in 0..100 {
        let policy = if row < valid {
            format!("{:010}", 108_300_000 + row)
        } else {
            format!("X-{row}")
        };
        content.push_str(&format!("{},{policy}\n", row + 1));
    }
    RawTable::parse(&content).expect("csv should parse")
}

#[test]
fn policy_column_threshold_is_inclusive() {
    let chosen = detect_policy_column(&scored_table(30)).expect("table has columns");
    assert_eq!(chosen.name, "Policy");
    assert_eq!(chosen.method, DetectionMethod::Scored { score: 0.3 });
}

#[test]
fn below_threshold_falls_back_to_numeric_first_row() {
    let chosen = detect_policy_column(&scored_table(29)).expect("table has columns");
    assert_eq!(chosen.name, "Id");
    assert_eq!(chosen.method, DetectionMethod::NumericFirstRow);
}

#[test]
fn without_digits_first_column_wins() {
    let table = RawTable::parse("Name,Note\nALICE,hello\n").expect("csv should parse");
    let chosen = detect_policy_column(&table).expect("table has columns");
    assert_eq!(chosen.name, "Name");
    assert_eq!(chosen.method, DetectionMethod::FirstColumn);
}

#[test]
fn empty_content_is_an_error() {
    assert_eq!(load_csv("").expect_err("load should fail"), CsvLoadError::Empty);
    assert_eq!(load_csv("Policy,Face\n").expect_err("load should fail"), CsvLoadError::Empty);
    assert_eq!(load_csv_bytes(b" , \n , \n").expect_err("load should fail"), CsvLoadError::Empty);
}

#[test]
fn blank_rows_are_dropped_and_cells_trimmed() {
    let csv = "\
 Policy , LastName
 0108338110 ,  SMITH 
 , 
0108338111,
";
    let loaded = load_csv(csv).expect("csv should load");
    assert_eq!(loaded.rows.len(), 2);
    assert_eq!(loaded.rows[0].get("LastName"), Some("SMITH"));
    assert_eq!(loaded.rows[1].get("LastName"), None);
    assert!(loaded.rows[1].iter().any(|(key, _)| key == "LastName"));
}

#[test]
fn short_rows_read_missing_cells_as_empty() {
    let loaded = load_csv("Policy,LastName,Face\n0108338110\n0108338111,DOE,1\n")
        .expect("csv should load");
    assert_eq!(loaded.rows[0].get("Face"), None);
    assert_eq!(loaded.rows[1].get("Face"), Some("1"));
}

#[test]
fn byte_order_mark_is_ignored() {
    let mut bytes = "\u{feff}".as_bytes().to_vec();
    bytes.extend_from_slice(CLEAN.as_bytes());
    let loaded = load_csv_bytes(&bytes).expect("csv should load");
    assert_eq!(loaded.policy_column.name, "Policy");
}

#[test]
fn identical_snapshots_have_no_changes() {
    let result = compare(CLEAN, CLEAN, &DiffOptions::default());
    assert_eq!(result.comparison_summary.total_changes, 0);
    assert!(result.added_records.is_empty());
    assert!(result.modified_records.is_empty());
}

#[test]
fn numeric_changes_respect_tolerance() {
    let old = "Policy,Face\n0108338110,\"100,000.00\"\n";
    let cent = "Policy,Face\n0108338110,100000.01\n";
    let two_cents = "Policy,Face\n0108338110,100000.02\n";
    let options = DiffOptions::default();

    let result = compare(cent, old, &options);
    assert!(result.modified_records.is_empty());

    let result = compare(two_cents, old, &options);
    assert_eq!(result.modified_records.len(), 1);
    assert_eq!(result.modified_records[0].get("Face"), Some("100000.02"));
}

#[test]
fn cent_tolerance_holds_for_large_amounts() {
    for (old, new) in [
        ("25000000.00", "25000000.01"),
        ("25,000,000.00", "25000000.01"),
        ("123456789.00", "123456789.01"),
        ("999999999999.99", "1,000,000,000,000.00"),
    ] {
        assert!(!field_differs(old, new, true), "{old} -> {new}");
    }
    assert!(field_differs("25000000.00", "25000000.02", true));
    assert!(field_differs("123456789.00", "123456788.98", true));

    let old = "Policy,Face\n0108338110,\"25,000,000.00\"\n";
    let new = "Policy,Face\n0108338110,25000000.01\n";
    let result = compare(new, old, &DiffOptions::default());
    assert!(result.modified_records.is_empty());
}

#[test]
fn field_comparison_rules() {
    assert!(!field_differs(" Active ", "ACTIVE", false));
    assert!(field_differs("Active", "Lapsed", false));
    assert!(!field_differs("", "0", true));
    assert!(!field_differs("1,000", "1000.00", true));
    assert!(field_differs("n/a", "0", true));
    assert!(!field_differs("-5", "-5.00", true));
    assert!(!field_differs("N/A", "n/a", true));
}

#[test]
fn added_and_modified_rows_are_reported_from_new_snapshot() {
    let old = "\
Policy,LastName,Status
0108338110,SMITH,Active
0108338111,DOE,Pending
";
    let new = "\
Policy,LastName,Status,Extra
0108338112,ROE,Pending,x
0108338111,DOE,Issued,y
0108338110,smith,active,z
";
    let result = compare(new, old, &DiffOptions::default());
    let summary = &result.comparison_summary;
    assert_eq!((summary.new_records, summary.modified_records, summary.total_changes), (1, 1, 2));
    assert_eq!(result.added_records[0].policy(), Some("0108338112"));
    assert_eq!(result.modified_records[0].get("Status"), Some("Issued"));
    assert_eq!(result.modified_records[0].get("Extra"), Some("y"));
}

#[test]
fn fields_outside_the_configured_set_are_ignored() {
    let old = "Policy,Status\n0108338110,Active\n";
    let new = "Policy,Status\n0108338110,Lapsed\n";
    let options = DiffOptions {
        fields: vec!["LastName".to_string()],
        numeric_fields: Vec::new(),
    };
    let result = compare(new, old, &options);
    assert_eq!(result.comparison_summary.total_changes, 0);
}

#[test]
fn rows_without_policy_values_cannot_be_diffed() {
    let row: CsvRow = [("Policy", None::<String>), ("Face", Some("1".to_string()))]
        .into_iter()
        .collect();
    let good: CsvRow = [("Policy", Some("0108338110"))].into_iter().collect();
    let error = diff_rows(&[good.clone()], &[row.clone()], &DiffOptions::default())
        .expect_err("diff should fail");
    assert_eq!(
        error,
        CsvLoadError::MissingPolicyColumn {
            snapshot: SnapshotRole::Old
        }
    );
    let error = diff_rows(&[row], &[good], &DiffOptions::default())
        .expect_err("diff should fail");
    assert_eq!(error.to_string(), "'Policy' column not found in the new file");
}

#[test]
fn first_snapshot_reports_every_row_as_added() {
    let loaded = load_csv(CLEAN).expect("csv should load");
    let result = ComparisonResult::first_snapshot("new.csv", loaded.rows);
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["comparison_summary"]["total_changes"], 2);
    assert_eq!(json["comparison_summary"]["old_file"], serde_json::Value::Null);
    assert_eq!(json["added_records"][0]["LastName"], "SMITH");
    assert_eq!(json["modified_records"].as_array().map(Vec::len), Some(0));
}

#[test]
fn default_options_cover_numeric_fields() {
    let options = DiffOptions::default();
    assert_eq!(options.fields.len(), COMPARISON_FIELDS.len());
    assert!(NUMERIC_FIELDS.iter().all(|field| options.fields.iter().any(|f| f == field)));
}
