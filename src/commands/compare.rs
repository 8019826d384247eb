use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{CompareArgs, CompareCommand, CompareConfirmArgs, ComparePreviewArgs};
use crate::csvdiff::{ComparisonResult, DiffOptions, compare_snapshots, load_csv_bytes};
use crate::extract::read_upload;
use crate::model::{CompareConfirmPayload, ComparePreviewPayload, FileMeta, parse_custom_data};
use crate::store::SnapshotStore;
use crate::util::{emit_json, normalize_filename, now_utc_string};

use super::display_name;

const FIRST_FILE_MESSAGE: &str = "First file: no previous CSV to compare.";
const COMPARED_MESSAGE: &str = "Comparison completed. Confirm the upload token to store this file.";

pub fn run(args: CompareArgs) -> Result<()> {
    match args.command {
        CompareCommand::Preview(args) => preview(args),
        CompareCommand::Confirm(args) => confirm(args),
    }
}

fn preview(args: ComparePreviewArgs) -> Result<()> {
    let new_name = display_name(&args.csv);
    let new_bytes = read_upload(&args.csv, args.max_upload_mb)?;
    let db_path = args.store.resolved_db_path();
    let store = SnapshotStore::open(&db_path)?;

    let previous = match &args.previous {
        Some(path) => Some((display_name(path), read_upload(path, args.max_upload_mb)?)),
        None => store
            .latest_snapshot()?
            .map(|snapshot| (snapshot.file_name, snapshot.content)),
    };

    let (message, comparison) = match previous {
        Some((old_name, old_bytes)) => {
            info!(new_file = %new_name, old_file = %old_name, "comparing against previous snapshot");
            let result = compare_snapshots(
                &new_bytes,
                &old_bytes,
                &new_name,
                &old_name,
                &diff_options(&args),
            )
            .with_context(|| format!("failed to compare {} against {}", new_name, old_name))?;
            (COMPARED_MESSAGE, result)
        }
        None => {
            warn!(db_path = %db_path.display(), "no previous snapshot, treating upload as first file");
            let loaded = load_csv_bytes(&new_bytes)
                .with_context(|| format!("failed to load {}", args.csv.display()))?;
            info!(
                rows = loaded.rows.len(),
                policy_column = %loaded.policy_column.name,
                detection = ?loaded.policy_column.method,
                repaired = loaded.repaired,
                "loaded first snapshot"
            );
            (
                FIRST_FILE_MESSAGE,
                ComparisonResult::first_snapshot(new_name.as_str(), loaded.rows),
            )
        }
    };

    let upload_token = store.stage_pending(&new_name, &new_bytes, &now_utc_string())?;
    let payload = ComparePreviewPayload {
        message: message.to_string(),
        upload_token,
        file: FileMeta::new(new_name, new_bytes.len() as u64, "text/csv"),
        comparison,
        custom_data: parse_custom_data(args.custom_data.as_deref()),
    };
    emit_json(args.output.as_deref(), &payload)
}

fn confirm(args: CompareConfirmArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let mut store = SnapshotStore::open(&db_path)?;

    let Some(pending) = store.pending(&args.token)? else {
        bail!("upload token not found or expired: {}", args.token);
    };
    info!(
        token = %pending.token,
        original_name = %pending.original_name,
        staged_at = %pending.created_at,
        "confirming staged upload"
    );
    let file_name = normalize_filename(&pending.original_name, Utc::now());
    let Some(snapshot) = store.confirm(&args.token, &file_name, &now_utc_string())? else {
        bail!("upload token not found or expired: {}", args.token);
    };

    let payload = CompareConfirmPayload {
        message: format!("File confirmed and saved as {file_name}"),
        snapshot,
    };
    emit_json(args.output.as_deref(), &payload)
}

/// Built-in field lists unless overridden on the command line.
fn diff_options(args: &ComparePreviewArgs) -> DiffOptions {
    let mut options = DiffOptions::default();
    if !args.compare_fields.is_empty() {
        options.fields = args.compare_fields.clone();
    }
    if !args.numeric_fields.is_empty() {
        options.numeric_fields = args.numeric_fields.clone();
    }
    options
}
