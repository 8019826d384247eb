use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::StatusPayload;
use crate::store::{SnapshotStore, StoreCounts};
use crate::util::write_json_stdout;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    info!(store_root = %args.store.store_root.display(), "status requested");

    let (counts, latest_snapshot) = if db_path.exists() {
        let store = SnapshotStore::open(&db_path)?;
        let counts = store.counts()?;
        let latest = store.latest_snapshot()?;
        info!(
            path = %db_path.display(),
            snapshots = counts.snapshots,
            pending_uploads = counts.pending_uploads,
            latest = %latest.as_ref().map(|s| s.file_name.as_str()).unwrap_or_default(),
            "store status"
        );
        (counts, latest)
    } else {
        warn!(path = %db_path.display(), "snapshot store missing");
        (StoreCounts::default(), None)
    };

    write_json_stdout(&StatusPayload {
        db_path: db_path.display().to_string(),
        counts,
        latest_snapshot,
    })
}
