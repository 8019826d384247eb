pub mod compare;
pub mod returns;
pub mod status;
pub mod underwriting;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::ReportArgs;
use crate::extract::{content_type, read_upload, report_text};
use crate::model::{FileMeta, TextSample};
use crate::normalize::leading_chars;

const TEXT_SAMPLE_CHARS: usize = 1500;

/// Extracted report text plus what the payload says about the upload.
struct ReportUpload {
    text: String,
    file: FileMeta,
}

impl ReportUpload {
    fn load(args: &ReportArgs) -> Result<Self> {
        let bytes = read_upload(&args.input, args.max_upload_mb)?;
        let file = FileMeta::new(
            display_name(&args.input),
            bytes.len() as u64,
            content_type(&args.input),
        );
        info!(
            input = %args.input.display(),
            size_mb = file.size_mb,
            backend = args.text_backend.as_str(),
            "loading report"
        );
        let text = report_text(&args.input, &bytes, args.text_backend)?;
        Ok(Self { text, file })
    }

    fn sample(&self, requested: bool) -> Option<TextSample> {
        requested.then(|| TextSample {
            text_sample: leading_chars(&self.text, TEXT_SAMPLE_CHARS).to_string(),
            text_len: self.text.chars().count(),
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
