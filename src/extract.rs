//! Upload reading and PDF-to-text conversion through `pdftotext`.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::TextBackend;

/// A layout pass with fewer visible characters than this is retried raw.
const MIN_LAYOUT_TEXT_CHARS: usize = 50;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Reads an upload, rejecting files above `max_upload_mb` before loading
/// them into memory.
pub fn read_upload(path: &Path, max_upload_mb: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to stat upload: {}", path.display()))?;
    if metadata.len() > max_upload_mb * BYTES_PER_MB {
        bail!(
            "file too large: {} is {} bytes, limit is {} MB",
            path.display(),
            metadata.len(),
            max_upload_mb
        );
    }
    fs::read(path).with_context(|| format!("failed to read upload: {}", path.display()))
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Returns sanitized report text. PDFs go through `pdftotext`; anything
/// else is taken as already-extracted text.
pub fn report_text(path: &Path, bytes: &[u8], backend: TextBackend) -> Result<String> {
    if !is_pdf(path) {
        debug!(path = %path.display(), "reading upload as plain text");
        return Ok(sanitize_text(&String::from_utf8_lossy(bytes)));
    }

    let text = match backend {
        TextBackend::Layout => run_pdftotext(path, true)?,
        TextBackend::Raw => run_pdftotext(path, false)?,
        TextBackend::Auto => {
            let layout = run_pdftotext(path, true)?;
            if visible_chars(&layout) >= MIN_LAYOUT_TEXT_CHARS {
                layout
            } else {
                warn!(
                    path = %path.display(),
                    chars = visible_chars(&layout),
                    "layout extraction nearly empty, retrying in raw mode"
                );
                run_pdftotext(path, false)?
            }
        }
    };

    let text = sanitize_text(&text);
    info!(path = %path.display(), chars = text.len(), "extracted report text");
    Ok(text)
}

fn run_pdftotext(pdf_path: &Path, layout: bool) -> Result<String> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8");
    if layout {
        command.arg("-layout");
    } else {
        command.arg("-raw");
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|ch| !ch.is_whitespace()).count()
}

/// Normalizes extractor output into plain lines: NULs dropped, page breaks
/// and carriage returns removed, uncommon spaces made ASCII, tabs expanded.
pub fn sanitize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\u{0000}' | '\r' => {}
            '\u{000C}' => out.push('\n'),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            '\t' => out.push_str("    "),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_uncommon_whitespace() {
        let raw = "A\u{00A0}B\tC\r\n\u{000C}D\u{0000}E\u{202F}F";
        assert_eq!(sanitize_text(raw), "A B    C\n\nDE F");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type(Path::new("report.PDF")), "application/pdf");
        assert_eq!(content_type(Path::new("book.csv")), "text/csv");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
        assert!(is_pdf(Path::new("x.Pdf")));
        assert!(!is_pdf(Path::new("x.txt")));
    }

    #[test]
    fn plain_text_uploads_skip_pdftotext() {
        let text = report_text(Path::new("report.txt"), b"SUBMITTED\r\n", TextBackend::Auto)
            .expect("plain text");
        assert_eq!(text, "SUBMITTED\n");
    }

    #[test]
    fn oversized_uploads_are_rejected() {
        let dir = std::env::temp_dir().join(format!("policy-intake-extract-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("big.txt");
        fs::write(&path, vec![b'x'; (BYTES_PER_MB + 1) as usize]).expect("write");

        let error = read_upload(&path, 1).expect_err("over limit");
        assert!(error.to_string().contains("file too large"));
        assert_eq!(read_upload(&path, 2).expect("under limit").len(), (BYTES_PER_MB + 1) as usize);

        fs::remove_dir_all(&dir).expect("cleanup");
    }
}
