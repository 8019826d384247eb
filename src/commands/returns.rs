use anyhow::Result;
use tracing::info;

use crate::cli::ReportArgs;
use crate::model::{ReturnCounts, ReturnsPayload, parse_custom_data};
use crate::report::ReturnsParser;
use crate::util::emit_json;

use super::ReportUpload;

pub fn run(args: ReportArgs) -> Result<()> {
    let upload = ReportUpload::load(&args)?;
    let parser = ReturnsParser::new()?;
    let report = parser.parse_report(&upload.text);

    let count = ReturnCounts {
        returned_items: report.items.returned_items.len(),
        returned_pre_notes: report.items.returned_pre_notes.len(),
        total: report.items.total(),
    };
    info!(
        report_date = %report.report_date.as_deref().unwrap_or("unknown"),
        returned_items = count.returned_items,
        returned_pre_notes = count.returned_pre_notes,
        page_headers = report.stats.page_headers,
        section_headers = report.stats.section_headers,
        item_candidates = report.stats.item_candidates,
        short_item_lines = report.stats.short_item_lines,
        items_without_bill_day = report.stats.items_without_bill_day,
        "parsed return drafts report"
    );

    let payload = ReturnsPayload {
        report_type: "returns",
        document_type: args.document_type.clone(),
        report_date: report.report_date,
        count,
        returned_items: report.items.returned_items,
        returned_pre_notes: report.items.returned_pre_notes,
        text: upload.sample(args.text_sample),
        file: upload.file,
        custom_data: parse_custom_data(args.custom_data.as_deref()),
    };
    emit_json(args.output.as_deref(), &payload)
}
