use anyhow::Result;
use tracing::info;

use crate::cli::ReportArgs;
use crate::model::{UnderwritingPayload, parse_custom_data};
use crate::report::UnderwritingParser;
use crate::util::emit_json;

use super::ReportUpload;

pub fn run(args: ReportArgs) -> Result<()> {
    let upload = ReportUpload::load(&args)?;
    let parser = UnderwritingParser::new()?;
    let report = parser.parse_report(&upload.text);

    let requirements = report
        .records
        .iter()
        .filter(|record| record.is_requirement())
        .count();
    info!(
        report_date = %report.report_date.as_deref().unwrap_or("unknown"),
        records = report.records.len(),
        requirements,
        header_lines = report.stats.header_lines,
        data_lines = report.stats.data_lines,
        dropped_lines = report.stats.dropped_lines,
        strict_hits = report.stats.strict_policy_hits + report.stats.strict_requirement_hits,
        column_fallbacks = report.stats.column_policy_hits + report.stats.column_requirement_hits,
        token_fallbacks = report.stats.token_policy_hits,
        "parsed underwriting report"
    );

    let payload = UnderwritingPayload {
        report_type: "underwriting",
        document_type: args.document_type.clone(),
        report_date: report.report_date,
        count: report.records.len(),
        items: report.records,
        text: upload.sample(args.text_sample),
        file: upload.file,
        custom_data: parse_custom_data(args.custom_data.as_deref()),
    };
    emit_json(args.output.as_deref(), &payload)
}
