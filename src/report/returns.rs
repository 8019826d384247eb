use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::normalize::{leading_chars, normalize_date, parse_currency, title_case};

use super::fields::{is_bill_day, is_item_date, is_reason_code};
use super::records::{PageContext, ReturnItems, ReturnRecord};
use super::section::ReturnSection;

/// Words that open the free-text return reason on an item line.
pub const REASON_KEYWORDS: [&str; 20] = [
    "NSF", "RETURN", "PAYMENT", "NO", "ACCT", "ACCOUNT", "CUSTOMER", "CUST", "NOT", "UNABLE",
    "LOCATE", "LOCAT", "INVALID", "REFER", "STOPPED", "CLOSED", "CODE", "NUMBER", "AUTH", "R98",
];

const MIN_ITEM_TOKENS: usize = 8;
const REPORT_TITLE: &str = "DAILY RETURN DRAFT";
const REPORT_DATE_HEADER_LINES: usize = 30;
const REPORT_DATE_FALLBACK_CHARS: usize = 500;

#[derive(Debug, Default, Clone)]
pub struct ReturnsStats {
    pub page_headers: usize,
    pub section_headers: usize,
    pub item_candidates: usize,
    pub short_item_lines: usize,
    pub items_without_bill_day: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ReturnsReport {
    pub report_date: Option<String>,
    pub items: ReturnItems,
    pub stats: ReturnsStats,
}

#[derive(Debug, Default)]
struct ReturnsScan {
    section: Option<ReturnSection>,
    page: PageContext,
    items: ReturnItems,
    stats: ReturnsStats,
}

pub struct ReturnsParser {
    region_header: Regex,
    agency_header: Regex,
    item_line: Regex,
    any_date: Regex,
    bounded_date: Regex,
}

impl ReturnsParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            region_header: Regex::new(r"^\s*REGION:\s+([A-Z]{2})\s+([0-9]+)-(.+?)\s*$")
                .context("failed to compile region header regex")?,
            agency_header: Regex::new(r"^\s*AGENCY:\s+([A-Z]{2}[0-9]{3})\s+([0-9]+)-(.+?)\s*$")
                .context("failed to compile agency header regex")?,
            item_line: Regex::new(r"^\s*([0-9]{3})\s+([0-9]{10}[A-Z]?)\s+(.+)$")
                .context("failed to compile return item regex")?,
            any_date: Regex::new(r"([0-9]{1,2}/[0-9]{1,2}/[0-9]{2,4})")
                .context("failed to compile report date regex")?,
            bounded_date: Regex::new(r"\b([0-9]{1,2}/[0-9]{1,2}/[0-9]{2,4})\b")
                .context("failed to compile bounded report date regex")?,
        })
    }

    pub fn parse_report(&self, text: &str) -> ReturnsReport {
        let report_date = self.report_date(text);
        let mut scan = text
            .lines()
            .fold(ReturnsScan::default(), |scan, line| self.scan_line(scan, line));

        for item in scan.items.iter_mut() {
            item.report_date = report_date.clone();
        }

        ReturnsReport {
            report_date,
            items: scan.items,
            stats: scan.stats,
        }
    }

    fn scan_line(&self, mut scan: ReturnsScan, line: &str) -> ReturnsScan {
        if let Some(captures) = self.region_header.captures(line) {
            scan.page.region_code = captures.get(1).map(|value| value.as_str().to_string());
            scan.page.region_desc = captures.get(3).map(|value| value.as_str().trim().to_string());
            scan.stats.page_headers += 1;
            return scan;
        }
        if let Some(captures) = self.agency_header.captures(line) {
            scan.page.agency_code = captures.get(1).map(|value| value.as_str().to_string());
            scan.page.agency_desc = captures.get(3).map(|value| value.as_str().trim().to_string());
            scan.stats.page_headers += 1;
            return scan;
        }

        if let Some(section) = ReturnSection::detect(line) {
            debug!(section = section.as_str(), "entered return section");
            scan.section = Some(section);
            scan.stats.section_headers += 1;
            return scan;
        }

        if let Some(item) = self.classify_item(scan.section, &scan.page, line, &mut scan.stats) {
            scan.items.push(item);
        }
        scan
    }

    fn classify_item(
        &self,
        section: Option<ReturnSection>,
        page: &PageContext,
        line: &str,
        stats: &mut ReturnsStats,
    ) -> Option<ReturnRecord> {
        let captures = self.item_line.captures(line)?;
        stats.item_candidates += 1;

        let company_code = captures.get(1)?.as_str();
        let policy_no = captures.get(2)?.as_str();
        let tokens = captures
            .get(3)?
            .as_str()
            .split_whitespace()
            .collect::<Vec<&str>>();
        if tokens.len() < MIN_ITEM_TOKENS {
            stats.short_item_lines += 1;
            debug!(policy_no, tokens = tokens.len(), "dropped short return item line");
            return None;
        }

        let Some(boundary) = tokens
            .windows(2)
            .position(|pair| is_bill_day(pair[0]) && is_item_date(pair[1]))
        else {
            stats.items_without_bill_day += 1;
            debug!(policy_no, "dropped return item without bill day and issue date");
            return None;
        };

        let at = |offset: usize| tokens.get(boundary + offset).copied();
        let amount = at(3).and_then(parse_currency);
        let (agent_name, reason) = split_agent_and_reason(tokens.get(boundary + 6..).unwrap_or(&[]));

        Some(ReturnRecord {
            section,
            company_code: company_code.to_string(),
            policy_no: policy_no.to_string(),
            insured_name: title_case(&tokens[..boundary].join(" ")),
            bill_day: tokens[boundary].to_string(),
            issue_date: at(1).and_then(normalize_date),
            bill_no: at(2).map(str::to_string),
            amount,
            agency_code_line: at(4).map(str::to_string),
            agent_num: at(5).map(str::to_string),
            agent_name,
            reason,
            page_region_code: page.region_code.clone(),
            page_region_desc: page.region_desc.clone(),
            page_agency_code: page.agency_code.clone(),
            page_agency_desc: page.agency_desc.clone(),
            report_date: None,
        })
    }

    /// Date on the first dated report title line, else the first date near
    /// the top.
    pub fn report_date(&self, text: &str) -> Option<String> {
        let titled_date = text
            .lines()
            .take(REPORT_DATE_HEADER_LINES)
            .filter(|line| line.to_uppercase().contains(REPORT_TITLE))
            .find_map(|line| self.any_date.captures(line)?.get(1));
        if let Some(value) = titled_date {
            return normalize_date(value.as_str());
        }

        let prefix = leading_chars(text, REPORT_DATE_FALLBACK_CHARS);
        self.bounded_date
            .captures(prefix)
            .and_then(|captures| captures.get(1))
            .and_then(|value| normalize_date(value.as_str()))
    }
}

fn is_reason_start(token: &str) -> bool {
    let upper = token.to_uppercase();
    REASON_KEYWORDS.contains(&upper.as_str()) || is_reason_code(&upper)
}

/// Splits the trailing tokens of an item into agent name and return reason.
///
/// Without any reason keyword the last token alone is taken as the reason,
/// which misreads multi-word reasons that lack a known keyword.
pub fn split_agent_and_reason(tokens: &[&str]) -> (Option<String>, Option<String>) {
    let non_empty = |value: String| if value.is_empty() { None } else { Some(value) };

    match tokens.iter().position(|token| is_reason_start(token)) {
        Some(split) => (
            non_empty(title_case(&tokens[..split].join(" "))),
            Some(tokens[split..].join(" ").to_uppercase()),
        ),
        None => match tokens.split_last() {
            Some((last, rest)) => (
                non_empty(title_case(&rest.join(" "))),
                Some(last.to_uppercase()),
            ),
            None => (None, None),
        },
    }
}
