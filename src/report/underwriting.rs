use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::debug;

use crate::normalize::{leading_chars, normalize_date, parse_currency, title_case};

use super::fields::{
    AGENT_ID_PATTERN, NAME_CLASS, PLAN_PATTERN, POLICY_PATTERN, PREMIUM_PATTERN, is_agent_id,
    is_plan_code, is_policy_number, is_premium, is_report_name,
};
use super::records::UnderwritingRecord;
use super::section::{Grammar, Section, SectionTracker};

const REPORT_TITLE: &str = "DAILY NEW BUSINESS/UNDERWRITING ACTIVITY REPORT";
const REPORT_DATE_HEADER_LINES: usize = 20;
const REPORT_DATE_FALLBACK_CHARS: usize = 500;

/// Ordered fallbacks for policy-activity lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PolicyStrategy {
    Strict,
    Columns,
    Tokens,
}

impl PolicyStrategy {
    pub const ORDER: [Self; 3] = [Self::Strict, Self::Columns, Self::Tokens];

    fn apply(
        self,
        parser: &UnderwritingParser,
        section: Section,
        line: &str,
    ) -> Option<UnderwritingRecord> {
        match self {
            Self::Strict => parser.strict_policy_line(section, line),
            Self::Columns => columns_policy_line(section, line),
            Self::Tokens => tokens_policy_line(section, line),
        }
    }
}

/// Ordered fallbacks for underwriting-requirement lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequirementStrategy {
    Strict,
    Columns,
}

impl RequirementStrategy {
    pub const ORDER: [Self; 2] = [Self::Strict, Self::Columns];

    fn apply(
        self,
        parser: &UnderwritingParser,
        section: Section,
        line: &str,
    ) -> Option<UnderwritingRecord> {
        match self {
            Self::Strict => parser.strict_requirement_line(section, line),
            Self::Columns => columns_requirement_line(section, line),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct UnderwritingStats {
    pub header_lines: usize,
    pub data_lines: usize,
    pub strict_policy_hits: usize,
    pub column_policy_hits: usize,
    pub token_policy_hits: usize,
    pub strict_requirement_hits: usize,
    pub column_requirement_hits: usize,
    pub dropped_lines: usize,
}

impl UnderwritingStats {
    fn record_policy_hit(&mut self, strategy: PolicyStrategy) {
        match strategy {
            PolicyStrategy::Strict => self.strict_policy_hits += 1,
            PolicyStrategy::Columns => self.column_policy_hits += 1,
            PolicyStrategy::Tokens => self.token_policy_hits += 1,
        }
    }

    fn record_requirement_hit(&mut self, strategy: RequirementStrategy) {
        match strategy {
            RequirementStrategy::Strict => self.strict_requirement_hits += 1,
            RequirementStrategy::Columns => self.column_requirement_hits += 1,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct UnderwritingReport {
    pub report_date: Option<String>,
    pub records: Vec<UnderwritingRecord>,
    pub stats: UnderwritingStats,
}

/// Accumulator threaded through one pass over the report lines.
#[derive(Debug, Default)]
struct UnderwritingScan {
    tracker: SectionTracker,
    records: Vec<UnderwritingRecord>,
    stats: UnderwritingStats,
}

pub struct UnderwritingParser {
    policy_line: Regex,
    requirement_line: Regex,
    titled_date: Regex,
    any_date: Regex,
}

impl UnderwritingParser {
    pub fn new() -> Result<Self> {
        let name = format!("{NAME_CLASS}+?");
        Ok(Self {
            policy_line: Regex::new(&format!(
                r"^\s*(?P<policy>{POLICY_PATTERN})\s+(?P<name>{name})\s+(?P<plan>{PLAN_PATTERN})\s+(?P<premium>{PREMIUM_PATTERN})\s+(?P<agent_id>{AGENT_ID_PATTERN})\s+(?P<agent>{name})\s*$"
            ))
            .context("failed to compile policy-activity line regex")?,
            requirement_line: Regex::new(&format!(
                r"^\s*(?P<policy>{POLICY_PATTERN})\s+(?P<name>{name})\s{{2,}}(?P<requirement>[^-].*?\S)\s{{2,}}(?P<agent_id>{AGENT_ID_PATTERN})\s+(?P<agent>{name})\s*$"
            ))
            .context("failed to compile requirement line regex")?,
            titled_date: Regex::new(&format!(
                r"(?i)([0-9]{{1,2}}/[0-9]{{1,2}}/[0-9]{{2,4}})\s+{}",
                regex::escape(REPORT_TITLE)
            ))
            .context("failed to compile report title date regex")?,
            any_date: Regex::new(r"\b([0-9]{1,2}/[0-9]{1,2}/[0-9]{2,4})\b")
                .context("failed to compile report date regex")?,
        })
    }

    /// Parses a whole report: records, report date stamped on each record,
    /// and per-strategy counters.
    pub fn parse_report(&self, text: &str) -> UnderwritingReport {
        let report_date = self.report_date(text);
        let mut scan = text
            .lines()
            .fold(UnderwritingScan::default(), |scan, line| self.scan_line(scan, line));

        for record in &mut scan.records {
            record.report_date = report_date.clone();
        }

        UnderwritingReport {
            report_date,
            records: scan.records,
            stats: scan.stats,
        }
    }

    fn scan_line(&self, mut scan: UnderwritingScan, raw: &str) -> UnderwritingScan {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            return scan;
        }

        if scan.tracker.observe(line) {
            scan.stats.header_lines += 1;
            return scan;
        }

        scan.stats.data_lines += 1;
        let section = scan.tracker.current();
        match self.classify_line_with_stats(section, line, &mut scan.stats) {
            Some(record) => scan.records.push(record),
            None => {
                scan.stats.dropped_lines += 1;
                debug!(section = section.as_str(), line, "dropped unmatched report line");
            }
        }
        scan
    }

    /// Runs the cascade for `section` and returns the first success.
    #[cfg(test)]
    pub fn classify_line(&self, section: Section, line: &str) -> Option<UnderwritingRecord> {
        self.classify_line_with_stats(section, line, &mut UnderwritingStats::default())
    }

    fn classify_line_with_stats(
        &self,
        section: Section,
        line: &str,
        stats: &mut UnderwritingStats,
    ) -> Option<UnderwritingRecord> {
        match section.grammar() {
            Grammar::PolicyActivity => {
                PolicyStrategy::ORDER.iter().find_map(|strategy| {
                    let record = strategy.apply(self, section, line)?;
                    stats.record_policy_hit(*strategy);
                    Some(record)
                })
            }
            Grammar::Requirement => {
                RequirementStrategy::ORDER.iter().find_map(|strategy| {
                    let record = strategy.apply(self, section, line)?;
                    stats.record_requirement_hit(*strategy);
                    Some(record)
                })
            }
        }
    }

    #[cfg(test)]
    pub fn apply_policy_strategy(
        &self,
        strategy: PolicyStrategy,
        section: Section,
        line: &str,
    ) -> Option<UnderwritingRecord> {
        strategy.apply(self, section, line)
    }

    fn strict_policy_line(&self, section: Section, line: &str) -> Option<UnderwritingRecord> {
        let captures = self.policy_line.captures(line)?;
        let premium = capture(&captures, "premium")?;
        Some(UnderwritingRecord::policy_activity(
            section,
            capture(&captures, "policy")?,
            title_case(capture(&captures, "name")?),
            capture(&captures, "plan")?,
            parse_currency(premium),
            capture(&captures, "agent_id")?,
            title_case(capture(&captures, "agent")?),
        ))
    }

    fn strict_requirement_line(&self, section: Section, line: &str) -> Option<UnderwritingRecord> {
        let captures = self.requirement_line.captures(line)?;
        Some(UnderwritingRecord::requirement(
            section,
            capture(&captures, "policy")?,
            title_case(capture(&captures, "name")?),
            capture(&captures, "requirement")?,
            capture(&captures, "agent_id")?,
            title_case(capture(&captures, "agent")?),
        ))
    }

    /// Report date from the title line, else the first date near the top.
    pub fn report_date(&self, text: &str) -> Option<String> {
        let titled = text
            .lines()
            .take(REPORT_DATE_HEADER_LINES)
            .filter_map(|line| self.titled_date.captures(line))
            .filter_map(|captures| captures.get(1).and_then(|value| normalize_date(value.as_str())))
            .next();
        if titled.is_some() {
            return titled;
        }

        let prefix = leading_chars(text, REPORT_DATE_FALLBACK_CHARS);
        self.any_date
            .captures(prefix)
            .and_then(|captures| captures.get(1))
            .and_then(|value| normalize_date(value.as_str()))
    }
}

fn capture<'a>(captures: &Captures<'a>, name: &str) -> Option<&'a str> {
    captures.name(name).map(|value| value.as_str())
}

fn split_columns(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let trimmed = line.trim();
    let mut start = 0usize;
    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;

    for (index, character) in trimmed.char_indices() {
        if character.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(index);
                run_len = 0;
            }
            run_len += 1;
            continue;
        }

        if let Some(gap_start) = run_start.take() {
            if run_len >= 2 {
                fields.push(&trimmed[start..gap_start]);
                start = index;
            }
        }
    }

    if !trimmed.is_empty() {
        fields.push(&trimmed[start..]);
    }
    fields
}

fn columns_policy_line(section: Section, line: &str) -> Option<UnderwritingRecord> {
    let columns = split_columns(line);
    let [policy, name, plan, premium, agent_id, agent] = columns[..] else {
        return None;
    };

    if !is_policy_number(policy)
        || !is_report_name(name)
        || !is_plan_code(plan)
        || !is_premium(premium)
        || !is_agent_id(agent_id)
        || !is_report_name(agent)
    {
        return None;
    }

    Some(UnderwritingRecord::policy_activity(
        section,
        policy,
        title_case(name),
        plan,
        parse_currency(premium),
        agent_id,
        title_case(agent),
    ))
}

/// Anchors on the rightmost agent id so names containing numerals survive.
fn tokens_policy_line(section: Section, line: &str) -> Option<UnderwritingRecord> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();
    if tokens.len() < 6 {
        return None;
    }

    let policy = tokens[0];
    if !is_policy_number(policy) {
        return None;
    }

    let agent_index = tokens.iter().rposition(|token| is_agent_id(token))?;
    // policy, at least one name token, plan and premium precede the agent id
    if agent_index < 4 {
        return None;
    }

    let premium = tokens[agent_index - 1];
    let plan = tokens[agent_index - 2];
    if !is_premium(premium) || !is_plan_code(plan) {
        return None;
    }

    let name = tokens[1..agent_index - 2].join(" ");
    let agent = tokens[agent_index + 1..].join(" ");
    if !is_report_name(&name) || !is_report_name(&agent) {
        return None;
    }

    Some(UnderwritingRecord::policy_activity(
        section,
        policy,
        title_case(&name),
        plan,
        parse_currency(premium),
        tokens[agent_index],
        title_case(&agent),
    ))
}

fn columns_requirement_line(section: Section, line: &str) -> Option<UnderwritingRecord> {
    let columns = split_columns(line);
    let [policy, name, requirement, agent_id, agent] = columns[..] else {
        return None;
    };

    if !is_policy_number(policy) || !is_agent_id(agent_id) {
        return None;
    }

    Some(UnderwritingRecord::requirement(
        section,
        policy,
        title_case(name),
        requirement,
        agent_id,
        title_case(agent),
    ))
}
