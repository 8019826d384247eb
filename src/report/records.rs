use serde::Serialize;

use super::section::{ReturnSection, Section};

/// One data line of an underwriting activity report.
///
/// Two shapes share this struct: policy-activity lines carry `plan` and
/// `annual_premium`, requirement lines carry `requirement_desc`. The
/// constructors are the only way the classifiers build records, which keeps
/// the shapes from mixing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderwritingRecord {
    #[serde(rename = "status")]
    pub section: Section,
    pub policy_no: String,
    pub insured_name: String,
    pub plan: Option<String>,
    pub annual_premium: Option<f64>,
    pub agent_id: String,
    pub writing_agent: String,
    pub requirement_desc: Option<String>,
    pub report_date: Option<String>,
}

impl UnderwritingRecord {
    pub fn policy_activity(
        section: Section,
        policy_no: &str,
        insured_name: String,
        plan: &str,
        annual_premium: Option<f64>,
        agent_id: &str,
        writing_agent: String,
    ) -> Self {
        Self {
            section,
            policy_no: policy_no.to_string(),
            insured_name,
            plan: Some(plan.to_string()),
            annual_premium,
            agent_id: agent_id.to_string(),
            writing_agent,
            requirement_desc: None,
            report_date: None,
        }
    }

    pub fn requirement(
        section: Section,
        policy_no: &str,
        insured_name: String,
        requirement_desc: &str,
        agent_id: &str,
        writing_agent: String,
    ) -> Self {
        Self {
            section,
            policy_no: policy_no.to_string(),
            insured_name,
            plan: None,
            annual_premium: None,
            agent_id: agent_id.to_string(),
            writing_agent,
            requirement_desc: Some(requirement_desc.trim().to_string()),
            report_date: None,
        }
    }

    pub fn is_requirement(&self) -> bool {
        self.requirement_desc.is_some()
    }
}

/// Region and agency banner printed at the top of each return-drafts page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub region_code: Option<String>,
    pub region_desc: Option<String>,
    pub agency_code: Option<String>,
    pub agency_desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnRecord {
    pub section: Option<ReturnSection>,
    pub company_code: String,
    pub policy_no: String,
    pub insured_name: String,
    pub bill_day: String,
    pub issue_date: Option<String>,
    pub bill_no: Option<String>,
    pub amount: Option<f64>,
    pub agency_code_line: Option<String>,
    pub agent_num: Option<String>,
    pub agent_name: Option<String>,
    pub reason: Option<String>,
    pub page_region_code: Option<String>,
    pub page_region_desc: Option<String>,
    pub page_agency_code: Option<String>,
    pub page_agency_desc: Option<String>,
    pub report_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnItems {
    pub returned_items: Vec<ReturnRecord>,
    pub returned_pre_notes: Vec<ReturnRecord>,
}

impl ReturnItems {
    pub fn push(&mut self, item: ReturnRecord) {
        if item.section == Some(ReturnSection::ReturnedPreNotes) {
            self.returned_pre_notes.push(item);
        } else {
            self.returned_items.push(item);
        }
    }

    pub fn total(&self) -> usize {
        self.returned_items.len() + self.returned_pre_notes.len()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ReturnRecord> {
        self.returned_items
            .iter_mut()
            .chain(self.returned_pre_notes.iter_mut())
    }
}
