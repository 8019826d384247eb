//! Line classification for the underwriting activity and return-drafts
//! reports. Lines that fit no grammar are skipped, never reported.

mod fields;
mod records;
mod returns;
mod section;
mod underwriting;

pub use fields::is_valid_policy_number;
pub use records::{ReturnRecord, UnderwritingRecord};
pub use returns::ReturnsParser;
pub use underwriting::UnderwritingParser;
