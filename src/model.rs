use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::csvdiff::ComparisonResult;
use crate::report::{ReturnRecord, UnderwritingRecord};
use crate::store::{StoreCounts, StoredSnapshot};

#[derive(Debug, Clone, Serialize)]
pub struct FileMeta {
    pub name: String,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub content_type: String,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size_bytes: u64, content_type: impl Into<String>) -> Self {
        let size_mb = (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
        Self {
            name: name.into(),
            size_bytes,
            size_mb,
            content_type: content_type.into(),
        }
    }
}

/// Leading slice of the extracted text, included on request for debugging
/// layouts the classifiers miss.
#[derive(Debug, Clone, Serialize)]
pub struct TextSample {
    pub text_sample: String,
    pub text_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderwritingPayload {
    pub report_type: &'static str,
    pub document_type: String,
    pub report_date: Option<String>,
    pub count: usize,
    pub items: Vec<UnderwritingRecord>,
    pub file: FileMeta,
    pub custom_data: Value,
    #[serde(flatten)]
    pub text: Option<TextSample>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReturnCounts {
    pub returned_items: usize,
    pub returned_pre_notes: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnsPayload {
    pub report_type: &'static str,
    pub document_type: String,
    pub report_date: Option<String>,
    pub count: ReturnCounts,
    pub returned_items: Vec<ReturnRecord>,
    pub returned_pre_notes: Vec<ReturnRecord>,
    pub file: FileMeta,
    pub custom_data: Value,
    #[serde(flatten)]
    pub text: Option<TextSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparePreviewPayload {
    pub message: String,
    pub upload_token: String,
    pub file: FileMeta,
    #[serde(flatten)]
    pub comparison: ComparisonResult,
    pub custom_data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareConfirmPayload {
    pub message: String,
    pub snapshot: StoredSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub db_path: String,
    pub counts: StoreCounts,
    pub latest_snapshot: Option<StoredSnapshot>,
}

/// Interprets the free-form `custom_data` field: objects pass through,
/// other JSON is wrapped as `value`, anything unparseable as `_raw`.
pub fn parse_custom_data(raw: Option<&str>) -> Value {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Value::Object(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Value::Object(object),
        Ok(other) => json!({ "value": other }),
        Err(_) => json!({ "_raw": raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_data_shapes() {
        assert_eq!(parse_custom_data(None), json!({}));
        assert_eq!(parse_custom_data(Some("  ")), json!({}));
        assert_eq!(parse_custom_data(Some(r#"{"batch": 7}"#)), json!({"batch": 7}));
        assert_eq!(parse_custom_data(Some("[1,2]")), json!({"value": [1, 2]}));
        assert_eq!(parse_custom_data(Some("not json")), json!({"_raw": "not json"}));
    }

    #[test]
    fn file_size_is_rounded_to_hundredths() {
        let meta = FileMeta::new("r.pdf", 1_572_864, "application/pdf");
        assert_eq!(meta.size_mb, 1.5);
        assert_eq!(FileMeta::new("r.pdf", 10_000, "x").size_mb, 0.01);
    }

    #[test]
    fn text_sample_is_omitted_unless_requested() {
        let payload = UnderwritingPayload {
            report_type: "underwriting",
            document_type: "uw".to_string(),
            report_date: None,
            count: 0,
            items: Vec::new(),
            file: FileMeta::new("r.pdf", 1, "application/pdf"),
            custom_data: json!({}),
            text: None,
        };
        let value = serde_json::to_value(&payload).expect("serialize");
        assert!(value.get("text_sample").is_none());

        let payload = UnderwritingPayload {
            text: Some(TextSample {
                text_sample: "SUB".to_string(),
                text_len: 3,
            }),
            ..payload
        };
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["text_sample"], "SUB");
        assert_eq!(value["text_len"], 3);
    }
}
