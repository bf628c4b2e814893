use anyhow::Result;
use serde::Serialize;

use crate::domain::{ports::OutputWriter, report::Report};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    title: String,
    generated_at: String,
    #[serde(flatten)]
    report: &'a Report<'a>,
}

/// Pretty-printed JSON of the comparison and its generated SQL.
pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, report: &Report<'_>) -> Result<String> {
        let view = JsonReport {
            title: report.title(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            report,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
