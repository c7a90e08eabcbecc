//! Export request options
//!
//! Typed view of the option keys the response-export endpoint recognizes.
//! Unknown keys are rejected at deserialization time
//! (`deny_unknown_fields`), the `use_labels`/`include_label_columns`
//! conflict at validation time, and date options are normalized to UTC
//! before the payload is built.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format of normalized export dates
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Options accepted by [`crate::client::ExportClient::submit`]
///
/// All fields are optional; an empty `ExportOptions` requests a plain CSV
/// export of every recorded response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportOptions {
    /// Export answer-choice labels instead of recode values.
    /// Mutually exclusive with `include_label_columns`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_labels: Option<bool>,

    /// For labeled columns, export both a recode column and a label column.
    /// Mutually exclusive with `use_labels`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_label_columns: Option<bool>,

    /// Export only responses that are still in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_responses_in_progress: Option<bool>,

    /// Maximum number of responses exported, counted from the first received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    /// Recode seen-but-unanswered questions with this value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen_unanswered_recode: Option<i64>,

    /// Recode seen-but-unanswered choices of multi-select questions with
    /// this value; defaults server-side to `seen_unanswered_recode`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiselect_seen_unanswered_recode: Option<i64>,

    /// Include display-order information (useful with randomization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_display_order: Option<bool>,

    /// Only export responses recorded at or after this date.
    /// Accepts flexible date strings; normalized to `%Y-%m-%dT%H:%M:%SZ`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Only export responses recorded before this date; normalized like
    /// `start_date`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Timezone used to interpret response date values; UTC when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ExportOptions {
    /// Check option constraints that a typed struct cannot express
    ///
    /// `use_labels` and `include_label_columns` cannot be combined,
    /// regardless of their boolean values or the order they were set in.
    pub fn validate(&self) -> Result<()> {
        if self.use_labels.is_some() && self.include_label_columns.is_some() {
            return Err(Error::validation(
                "\"useLabels\" and \"includeLabelColumns\" cannot be combined; pass just one",
            ));
        }
        Ok(())
    }

    /// Build the JSON body for the export-creation POST
    ///
    /// Validates, normalizes the date options, and injects the fixed
    /// `format: "csv"` field the deserialization collaborator expects.
    pub fn to_payload(&self) -> Result<serde_json::Value> {
        self.validate()?;

        let mut normalized = self.clone();
        if let Some(start) = &self.start_date {
            normalized.start_date = Some(normalize_export_date(start)?);
        }
        if let Some(end) = &self.end_date {
            normalized.end_date = Some(normalize_export_date(end)?);
        }

        let mut payload = serde_json::to_value(&normalized)?;
        match payload.as_object_mut() {
            Some(map) => {
                map.insert("format".to_string(), serde_json::Value::from("csv"));
            }
            // serde always renders a struct as an object; unreachable in practice
            None => return Err(Error::malformed("options did not serialize to an object")),
        }
        Ok(payload)
    }
}

/// Normalize a flexible date string to UTC `%Y-%m-%dT%H:%M:%SZ`
///
/// Accepts RFC 3339 timestamps (offset converted to UTC), bare
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` datetimes (assumed UTC),
/// and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn normalize_export_date(input: &str) -> Result<String> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc).format(EXPORT_DATE_FORMAT).to_string());
    }
    // RFC 3339 requires the "T" separator; stringified timestamps often
    // arrive as "2023-09-16 03:00:00+05:00"
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc).format(EXPORT_DATE_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc).format(EXPORT_DATE_FORMAT).to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(naive.and_utc().format(EXPORT_DATE_FORMAT).to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::validation(format!("unrepresentable date {input:?}")))?;
        return Ok(midnight.and_utc().format(EXPORT_DATE_FORMAT).to_string());
    }

    Err(Error::validation(format!(
        "could not parse date {input:?}; use an ISO 8601 date or datetime"
    )))
}
