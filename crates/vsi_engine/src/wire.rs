//! JSON bodies exchanged with the upload service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use vsi_core::{JobId, JobStatus, UploadJob};
use vsi_logging::vsi_warn;

use crate::{ErrorKind, HistoryPage, SubmitReceipt, TransportError};

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    job_id: String,
    #[serde(default)]
    message: Option<String>,
}

impl From<UploadResponse> for SubmitReceipt {
    fn from(response: UploadResponse) -> Self {
        Self {
            job_id: JobId::new(response.job_id),
            message: response.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobRecord {
    job_id: String,
    #[serde(default)]
    filename: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    error_message: Option<String>,
}

impl JobRecord {
    pub(crate) fn into_job(self) -> Result<UploadJob, TransportError> {
        let status: JobStatus = self
            .status
            .parse()
            .map_err(|err| TransportError::new(ErrorKind::Decode, format!("{err}")))?;
        Ok(UploadJob {
            job_id: JobId::new(self.job_id),
            filename: self.filename,
            status,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            error_message: self.error_message,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    total: u64,
    page: u32,
    limit: u32,
    uploads: Vec<JobRecord>,
}

impl HistoryResponse {
    /// Rows that fail to decode are logged and left out; `total` stays as reported.
    pub(crate) fn into_page(self) -> HistoryPage {
        let mut jobs: Vec<UploadJob> = self
            .uploads
            .into_iter()
            .filter_map(|record| {
                let job_id = record.job_id.clone();
                record
                    .into_job()
                    .map_err(|err| vsi_warn!("Skipping history row {job_id}: {err}"))
                    .ok()
            })
            .collect();
        vsi_core::sort_newest_first(&mut jobs);
        HistoryPage {
            total: self.total,
            page: self.page,
            limit: self.limit,
            jobs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Extracts `detail` from an error body. Structured details are kept as compact JSON.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Accepts RFC 3339 as well as the offset-less ISO form the service emits; the latter is
/// taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TransportError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(TransportError::new(
        ErrorKind::Decode,
        format!("unparseable timestamp {raw:?}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_with_and_without_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T12:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T14:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T12:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-05-01T12:30:00.250000").unwrap(),
            expected + chrono::Duration::milliseconds(250)
        );
        assert_eq!(parse_timestamp("2024-05-01 12:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("yesterday").unwrap_err().kind,
            ErrorKind::Decode
        );
    }

    #[test]
    fn detail_accepts_strings_and_structures() {
        assert_eq!(
            error_detail(br#"{"detail":"Job ID not found"}"#).as_deref(),
            Some("Job ID not found")
        );
        assert_eq!(
            error_detail(br#"{"detail":[{"loc":["body","file"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body","file"]}]"#)
        );
        assert_eq!(error_detail(br#"{"detail":""}"#), None);
        assert_eq!(error_detail(b"<html>"), None);
    }

    #[test]
    fn undecodable_history_rows_are_skipped() {
        let response: HistoryResponse = serde_json::from_str(
            r#"{"total":2,"page":1,"limit":10,"uploads":[
                {"job_id":"broken","status":"Completed","created_at":"soon","updated_at":"soon"},
                {"job_id":"fine","status":"Completed","created_at":"2024-05-01T12:30:00","updated_at":"2024-05-01T12:31:00"}
            ]}"#,
        )
        .unwrap();
        let page = response.into_page();
        assert_eq!(page.total, 2);
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].job_id, JobId::from("fine"));
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        let record: JobRecord = serde_json::from_str(
            r#"{"job_id":"j","status":"Paused","created_at":"2024-05-01T12:30:00","updated_at":"2024-05-01T12:30:00"}"#,
        )
        .unwrap();
        assert_eq!(record.into_job().unwrap_err().kind, ErrorKind::Decode);
    }
}
