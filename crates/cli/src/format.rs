//! Report → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): `txn#1  ok  12 bytes  35 ms  GET http://...`
//! - **JSON** (`--json`): one `serde_json` object per line

use std::time::Duration;

use conduit_concurrency::TransactionView;
use conduit_core::{Method, TransactionHandle, TransferOutcome};
use serde::Serialize;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// What the completion callback saw for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestReport {
    pub handle: TransactionHandle,
    pub method: Method,
    pub url: String,
    pub outcome: TransferOutcome,
    pub bytes: usize,
    pub elapsed_ms: u64,
}

impl RequestReport {
    pub fn from_view(view: &TransactionView, body: &[u8]) -> Self {
        Self {
            handle: view.handle,
            method: view.method,
            url: view.url.clone(),
            outcome: view.outcome,
            bytes: body.len(),
            elapsed_ms: view.elapsed.as_millis() as u64,
        }
    }
}

/// Format one finished request.
pub fn format_report(report: &RequestReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputMode::Human => format!(
            "{}  {}  {} bytes  {} ms  {} {}",
            report.handle, report.outcome, report.bytes, report.elapsed_ms, report.method, report.url
        ),
    }
}

/// Format the closing summary line.
pub fn format_summary(total: usize, failed: usize, elapsed: Duration, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({
            "requests": total,
            "failed": failed,
            "elapsed_ms": elapsed.as_millis() as u64,
        })
        .to_string(),
        OutputMode::Human => format!(
            "{} requests, {} failed, {:.3}s",
            total,
            failed,
            elapsed.as_secs_f64()
        ),
    }
}

/// Format a top-level error.
pub fn format_error(err: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "error": format!("{:#}", err) }).to_string(),
        OutputMode::Human => format!("(error) {:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::ErrorCode;

    fn report(outcome: TransferOutcome) -> RequestReport {
        RequestReport {
            handle: TransactionHandle::from_raw(3),
            method: Method::Get,
            url: "http://svc/a".to_string(),
            outcome,
            bytes: 12,
            elapsed_ms: 40,
        }
    }

    #[test]
    fn test_human_line_names_handle_and_url() {
        let line = format_report(&report(TransferOutcome::Ok), OutputMode::Human);
        assert!(line.starts_with("txn#3"));
        assert!(line.contains("12 bytes"));
        assert!(line.ends_with("GET http://svc/a"));
    }

    #[test]
    fn test_json_line_is_structured() {
        let line = format_report(
            &report(TransferOutcome::Error(ErrorCode::Status(405))),
            OutputMode::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["handle"], 3);
        assert_eq!(value["method"], "GET");
        assert_eq!(value["outcome"]["error"]["status"], 405);
        assert_eq!(value["bytes"], 12);
    }

    #[test]
    fn test_summary_counts_failures() {
        let line = format_summary(4, 1, Duration::from_millis(1500), OutputMode::Human);
        assert_eq!(line, "4 requests, 1 failed, 1.500s");
        let json: serde_json::Value =
            serde_json::from_str(&format_summary(4, 1, Duration::from_millis(1500), OutputMode::Json))
                .unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["elapsed_ms"], 1500);
    }
}
