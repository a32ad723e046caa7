use std::ffi::OsStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Maximum number of characters of the raw payload kept in parse errors
const PAYLOAD_EXCERPT_MAX_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    FailedSkippable,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepRunResult {
    pub id: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub version: Option<String>,
}

/// Results of one finished build run, as sent by the Bitrise CLI.
///
/// Only the fields the anonymized report may use are modelled, every other field of the payload
/// is discarded while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildRunResult {
    pub status: RunStatus,
    pub steps: Vec<StepRunResult>,
    #[serde(default, alias = "project_type")]
    pub platform: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

fn payload_excerpt(raw: &str) -> String {
    match raw.char_indices().nth(PAYLOAD_EXCERPT_MAX_CHARS) {
        Some((end, _)) => format!("{}…", &raw[..end]),
        None => raw.to_owned(),
    }
}

fn parse_error(raw: &str, reason: impl Into<String>) -> AnalyticsError {
    AnalyticsError::PayloadParse {
        payload: payload_excerpt(raw),
        reason: reason.into(),
    }
}

pub fn decode_payload(raw: &str) -> Result<BuildRunResult, AnalyticsError> {
    if raw.trim().is_empty() {
        return Err(parse_error(raw, "payload is empty"));
    }

    let result: BuildRunResult =
        serde_json::from_str(raw).map_err(|e| parse_error(raw, e.to_string()))?;

    if let Some(position) = result.steps.iter().position(|step| step.id.trim().is_empty()) {
        return Err(parse_error(
            raw,
            format!("steps[{position}].id must not be empty"),
        ));
    }

    Ok(result)
}

/// Decode the payload as read from the environment, which is not guaranteed to be UTF-8
pub fn decode_os_payload(raw: &OsStr) -> Result<BuildRunResult, AnalyticsError> {
    match raw.to_str() {
        Some(raw) => decode_payload(raw),
        None => Err(parse_error(
            &raw.to_string_lossy(),
            "payload is not valid UTF-8",
        )),
    }
}
