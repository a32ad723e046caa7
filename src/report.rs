use lazy_static::lazy_static;
use nestify::nest;
use regex::Regex;
use serde::Serialize;

use crate::context::InvocationContext;
use crate::payload::{BuildRunResult, RunStatus, StepRunResult, StepStatus};

lazy_static! {
    static ref STEPLIB_ID_REGEX: Regex = Regex::new(
        r"^(?:steplib::)?(?P<id>[A-Za-z0-9][A-Za-z0-9._-]*)(?:@(?P<version>[A-Za-z0-9._-]+))?$"
    )
    .unwrap();
    // Free-form values (versions, platform) are only reported as short plain tokens
    static ref REPORT_TOKEN_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").unwrap();
}

fn allowed_token(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| REPORT_TOKEN_REGEX.is_match(v))
        .map(str::to_owned)
}

/// Where a step comes from, derived from the prefix of its reference in the bitrise.yml
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSource {
    /// Public StepLib step, its id is a public name
    Steplib,
    /// `git::<url>@<branch>`
    Git,
    /// `path::<local path>`
    Local,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: StepSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: StepStatus,
    pub duration_ms: u64,
}

nest! {
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]*
    /// Usage report sent to the analytics endpoint.
    ///
    /// Built as an allow-list projection of [`BuildRunResult`]: repository, app, user and path
    /// information is never copied over. Steps that are not referenced by a StepLib id only keep
    /// their outcome and duration, since their reference embeds a URL or a local path.
    pub struct AnonymizedReport {
        pub status: RunStatus,
        pub is_ci: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub host_version: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub platform: Option<String>,
        pub duration_ms: u64,
        pub step_counts: pub struct StepCounts {
            pub total: usize,
            pub success: usize,
            pub failed: usize,
            pub failed_skippable: usize,
            pub skipped: usize,
        },
        pub steps: Vec<ReportStep>,
    }
}

impl StepCounts {
    fn from_steps(steps: &[StepRunResult]) -> Self {
        let count = |status: StepStatus| steps.iter().filter(|s| s.status == status).count();
        Self {
            total: steps.len(),
            success: count(StepStatus::Success),
            failed: count(StepStatus::Failed),
            failed_skippable: count(StepStatus::FailedSkippable),
            skipped: count(StepStatus::Skipped),
        }
    }
}

fn classify_step_id(id: &str) -> StepSource {
    if id.starts_with("git::") {
        StepSource::Git
    } else if id.starts_with("path::") {
        StepSource::Local
    } else if STEPLIB_ID_REGEX.is_match(id) {
        StepSource::Steplib
    } else {
        StepSource::Unknown
    }
}

impl From<&StepRunResult> for ReportStep {
    fn from(step: &StepRunResult) -> Self {
        let source = classify_step_id(&step.id);
        let (id, version) = match STEPLIB_ID_REGEX.captures(&step.id) {
            Some(captures) if source == StepSource::Steplib => {
                let id = captures.name("id").map(|m| m.as_str().to_owned());
                let version = allowed_token(
                    step.version
                        .as_deref()
                        .or_else(|| captures.name("version").map(|m| m.as_str())),
                );
                (id, version)
            }
            _ => (None, None),
        };

        Self {
            id,
            source,
            version,
            status: step.status,
            duration_ms: step.duration_ms,
        }
    }
}

impl AnonymizedReport {
    pub fn build(result: &BuildRunResult, context: &InvocationContext) -> Self {
        let duration_ms = result.duration_ms.unwrap_or_else(|| {
            result
                .steps
                .iter()
                .fold(0u64, |total, step| total.saturating_add(step.duration_ms))
        });

        Self {
            status: result.status,
            is_ci: context.is_ci,
            host_version: allowed_token(context.host_version.as_deref()),
            platform: allowed_token(result.platform.as_deref()),
            duration_ms,
            step_counts: StepCounts::from_steps(&result.steps),
            steps: result.steps.iter().map(ReportStep::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
