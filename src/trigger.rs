use std::time::Duration;

use clap::ValueEnum;
use url::Url;

use crate::config::AnalyticsConfig;
use crate::context::InvocationContext;
use crate::error::AnalyticsError;
use crate::payload::decode_os_payload;
use crate::prelude::*;
use crate::report::AnonymizedReport;
use crate::submitter::Submitter;

/// What to do when the analytics endpoint cannot be reached or rejects the report
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionPolicy {
    /// Fail the invocation with a non-zero exit code
    #[default]
    Fatal,
    /// Log a warning and exit successfully
    Ignore,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The user opted out, nothing was decoded nor sent
    Disabled,
    Submitted,
    /// The submission failed and the failure was ignored by policy
    SubmissionFailed,
}

/// Handle a build-finished trigger: check the opt-out flag, then decode, anonymize and submit the
/// build run results. Every step only runs if the previous one succeeded, the HTTP client is only
/// built once there is a report to send.
pub async fn run(
    context: &InvocationContext,
    endpoint: Url,
    timeout: Duration,
    policy: SubmissionPolicy,
) -> Result<TriggerOutcome, AnalyticsError> {
    let config = AnalyticsConfig::load(context.data_dir()?)?;
    if config.is_analytics_disabled {
        debug!("Analytics disabled");
        return Ok(TriggerOutcome::Disabled);
    }

    let payload = context.payload.as_deref().unwrap_or_default();
    debug!("Plugin input payload: {} bytes", payload.len());
    let build_run_result = decode_os_payload(payload)?;
    if let Some(trigger) = &build_run_result.trigger {
        debug!("Build run triggered by {trigger}");
    }

    let report = AnonymizedReport::build(&build_run_result, context);

    info!("Submitting anonymized usage information...");
    info!("For more information visit:");
    info!("https://github.com/bitrise-core/bitrise-plugins-analytics/blob/master/README.md");

    let submission = match Submitter::new(endpoint, timeout) {
        Ok(submitter) => submitter.submit(&report).await,
        Err(err) => Err(err),
    };

    match submission {
        Ok(()) => Ok(TriggerOutcome::Submitted),
        Err(err) => match policy {
            SubmissionPolicy::Fatal => Err(err.into()),
            SubmissionPolicy::Ignore => {
                warn!("Failed to send analytics, error: {err}");
                Ok(TriggerOutcome::SubmissionFailed)
            }
        },
    }
}
