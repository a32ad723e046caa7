use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::VERSION;

/// Upper bound for the whole analytics request, connection included
pub const SUBMISSION_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn user_agent() -> String {
    format!("bitrise-plugins-analytics/{VERSION}")
}

/// Build the HTTP client used for the analytics submission.
///
/// No retry middleware is installed: a submission is attempted exactly once.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .user_agent(user_agent())
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
}
