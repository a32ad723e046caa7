use std::time::Duration;

use reqwest::{Client, header::CONTENT_TYPE};
use url::Url;

use crate::error::SubmissionError;
use crate::prelude::*;
use crate::report::AnonymizedReport;
use crate::request_client::build_client;

pub const ANALYTICS_ENDPOINT: &str = "https://bitrise-step-analytics.herokuapp.com/metrics";

/// Delivers anonymized reports to the analytics endpoint, one attempt per report
pub struct Submitter {
    client: Client,
    endpoint: Url,
}

impl Submitter {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SubmissionError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }

    pub async fn submit(&self, report: &AnonymizedReport) -> Result<(), SubmissionError> {
        let body = report.to_json()?;
        debug!("Posting {} bytes to {}", body.len(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionError::Status(status));
        }

        debug!("Analytics endpoint responded with {status}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;
    use crate::context::InvocationContext;
    use crate::payload::decode_payload;

    fn git_clone_report() -> AnonymizedReport {
        let result = decode_payload(
            r#"{"steps":[{"id":"git-clone","status":"success","duration_ms":1200}],"status":"success"}"#,
        )
        .unwrap();
        AnonymizedReport::build(&result, &InvocationContext::default())
    }

    fn submitter_for(server: &MockServer, timeout: Duration) -> Submitter {
        let endpoint = Url::parse(&format!("{}/metrics", server.uri())).unwrap();
        Submitter::new(endpoint, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_submit_posts_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/metrics"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "status": "success",
                "is_ci": false,
                "duration_ms": 1200,
                "step_counts": {
                    "total": 1,
                    "success": 1,
                    "failed": 0,
                    "failed_skippable": 0,
                    "skipped": 0
                },
                "steps": [
                    {
                        "id": "git-clone",
                        "source": "steplib",
                        "status": "success",
                        "duration_ms": 1200
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        submitter_for(&server, Duration::from_secs(5))
            .submit(&git_clone_report())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_ignores_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_string("not json at all"))
            .expect(1)
            .mount(&server)
            .await;

        let result = submitter_for(&server, Duration::from_secs(5))
            .submit(&git_clone_report())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_submit_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = submitter_for(&server, Duration::from_secs(5))
            .submit(&git_clone_report())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Status(StatusCode::SERVICE_UNAVAILABLE)
        ));
    }

    #[tokio::test]
    async fn test_submit_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let start = Instant::now();
        let err = submitter_for(&server, Duration::from_millis(200))
            .submit(&git_clone_report())
            .await
            .unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(4));
        let SubmissionError::Transport(err) = err else {
            panic!("expected a transport error");
        };
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_submit_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}/metrics")).unwrap();

        let err = Submitter::new(endpoint, Duration::from_secs(2))
            .unwrap()
            .submit(&git_clone_report())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)));
    }
}
