use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url};
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::{OutcomeCategory, RequestOutcome};

use super::client::RequestTemplate;

/// Issues exactly one request per call and classifies what happened.
///
/// Implementations must not fail past this boundary: every failure mode is
/// reported as a [`RequestOutcome`] category.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, url: &Url, timeout: Duration) -> RequestOutcome;
}

/// reqwest-backed executor sharing one pooled client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    template: RequestTemplate,
    expected_status: Option<u16>,
}

impl HttpExecutor {
    #[must_use]
    pub const fn new(
        client: Client,
        template: RequestTemplate,
        expected_status: Option<u16>,
    ) -> Self {
        Self {
            client,
            template,
            expected_status,
        }
    }

    async fn send_and_drain(&self, url: &Url) -> Result<u16, reqwest::Error> {
        let response = self.template.build(&self.client, url).send().await?;
        let status = response.status().as_u16();
        drain_response_body(response).await?;
        Ok(status)
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, url: &Url, timeout: Duration) -> RequestOutcome {
        let dispatch_time = Instant::now();
        let result = tokio::time::timeout(timeout, self.send_and_drain(url)).await;
        let completion_time = Instant::now();

        match result {
            Ok(Ok(status)) => RequestOutcome::response(
                dispatch_time,
                completion_time,
                status,
                classify_status(status, self.expected_status),
            ),
            Ok(Err(err)) => {
                let category = if err.is_timeout() {
                    OutcomeCategory::Timeout
                } else {
                    OutcomeCategory::NetworkError
                };
                debug!("Request to {} failed: {}", url, err);
                RequestOutcome::failure(dispatch_time, completion_time, category, err.to_string())
            }
            Err(_elapsed) => {
                debug!("Request to {} timed out after {:?}", url, timeout);
                RequestOutcome::failure(
                    dispatch_time,
                    completion_time,
                    OutcomeCategory::Timeout,
                    format!("timed out after {}ms", timeout.as_millis()),
                )
            }
        }
    }
}

/// Maps a response status to its category.
///
/// With an expected status only that code is a success, otherwise any 2xx is.
#[must_use]
pub fn classify_status(status: u16, expected_status: Option<u16>) -> OutcomeCategory {
    let success = match expected_status {
        Some(expected) => status == expected,
        None => StatusCode::from_u16(status).is_ok_and(|code| code.is_success()),
    };
    if success {
        OutcomeCategory::Success
    } else {
        OutcomeCategory::HttpError
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
