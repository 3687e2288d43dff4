use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use matchmate_types::api::UserResponse;

pub const DEFAULT_BASE_URL: &str = "https://randomuser.me/api/";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can hand out a batch of random profiles.
pub trait ProfileSource: Send + Sync {
    fn fetch_profiles(
        &self,
        results: u32,
    ) -> impl Future<Output = Result<UserResponse, ClientError>> + Send;
}

/// Client for the randomuser.me generator.
#[derive(Clone)]
pub struct RandomUserClient {
    http: Client,
    base_url: String,
}

impl RandomUserClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("matchmate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl ProfileSource for RandomUserClient {
    async fn fetch_profiles(&self, results: u32) -> Result<UserResponse, ClientError> {
        debug!("GET {}?results={}", self.base_url, results);

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("results", results)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body = resp.text().await?;
        let parsed: UserResponse = serde_json::from_str(&body)?;

        debug!("Received {} profiles", parsed.results.len());
        Ok(parsed)
    }
}
