use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::utils::error::{FetchError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
}

impl FetchRequest {
    /// A GET for `url` carrying only a browser-like `User-Agent`.
    pub fn browser_like(url: &str, user_agent: &str, timeout: Duration) -> Self {
        let mut headers = HashMap::new();
        headers.insert(USER_AGENT.as_str().to_string(), user_agent.to_string());

        Self {
            url: url.to_string(),
            headers,
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub response_time_ms: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    fn header_map(request: &FetchRequest) -> std::result::Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::Network {
                url: request.url.clone(),
                message: format!("invalid header name '{}': {}", name, e),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| FetchError::Network {
                url: request.url.clone(),
                message: format!("invalid header value for '{}': {}", name, e),
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn classify(request: &FetchRequest, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: request.url.clone(),
                timeout_secs: request.timeout.as_secs(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                url: request.url.clone(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, FetchError> {
        let start_time = Instant::now();
        let headers = Self::header_map(request)?;

        let response = self
            .client
            .get(&request.url)
            .headers(headers)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| Self::classify(request, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(request, e))?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
