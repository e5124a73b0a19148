use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::error::FetchError;

/// Budget for the header-only HEAD probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Budget for the full body retrieval.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers learned from a completed HEAD probe. The probe is advisory; the
/// full fetch remains the authority on type and size.
#[derive(Debug, Clone, Default)]
pub struct ProbeInfo {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// A successfully opened GET response: declared type plus a streaming body.
pub struct RemoteImage {
    pub content_type: Option<String>,
    pub body: Box<dyn Read>,
}

/// Transport seam for the fetch pipeline, mockable in tests.
pub trait ImageSource {
    fn probe(&self, url: &Url) -> Result<ProbeInfo, FetchError>;

    /// Open the full response. Non-success statuses surface as
    /// [`FetchError::HttpStatus`]; the body is left unread for the caller's
    /// bounded-read loop.
    fn get(&self, url: &Url) -> Result<RemoteImage, FetchError>;
}

#[derive(Clone)]
pub struct HttpImageSource {
    probe_client: Client,
    fetch_client: Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, FetchError> {
        let headers = identifying_headers()?;
        let probe_client = Client::builder()
            .default_headers(headers.clone())
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|err| FetchError::ConnectionFailed(err.to_string()))?;
        let fetch_client = Client::builder()
            .default_headers(headers)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| FetchError::ConnectionFailed(err.to_string()))?;

        Ok(Self {
            probe_client,
            fetch_client,
        })
    }
}

impl ImageSource for HttpImageSource {
    fn probe(&self, url: &Url) -> Result<ProbeInfo, FetchError> {
        tracing::debug!(%url, "head probe");
        let response = self
            .probe_client
            .head(url.clone())
            .send()
            .map_err(classify)?;
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        Ok(ProbeInfo {
            content_type: header_string(response.headers().get(CONTENT_TYPE)),
            content_length,
        })
    }

    fn get(&self, url: &Url) -> Result<RemoteImage, FetchError> {
        tracing::debug!(%url, "full fetch");
        let response = self
            .fetch_client
            .get(url.clone())
            .send()
            .map_err(classify)?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        let content_type = header_string(response.headers().get(CONTENT_TYPE));
        Ok(RemoteImage {
            content_type,
            body: Box::new(response),
        })
    }
}

/// Every request carries a fixed identifying User-Agent.
fn identifying_headers() -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("imgfetch/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| FetchError::ConnectionFailed(err.to_string()))?,
    );
    Ok(headers)
}

fn header_string(value: Option<&HeaderValue>) -> Option<String> {
    value
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::ConnectionFailed(err.to_string())
    }
}
