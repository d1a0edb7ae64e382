// src/providers/http.rs
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::AdapterError;

/// Shared client for one adapter. The timeout bounds every request it sends.
pub fn client(timeout: Duration, key_header: Option<(&'static str, &str)>) -> Result<reqwest::Client, AdapterError> {
    let mut headers = HeaderMap::new();
    if let Some((name, key)) = key_header {
        if !key.is_empty() {
            match HeaderValue::from_str(key) {
                Ok(v) => {
                    headers.insert(HeaderName::from_static(name), v);
                }
                Err(_) => tracing::warn!(header = name, "api key is not a valid header value, not sent"),
            }
        }
    }

    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()?)
}

/// GET `url`, require a 2xx, decode the body as `T`.
pub async fn get_json<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> Result<T, AdapterError> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AdapterError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
