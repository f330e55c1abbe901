//! Turning `crux_http` results into the `Result<T, String>` the events carry.

use std::{fmt::Display, str::FromStr};

use crux_http::Response;
use serde::de::DeserializeOwned;

/// Prefix of device endpoints.
///
/// `crux_http` only accepts absolute urls, shells replace this prefix with the
/// device address (the browser shell stays same-origin).
pub const BASE_URL: &str = "https://relative";

/// Headers of requests that must not be answered from a cache
pub const NO_CACHE_HEADERS: [(&str, &str); 2] =
    [("Cache-Control", "no-cache"), ("Pragma", "no-cache")];

/// Address of a device endpoint
///
/// # Example
/// ```
/// use pitop_onboarding_core::http_helpers::build_url;
/// assert_eq!(build_url("/available-space"), "https://relative/available-space");
/// ```
pub fn build_url(endpoint: &str) -> String {
    format!("{BASE_URL}{endpoint}")
}

type ResponseResult = crux_http::Result<Response<Vec<u8>>>;

/// Body of a successful response, or a message naming `action` and the status
fn successful_body(action: &str, result: ResponseResult) -> Result<Vec<u8>, String> {
    let mut response = result.map_err(|e| format!("{action}: {e}"))?;
    let status = response.status();
    let body = response.take_body().unwrap_or_default();

    if status.is_success() {
        return Ok(body);
    }
    match String::from_utf8(body) {
        Ok(text) if !text.trim().is_empty() => Err(format!("{action}: HTTP {status}: {}", text.trim())),
        _ => Err(format!("{action}: HTTP {status}")),
    }
}

/// Parse a plain text value such as `1000000`, tolerating whitespace and
/// JSON string quotes
pub fn parse_text_value<T>(action: &str, text: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim()
        .trim_matches('"')
        .parse()
        .map_err(|e| format!("{action}: unexpected response {text:?}: {e}"))
}

pub fn process_status_response(action: &str, result: ResponseResult) -> Result<(), String> {
    successful_body(action, result).map(|_| ())
}

pub fn process_json_response<T: DeserializeOwned>(action: &str, result: ResponseResult) -> Result<T, String> {
    let body = successful_body(action, result)?;
    serde_json::from_slice(&body).map_err(|e| format!("{action}: invalid JSON: {e}"))
}

pub fn process_text_response<T>(action: &str, result: ResponseResult) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let body = successful_body(action, result)?;
    let text = String::from_utf8(body).map_err(|_| format!("{action}: invalid UTF-8"))?;
    parse_text_value(action, &text)
}
