use anyhow::{Context, Result, bail};
use crux_http::{
    HttpError,
    protocol::{HttpRequest, HttpResponse},
};
use pitop_onboarding_core::BASE_URL;
use reqwest::{Method, Response};

/// Resolve a url built by the core against the device base url
///
/// The core addresses the device with `BASE_URL` prefixed paths, absolute
/// urls pass through unchanged.
///
/// # Examples
/// ```
/// use pitop_onboarding::http_client::device_url;
///
/// let url = device_url("http://127.0.0.1:8020", "https://relative/available-space")
///     .expect("valid url");
/// assert_eq!(url, "http://127.0.0.1:8020/available-space");
/// ```
pub fn device_url(base_url: &str, url: &str) -> Result<String> {
    if let Some(path) = url.strip_prefix(BASE_URL) {
        return Ok(format!("{base_url}{path}"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_string());
    }
    bail!("failed to resolve url: {url} is neither relative to the device nor absolute")
}

/// Whether the request asks to bypass caches, as the restart probes do
pub fn is_uncached(request: &HttpRequest) -> bool {
    request
        .headers
        .iter()
        .any(|header| header.name.eq_ignore_ascii_case("cache-control") && header.value == "no-cache")
}

pub fn method(request: &HttpRequest) -> Result<Method> {
    Method::from_bytes(request.method.as_bytes())
        .with_context(|| format!("failed to parse http method {}", request.method))
}

/// Convert a device response into the response the core expects
///
/// Unlike a failed request, non-success statuses are returned as responses,
/// the core decides how to treat them.
pub async fn into_crux_response(res: Response) -> Result<HttpResponse> {
    let status = res.status().as_u16();
    let headers: Vec<(String, String)> = res
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = res.bytes().await.context("failed to read response body")?;

    let mut builder = HttpResponse::status(status);
    for (name, value) in headers {
        builder.header(name, value);
    }

    Ok(builder.body(body.to_vec()).build())
}

/// Map a transport failure onto the core's error type
pub fn into_http_error(e: &reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_builder() {
        HttpError::Url(e.to_string())
    } else {
        HttpError::Io(format!("{e:#}"))
    }
}
