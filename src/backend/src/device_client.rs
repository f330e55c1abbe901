use crate::{
    config::DeviceConfig,
    http_client::{device_url, into_crux_response, into_http_error, is_uncached, method},
};
use anyhow::{Context, Result};
use crux_http::{
    HttpError,
    protocol::{HttpRequest, HttpResult},
};
use log::{debug, warn};
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::Client;
use std::time::Duration;
use trait_variant::make;

/// Performs the core's HTTP requests against the device service
#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait DeviceClient {
    async fn execute(&self, request: HttpRequest) -> HttpResult;
}

#[derive(Clone)]
pub struct PitopDeviceClient {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl PitopDeviceClient {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to create http client")?;

        Ok(Self {
            client,
            base_url: config.http_url.clone(),
            probe_timeout: config.probe_timeout,
        })
    }
}

impl DeviceClient for PitopDeviceClient {
    async fn execute(&self, request: HttpRequest) -> HttpResult {
        let url = match device_url(&self.base_url, &request.url) {
            Ok(url) => url,
            Err(e) => return HttpResult::Err(HttpError::Url(format!("{e:#}"))),
        };
        let method = match method(&request) {
            Ok(method) => method,
            Err(e) => return HttpResult::Err(HttpError::Url(format!("{e:#}"))),
        };
        debug!("{method} {url}");

        let mut builder = self.client.request(method.clone(), &url);
        for header in &request.headers {
            builder = builder.header(&header.name, &header.value);
        }
        if is_uncached(&request) {
            builder = builder.timeout(self.probe_timeout);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let res = match builder.send().await {
            Ok(res) => res,
            Err(e) => {
                debug!("{method} {url} failed: {e:#}");
                return HttpResult::Err(into_http_error(&e));
            }
        };

        match into_crux_response(res).await {
            Ok(response) => HttpResult::Ok(response),
            Err(e) => {
                warn!("{method} {url}: {e:#}");
                HttpResult::Err(HttpError::Io(format!("{e:#}")))
            }
        }
    }
}
