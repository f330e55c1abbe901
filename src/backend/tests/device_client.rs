mod common;

use common::*;
use crux_http::{
    HttpError,
    protocol::{HttpHeader, HttpRequest, HttpResult},
};
use pitop_onboarding::{
    config::DeviceConfig,
    device_client::{DeviceClient, PitopDeviceClient},
};
use pitop_onboarding_core::{BASE_URL, NO_CACHE_HEADERS};
use std::{net::SocketAddr, time::Duration};

fn client(addr: SocketAddr) -> PitopDeviceClient {
    PitopDeviceClient::new(&DeviceConfig {
        http_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}"),
        request_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_millis(200),
    })
    .expect("failed to create device client")
}

fn get(path: &str, headers: &[(&str, &str)]) -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        url: format!("{BASE_URL}{path}"),
        headers: headers
            .iter()
            .map(|(name, value)| HttpHeader {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect(),
        body: Vec::new(),
    }
}

#[tokio::test]
async fn relative_request_reaches_device() {
    let (addr, seen) = mock_http_server(vec![Route::ok("/available-space", "1000000")]).await;

    let HttpResult::Ok(response) = client(addr).execute(get("/available-space", &[])).await else {
        panic!("request should succeed");
    };

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"1000000".to_vec());
    assert_eq!(seen.lock().unwrap()[0].line, "GET /available-space HTTP/1.1");
}

#[tokio::test]
async fn response_headers_are_kept() {
    let (addr, _seen) = mock_http_server(vec![Route::ok("/available-space", "1000000")]).await;

    let HttpResult::Ok(response) = client(addr).execute(get("/available-space", &[])).await else {
        panic!("request should succeed");
    };

    assert!(
        response
            .headers
            .iter()
            .any(|header| header.name == "content-type" && header.value == "text/plain")
    );
}

#[tokio::test]
async fn error_statuses_are_responses() {
    let (addr, _seen) = mock_http_server(Vec::new()).await;

    let HttpResult::Ok(response) = client(addr).execute(get("/os-updates", &[])).await else {
        panic!("request should reach the device");
    };

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn headers_are_forwarded() {
    let (addr, seen) = mock_http_server(vec![Route::ok("/onboarding/upgrade?all", "")]).await;

    let _ = client(addr)
        .execute(get("/onboarding/upgrade?all", &NO_CACHE_HEADERS))
        .await;

    let seen = seen.lock().unwrap();
    assert!(seen[0].has_header("cache-control", "no-cache"));
    assert!(seen[0].has_header("pragma", "no-cache"));
}

#[tokio::test]
async fn probes_time_out_quickly() {
    let (addr, _seen) = mock_http_server(vec![Route {
        target: "/onboarding/upgrade?all",
        status: 200,
        body: "",
        hang: true,
    }])
    .await;

    let result = tokio::time::timeout(
        Duration::from_secs(3),
        client(addr).execute(get("/onboarding/upgrade?all", &NO_CACHE_HEADERS)),
    )
    .await
    .expect("probe should honour its own timeout");

    assert!(matches!(result, HttpResult::Err(HttpError::Timeout)));
}

#[tokio::test]
async fn unreachable_device_is_an_io_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        listener.local_addr().expect("failed to get address")
    };

    let result = client(addr).execute(get("/available-space", &[])).await;

    assert!(matches!(result, HttpResult::Err(HttpError::Io(_))));
}
