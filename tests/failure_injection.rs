//! Failure injection tests for the proxy.

use axum::http::StatusCode;
use std::net::SocketAddr;

mod common;

/// An address nothing is listening on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_unreachable_upstream_returns_bad_gateway() {
    let backend = closed_addr().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_post_is_not_retried() {
    let backend = closed_addr().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .post(format!("http://{}/form", proxy))
        .body("a=1")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}

#[tokio::test]
async fn test_silent_upstream_returns_gateway_timeout() {
    let backend = common::start_silent_backend().await;
    let mut config = common::config_for(backend);
    config.timeouts.request_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/slow", proxy))
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let backend = closed_addr().await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(backend)).await;

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let result = common::client()
        .get(format!("http://{}/", proxy))
        .timeout(std::time::Duration::from_secs(2))
        .send()
        .await;
    assert!(result.is_err(), "proxy should no longer accept connections");
}
