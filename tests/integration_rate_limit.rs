#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, unreachable_pub)]
use axum::http::StatusCode;
use futures::future::join_all;
mod common;

async fn submit_from(app: &common::TestApp, forwarded_for: &str) -> StatusCode {
    app.client
        .post(format!("{}/api/contact", app.server_url))
        .header("X-Forwarded-For", forwarded_for)
        .json(&common::valid_submission())
        .send()
        .await
        .unwrap()
        .status()
}

fn throttled_config() -> portfolio_server::config::Config {
    let mut config = common::get_test_config();
    config.rate_limit.contact_per_minute = 1;
    config.rate_limit.contact_burst = 2;
    config
}

#[tokio::test]
async fn test_rate_limit_isolation() {
    let app = common::TestApp::spawn_with_config(throttled_config()).await;

    let user_a = "1.1.1.1";
    let user_b = "2.2.2.2";

    for i in 1..=2 {
        assert_eq!(submit_from(&app, user_a).await, StatusCode::OK, "Request {i} for User A should succeed");
    }
    assert_eq!(submit_from(&app, user_a).await, StatusCode::TOO_MANY_REQUESTS, "User A should now be blocked");

    assert_eq!(submit_from(&app, user_b).await, StatusCode::OK, "User B should be unaffected");
    assert_eq!(app.sendgrid.requests().len(), 3, "Throttled requests never reach the provider");
}

#[tokio::test]
async fn test_rate_limit_proxy_chain() {
    let app = common::TestApp::spawn_with_config(throttled_config()).await;

    let chain = "9.9.9.9, 1.1.1.1, 2.2.2.2";
    for _ in 0..2 {
        assert_eq!(submit_from(&app, chain).await, StatusCode::OK);
    }

    assert_eq!(
        submit_from(&app, "different.spoof, 2.2.2.2").await,
        StatusCode::TOO_MANY_REQUESTS,
        "Should block based on the rightmost untrusted IP"
    );
}

#[tokio::test]
async fn test_concurrent_burst_is_capped() {
    let app = common::TestApp::spawn_with_config(throttled_config()).await;

    let statuses = join_all((0..5).map(|_| submit_from(&app, "3.3.3.3"))).await;

    let accepted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let throttled = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
    assert_eq!(accepted, 2);
    assert_eq!(throttled, 3);
}

#[tokio::test]
async fn test_health_is_not_throttled() {
    let app = common::TestApp::spawn_with_config(throttled_config()).await;

    for _ in 0..5 {
        let resp = app
            .client
            .get(format!("{}/api/health", app.server_url))
            .header("X-Forwarded-For", "4.4.4.4")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
