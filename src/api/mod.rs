use crate::api::rate_limit::log_rate_limit_events;
use crate::config::Config;
use crate::services::contact_service::ContactService;
use crate::services::rate_limit_service::RateLimitService;
use anyhow::anyhow;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod contact;
pub mod fallback;
pub mod frontend;
pub mod health;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;

#[derive(Clone, Debug)]
pub struct AppState {
    pub contact_service: ContactService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub contact_service: ContactService,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the application router.
///
/// # Errors
/// Returns an error if the rate limiter configuration cannot be constructed.
pub fn app_router(config: &Config, services: ServiceContainer) -> anyhow::Result<Router> {
    let interval_ms = 60_000 / u64::from(config.rate_limit.contact_per_minute.max(1));
    let contact_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(interval_ms.max(1))
            .burst_size(config.rate_limit.contact_burst.max(1))
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .ok_or_else(|| anyhow!("Failed to build contact rate limiter config"))?,
    );

    let state = AppState { contact_service: services.contact_service, rate_limit_service: services.rate_limit_service };

    // Each accepted submission sends an email, so this route is throttled per client.
    let contact_routes = Router::new()
        .route("/contact", post(contact::submit_contact).fallback(fallback::method_not_allowed))
        .layer(GovernorLayer::new(contact_conf))
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events));

    let api_routes = Router::new()
        .route("/health", get(health::health).fallback(fallback::method_not_allowed))
        .merge(contact_routes)
        .fallback(fallback::api_not_found);

    let router = Router::new().nest("/api", api_routes);
    let router = match &config.server.static_dir {
        Some(dir) => router.fallback_service(frontend::serve(dir)),
        None => router.fallback(frontend::not_built),
    };

    Ok(router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                    let status = response.status();
                    tracing::Span::current().record("http.response.status_code", status.as_u16());

                    tracing::info!(
                        latency_ms = %latency.as_millis(),
                        status = %status.as_u16(),
                        "request completed"
                    );
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state))
}
