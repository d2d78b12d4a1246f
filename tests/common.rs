#![allow(dead_code, unreachable_pub, clippy::unwrap_used, clippy::missing_panics_doc, clippy::must_use_candidate)]
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use portfolio_server::AppBuilder;
use portfolio_server::config::{
    Config, EmailConfig, LogFormat, RateLimitConfig, ServerConfig, TelemetryConfig,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub const TEST_API_KEY: &str = "SG.test-key";
pub const OWNER_EMAIL: &str = "owner@example.com";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("portfolio_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // 0 means let OS choose
            request_timeout_secs: 30,
            shutdown_timeout_secs: 1,
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()],
            static_dir: None,
        },
        email: EmailConfig {
            sendgrid_api_key: Some(TEST_API_KEY.to_string()),
            // Replaced with the fake provider's address by TestApp.
            sendgrid_base_url: "http://127.0.0.1:9".to_string(),
            owner_email: OWNER_EMAIL.to_string(),
            sender_email: "noreply@yourportfolio.com".to_string(),
            sender_name: "Portfolio Contact Form".to_string(),
            send_timeout_secs: 2,
        },
        rate_limit: RateLimitConfig { contact_per_minute: 10_000, contact_burst: 10_000 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub fn valid_submission() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "subject": "Project inquiry",
        "message": "I would like to talk about a project."
    })
}

/// One request the fake provider received.
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct FakeState {
    requests: Arc<Mutex<Vec<RecordedSend>>>,
    status: Arc<AtomicU16>,
}

/// Stand-in for the SendGrid API. Answers `POST /v3/mail/send` with a
/// configurable status and records every request.
#[derive(Debug, Clone)]
pub struct FakeSendGrid {
    pub url: String,
    state: FakeState,
}

impl FakeSendGrid {
    pub async fn start() -> Self {
        let state = FakeState { requests: Arc::new(Mutex::new(Vec::new())), status: Arc::new(AtomicU16::new(202)) };

        let app = axum::Router::new().route("/v3/mail/send", post(record_send)).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url: format!("http://{addr}"), state }
    }

    pub fn respond_with(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedSend> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn record_send(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
    state.requests.lock().unwrap().push(RecordedSend { authorization, body });

    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap();
    if status.is_success() {
        (status, Json(json!({})))
    } else {
        (status, Json(json!({ "errors": [{ "message": "The provided authorization grant is invalid" }] })))
    }
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub sendgrid: FakeSendGrid,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    /// Starts the server on an ephemeral port, wired to a fresh fake provider.
    pub async fn spawn_with_config(mut config: Config) -> Self {
        setup_tracing();

        let sendgrid = FakeSendGrid::start().await;
        config.email.sendgrid_base_url.clone_from(&sendgrid.url);

        let app = AppBuilder::new(config.clone()).build().unwrap();
        let router = portfolio_server::api::app_router(&config, app.services).unwrap();

        let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new(), config, sendgrid }
    }

    pub async fn post_contact(&self, body: &Value) -> reqwest::Response {
        self.client.post(format!("{}/api/contact", self.server_url)).json(body).send().await.unwrap()
    }
}
