#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use portfolio_server::config::Config;
use portfolio_server::{AppBuilder, telemetry};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    portfolio_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router) = async {
        // Fails before anything binds when the provider credential is absent.
        let app = AppBuilder::new(config.clone()).build().inspect_err(|e| {
            tracing::error!(error = %e, "Refusing to start");
        })?;

        let app_router = portfolio_server::api::app_router(&config, app.services)?;

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, static_dir = ?config.server.static_dir, "listening");

        Ok::<(tokio::net::TcpListener, axum::Router), anyhow::Error>((listener, app_router))
    }
    .instrument(boot_span)
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    portfolio_server::spawn_signal_handler(shutdown_tx);

    let mut drain_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_rx;
            let _ = rx.wait_for(|&s| s).await;
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        res = server => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = async {
            let _ = drain_rx.wait_for(|&s| s).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Timeout waiting for in-flight requests to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
