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

pub mod adapters;
pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::email::Mailer;
use crate::adapters::email::sendgrid::SendGridMailer;
use crate::config::Config;
use crate::services::contact_service::{ContactService, NotificationTemplates};
use crate::services::rate_limit_service::RateLimitService;
use std::sync::Arc;
use tokio::sync::watch;

/// Wired application services, ready to be handed to [`api::app_router`].
#[derive(Debug)]
pub struct App {
    pub services: api::ServiceContainer,
}

/// Builds the service graph from configuration.
///
/// Every fallible startup check happens here, before any listener binds: a
/// missing provider credential or an unparsable address aborts the boot.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Validates configuration and wires the services.
    ///
    /// # Errors
    /// Returns an error if the provider credential is missing, an address is
    /// invalid, or the notification templates fail to compile.
    pub fn build(self) -> anyhow::Result<App> {
        let addresses = self.config.email.addresses()?;

        let mailer: Arc<dyn Mailer> = Arc::new(SendGridMailer::new(&self.config.email)?);

        let templates = NotificationTemplates::new()?;
        let contact_service = ContactService::new(mailer, templates, addresses, self.config.email.send_timeout());
        let rate_limit_service = RateLimitService::new(self.config.server.trusted_proxies.clone());

        Ok(App { services: api::ServiceContainer { contact_service, rate_limit_service } })
    }
}

/// Routes panics through `tracing` so they land in the structured log stream.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(panic.location = %location, panic.payload = %payload, "panic occurred");
    }));
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, draining connections");
        let _ = shutdown_tx.send(true);
    });
}
