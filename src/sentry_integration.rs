//! Error capture. Unexpected errors are logged with their full cause chain
//! and, when a DSN is configured, shipped to sentry.

use failure::Error as FailureError;
use sentry;
use sentry::integrations::panic::register_panic_handler;
use sentry::ClientInitGuard;

use config;

/// Keep the returned guard alive for the lifetime of the server.
pub fn init(sentry_config: Option<&config::Sentry>) -> Option<ClientInitGuard> {
    sentry_config.map(|sentry_config| {
        info!("Sentry integration enabled.");
        let guard = sentry::init(sentry_config.dsn.as_str());
        register_panic_handler();
        guard
    })
}

pub fn log_and_capture_error(error: &FailureError) {
    error!("{:?}", error);
    sentry::integrations::failure::capture_error(error);
}
