//! Structured reporting of worker lifecycle events.

use std::sync::Arc;

use msgbridge_config::Config;

use crate::bootstrap::BootstrapError;
use crate::client::ClientError;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Observer for lifecycle events, used to surface them to telemetry.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked once configuration and telemetry are ready.
    fn worker_starting(&self, config: &Config);

    /// Invoked when bootstrap fails after telemetry was installed.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after the command loop has ended.
    fn worker_stopped(&self);

    /// Invoked before the external client is created.
    fn client_connecting(&self);

    /// Invoked once the client is connected and subscribed.
    fn client_ready(&self, authorized: bool);

    /// Invoked when creating the client fails.
    fn client_failed(&self, error: &ClientError);

    /// Invoked when the event queue has evicted events since the last report.
    fn events_dropped(&self, newly_dropped: u64, total_dropped: u64);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter,
{
    fn worker_starting(&self, config: &Config) {
        (**self).worker_starting(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn worker_stopped(&self) {
        (**self).worker_stopped();
    }

    fn client_connecting(&self) {
        (**self).client_connecting();
    }

    fn client_ready(&self, authorized: bool) {
        (**self).client_ready(authorized);
    }

    fn client_failed(&self, error: &ClientError) {
        (**self).client_failed(error);
    }

    fn events_dropped(&self, newly_dropped: u64, total_dropped: u64) {
        (**self).events_dropped(newly_dropped, total_dropped);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn worker_starting(&self, config: &Config) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "worker_starting",
            api_id = config.api_id,
            session = %config.session_path(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "worker starting"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "worker bootstrap failed"
        );
    }

    fn worker_stopped(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "worker_stopped",
            "input closed; worker stopped"
        );
    }

    fn client_connecting(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "client_connecting",
            "creating messaging client"
        );
    }

    fn client_ready(&self, authorized: bool) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "client_ready",
            authorized,
            "messaging client ready"
        );
    }

    fn client_failed(&self, error: &ClientError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "client_failed",
            error = ?error,
            "messaging client could not be created"
        );
    }

    fn events_dropped(&self, newly_dropped: u64, total_dropped: u64) {
        tracing::warn!(
            target: LIFECYCLE_TARGET,
            event = "events_dropped",
            newly_dropped,
            total_dropped,
            "event queue overflowed; oldest events were discarded"
        );
    }
}
