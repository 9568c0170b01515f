//! Worker bootstrap orchestration.

use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tokio::io::BufReader;

use msgbridge_config::Config;

use crate::client::ClientConnector;
use crate::dispatch::CommandDispatcher;
use crate::events::EventQueue;
use crate::lifecycle::LifecycleReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{LineReader, LineSink, TransportError};
use crate::worker::run_worker;

/// Abstracts configuration loading so bootstrap can be tested without argv.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    fn load(&self) -> Result<Config, clap::Error>;
}

/// Loader that parses the process arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, clap::Error> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, clap::Error> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The command line could not be parsed.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Parser error, including usage text.
        #[source]
        source: clap::Error,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The session directory could not be created.
    #[error("failed to prepare session directory {path}: {source}")]
    SessionDirectory {
        /// Directory that was being created.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: io::Error,
    },
}

/// Result of a successful bootstrap.
pub struct Worker {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn LifecycleReporter>,
}

impl Worker {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Telemetry handle, mostly useful for tests.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves requests from stdin until it closes.
    ///
    /// # Errors
    ///
    /// Returns an error when stdin cannot be read or stdout cannot be
    /// written.
    pub async fn run<C>(self, connector: C) -> Result<(), TransportError>
    where
        C: ClientConnector,
    {
        let queue = Arc::new(EventQueue::new());
        let dispatcher = CommandDispatcher::new(
            self.config.credentials(),
            connector,
            Arc::clone(&queue),
            Arc::clone(&self.reporter),
        );
        run_worker(
            LineReader::new(BufReader::new(tokio::io::stdin())),
            LineSink::new(tokio::io::stdout()),
            dispatcher,
            queue,
            self.reporter,
        )
        .await
    }
}

/// Loads configuration, installs telemetry and prepares the session
/// directory.
///
/// # Errors
///
/// Returns the first failing step. Failures before telemetry is installed
/// are returned without being reported.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn LifecycleReporter>,
) -> Result<Worker, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| BootstrapError::Telemetry { source })?;

    if let Err(error) = prepare_session_directory(config.session_path()) {
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    reporter.worker_starting(&config);
    Ok(Worker {
        config,
        telemetry,
        reporter,
    })
}

fn prepare_session_directory(session_path: &Utf8Path) -> Result<(), BootstrapError> {
    let Some(parent) = session_path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|source| BootstrapError::SessionDirectory {
        path: parent.to_owned(),
        source,
    })
}
