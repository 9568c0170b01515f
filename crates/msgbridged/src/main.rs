use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use msgbridged::{
    BootstrapError, DetachedConnector, StructuredLifecycleReporter, SystemConfigLoader,
    bootstrap_with,
};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredLifecycleReporter::new());
    let worker = match bootstrap_with(&SystemConfigLoader, reporter) {
        Ok(worker) => worker,
        Err(BootstrapError::Configuration { source }) => source.exit(),
        Err(error) => {
            let _ = writeln!(io::stderr(), "msgbridged: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!(error = %error, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(worker.run(DetachedConnector)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "worker stopped on a stream failure");
            ExitCode::FAILURE
        }
    }
}
