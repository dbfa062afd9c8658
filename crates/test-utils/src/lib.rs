//! Shared fixtures for pipedag's integration tests.

pub mod builders;
pub mod fake_launcher;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures. Filter with the
/// same variable the binary uses, e.g. `PIPEDAG_LOG=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(pipedag::logging::LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("warn,pipedag=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(output) => output,
        Err(_) => panic!("test step timed out after {TEST_TIMEOUT:?}"),
    }
}
