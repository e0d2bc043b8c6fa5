//! Shared fixtures for callbackd's tests: a scriptable event source, an
//! invoker that records instead of spawning, builders and log capture.

pub mod builders;
pub mod fake_source;
pub mod logs;
pub mod recording_invoker;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use callbackd::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for anything a test awaits.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Route `tracing` output through the test harness, so it only shows up for
/// failing tests (or with `--nocapture`).
///
/// The filter is read from `CALLBACKD_LOG`, e.g.
/// `CALLBACKD_LOG=callbackd::exec=trace cargo test`; default `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step timed out after {TEST_TIMEOUT:?}"),
    }
}
