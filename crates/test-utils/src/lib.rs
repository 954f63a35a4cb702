//! Shared helpers for the `dirwatch` integration tests.

pub mod builders;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for anything a test waits on.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Route `tracing` output into the test harness.
///
/// Output is captured per test and only shown for failures or with
/// `--nocapture`. `RUST_LOG` picks the level; `dirwatch=debug` is the default.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dirwatch=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test after [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .expect("test timed out")
}

/// Poll `check` every 20 ms until it yields a value, failing the test after
/// [`TEST_DEADLINE`]. For effects on disk that no event reports directly.
pub async fn wait_until<T, P>(mut check: P) -> T
where
    P: FnMut() -> Option<T>,
{
    with_timeout(async {
        loop {
            if let Some(value) = check() {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}
