use tracing_subscriber::{fmt, EnvFilter};

/// Route `tracing` output through the test harness; `RUST_LOG` selects
/// the level.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
