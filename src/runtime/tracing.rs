use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVES: &str = "kitchen_dashboard=info,dashboard=info";

/// Initializes structured logging for the dashboard.
///
/// Verbosity comes from `RUST_LOG` (e.g. `RUST_LOG=kitchen_dashboard=debug`)
/// and falls back to info level for this crate. Calling it twice is harmless;
/// the second subscriber is simply not installed.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
