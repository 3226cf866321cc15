use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initializes stderr logging; stdout is left for reports.
///
/// `RUST_LOG` wins when set, otherwise `default_level` applies to this crate.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("declaration_series={default_level}")));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
