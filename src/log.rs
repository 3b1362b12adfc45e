pub use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Used when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "info";

pub fn init_logger() {
  let format = fmt::format()
    .with_source_location(false)
    .with_line_number(false)
    .with_thread_ids(false)
    .with_thread_names(true)
    .with_target(true)
    .with_level(true)
    .compact();
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
  tracing_subscriber::fmt()
    .event_format(format)
    .with_env_filter(filter)
    .init();
}
