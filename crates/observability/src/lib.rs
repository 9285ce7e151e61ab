//! Tracing and logging setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize process-wide logging.
///
/// The format comes from `MYSHOP_LOG_FORMAT` (`json` or `pretty`, default
/// `json`). Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format = std::env::var("MYSHOP_LOG_FORMAT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default();
    self::tracing::init(format);
}
