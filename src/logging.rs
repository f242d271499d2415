use tracing::Level;

/// Diagnostics go to stderr at a fixed ceiling so stdout carries only the
/// report.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
