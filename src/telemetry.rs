//! Tracing setup for binaries and embedding applications.

use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter.
pub const LOG_ENV: &str = "COORDGAME_LOG";

/// Initialize a compact tracing subscriber.
///
/// Respects `COORDGAME_LOG` for filtering and defaults to `info`. Calling it
/// again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter);
}

/// Like [`init_tracing`], but with an explicit filter such as
/// `"coordgame=debug"`. The environment variable is ignored.
pub fn init_tracing_with_filter(filter: &str) {
    install(EnvFilter::new(filter));
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_tracing_with_filter("coordgame=debug");
        init_tracing_with_filter("off");
        init_tracing();
        tracing::debug!("still logging");
    }
}
