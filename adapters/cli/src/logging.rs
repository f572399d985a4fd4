//! Logger set-up for the command-line adapter.

use env_logger::{Builder, Env};

/// Installs `env_logger` for the process.
///
/// A `RUST_LOG` directive wins over the `--verbose` flag.
pub(crate) fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let installed = Builder::from_env(Env::default().default_filter_or(fallback))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();

    if installed.is_err() {
        log::debug!("logger already installed, keeping it");
    }
}
