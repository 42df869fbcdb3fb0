//! Structured logging via `tracing`/`tracing-subscriber`, independent of the per-input progress
//! lines the CLI writes straight to stderr (see `progress`). Default filter is `warn`; each `-v`
//! on the command line raises it by one step unless `RSQLITEPACK_LOG` overrides it entirely.

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV_VAR;

pub fn init(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
