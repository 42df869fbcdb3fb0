//! The handful of environment-variable-driven knobs the core consults directly: a busy timeout
//! and a log filter are exactly the kind of thing an operator legitimately needs to tune
//! per-deployment, while everything else about behavior stays fixed.

use std::time::Duration;

use crate::error::{PackError, PackResult};

pub const LOG_ENV_VAR: &str = "RSQLITEPACK_LOG";
pub const BUSY_TIMEOUT_ENV_VAR: &str = "RSQLITEPACK_BUSY_TIMEOUT_MS";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Reads `RSQLITEPACK_BUSY_TIMEOUT_MS`, falling back to five minutes when unset. An unparseable
/// value is a configuration error, reported the same way other invalid-input errors are.
pub fn busy_timeout() -> PackResult<Duration> {
    match std::env::var(BUSY_TIMEOUT_ENV_VAR) {
        Err(_) => Ok(DEFAULT_BUSY_TIMEOUT),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| {
                PackError::invalid_input(
                    BUSY_TIMEOUT_ENV_VAR,
                    format!("{raw:?} is not a valid millisecond count"),
                )
            }),
    }
}
