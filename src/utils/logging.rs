//! Logger setup and the `log_*!` macros.
//!
//! Each macro expands to the matching `log` call guarded by an
//! `ENABLE_LOGS` constant that must be in scope where the macro is used, so a
//! noisy module can be silenced without touching `RUST_LOG`:
//!
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("Loaded {} recipes", count);
//! ```

/// `log::info!` when the caller's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::debug!` when the caller's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// `log::warn!` when the caller's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::error!` when the caller's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Installs `env_logger` with an `Info` default that `RUST_LOG` overrides.
///
/// Later calls are no-ops, so a host shell and the test harness can both
/// call it.
pub fn init_logging() {
    let result = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    if result.is_ok() {
        log::debug!("Logging initialised");
    }
}
