//! Logging setup.
//!
//! Log levels:
//! - ERROR: Circuit opened, wave failed
//! - WARN: Approaching cost/rate limits, unknown pricing service, task failures
//! - INFO: Planning summaries, metered calls, circuit state transitions
//! - DEBUG: Per-wave planning detail, config loading
//!
//! Debug mode can be enabled with `--debug` flag or `WAVEPLAN_DEBUG=1` env var.
//! `RUST_LOG` takes precedence over both when set.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable enabling debug logging.
pub const DEBUG_ENV: &str = "WAVEPLAN_DEBUG";

/// Interpret a `WAVEPLAN_DEBUG` value.
pub fn debug_requested(value: Option<&str>) -> bool {
    value
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Default filter directive for the given mode.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "waveplan=debug"
    } else {
        "waveplan=info"
    }
}

/// Path of the log file, `~/.waveplan/waveplan.log`.
pub fn log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".waveplan").join("waveplan.log"))
}

/// Initialize logging with explicit debug mode setting.
///
/// Logs go to `~/.waveplan/waveplan.log` (truncated on startup), or to
/// stderr when no home directory is available. Calling this more than once
/// is harmless.
pub fn init_with_debug(debug: bool) {
    let env_debug = debug_requested(std::env::var(DEBUG_ENV).ok().as_deref());
    let directive = default_directive(debug || env_debug);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false);

    let file = log_path().and_then(|path| {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).ok()?;
        }
        File::create(&path).ok()
    });

    let _ = match file {
        Some(file) => builder.with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}
