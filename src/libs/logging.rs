use anyhow::Context;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the `-v`/`-q` flags.
///
/// ```
/// assert_eq!(hpphylo::libs::logging::level(0, false), "info");
/// assert_eq!(hpphylo::libs::logging::level(1, false), "debug");
/// assert_eq!(hpphylo::libs::logging::level(5, false), "trace");
/// assert_eq!(hpphylo::libs::logging::level(2, true), "warn");
/// ```
pub fn level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the flags. With a
/// `logfile` the events are appended there without colours instead of going
/// to stderr.
pub fn init(verbose: u8, quiet: bool, logfile: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level(verbose, quiet)));

    let installed = match logfile {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
        }
        None => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("could not set up logging: {}", e))
}
