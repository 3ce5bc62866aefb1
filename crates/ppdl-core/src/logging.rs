//! Global `tracing` subscriber.
//!
//! Logs go to stderr so stdout stays clean for `fetch --dry` and `list`
//! output. With `--log-file` they are appended to the XDG state log instead.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "info,ppdl_cli=debug,ppdl_core=debug";

/// `~/.local/state/ppdl/ppdl.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("ppdl")?;
    Ok(dirs.get_state_home().join("ppdl").join("ppdl.log"))
}

/// `RUST_LOG` wins over `--verbose`.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_FILTER } else { "info" }))
}

/// Install the subscriber. If `to_file` is set but the log file cannot be
/// opened, falls back to stderr and says so.
pub fn init_logging(verbose: bool, to_file: bool) {
    if !to_file {
        init_stderr(verbose);
        return;
    }
    match open_log_file() {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(verbose))
                .with_writer(AppendLog(file))
                .with_ansi(false)
                .with_thread_names(true)
                .init();
            tracing::info!("ppdl {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
        }
        Err(e) => {
            init_stderr(verbose);
            tracing::warn!("log file unavailable, using stderr: {:#}", e);
        }
    }
}

fn init_stderr(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

fn open_log_file() -> Result<(PathBuf, File)> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok((path, file))
}

/// Hands each event a clone of the log file handle; stderr if cloning fails.
struct AppendLog(File);

enum EventWriter {
    File(File),
    Stderr(io::Stderr),
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EventWriter::File(f) => f.write(buf),
            EventWriter::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EventWriter::File(f) => f.flush(),
            EventWriter::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for AppendLog {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => EventWriter::File(f),
            Err(_) => EventWriter::Stderr(io::stderr()),
        }
    }
}
