use std::path::PathBuf;

use anyhow::Context;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use glove_vocab::config;

/// File log at debug with rotation; warnings and errors also go to stderr.
/// The handle must stay alive for the lifetime of the process.
pub fn init_logging() -> anyhow::Result<LoggerHandle> {
    let log_dir = log_dir()?;

    let handle = Logger::try_with_str("debug")?
        .log_to_file(FileSpec::default().directory(log_dir).basename(config::logging::LOG_FILE_NAME))
        .rotate(
            Criterion::Size(config::logging::LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config::logging::LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    log::info!("{}", "=".repeat(60));
    log::info!("vocab_tool starting");
    log::info!("Version: {}", config::TOOL_VERSION);
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("{}", "=".repeat(60));

    Ok(handle)
}

fn log_dir() -> anyhow::Result<PathBuf> {
    let dir = match std::env::var(config::logging::LOG_DIR_ENV) {
        Ok(v) if !v.is_empty() => PathBuf::from(v),
        _ => home_dir()
            .context("cannot determine home directory for logs")?
            .join(config::logging::LOG_DIR_REL),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("failed creating log dir {}", dir.display()))?;
    Ok(dir)
}

fn home_dir() -> Option<PathBuf> {
    if let Ok(v) = std::env::var("HOME") {
        if !v.is_empty() {
            return Some(PathBuf::from(v));
        }
    }
    // Windows fallback
    if let Ok(v) = std::env::var("USERPROFILE") {
        if !v.is_empty() {
            return Some(PathBuf::from(v));
        }
    }
    None
}
