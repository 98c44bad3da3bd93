//! File logging bootstrap. Stdout carries the IPC protocol, so diagnostics
//! go to a small set of rotating files next to the data file.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use std::path::Path;

const LOG_FILE_BASENAME: &str = "notasd";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts file logging under `log_dir`. The returned handle must be kept
/// alive for the process lifetime. `RUST_LOG` overrides the default level.
pub fn init(log_dir: &Path) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("failed to create log directory {}: {e}", log_dir.display()))?;

    Logger::try_with_env_or_str("info")
        .map_err(|e| format!("invalid log level: {e}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .append()
        .start()
        .map_err(|e| format!("failed to start logger: {e}"))
}
