//! File logging for litechat.
use anyhow::Context;
use litechat_core::get_data_dir;
use std::io::LineWriter;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::{OffsetTime, UtcTime};

const LOG_FILE: &str = "litechat.log";
const LOG_FILTER: &str = "litechat=debug,litechat_core=debug,rustyline=info";
const MAX_LOG_SIZE: u64 = 100 * 1024;

/// Installs a tracing subscriber that writes to `<data_dir>/litechat.log`.
///
/// Logs larger than 100 KiB are moved to `litechat.log.old` first.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = data_dir.join(LOG_FILE);
    rotate_log(&log_path, &data_dir.join(format!("{LOG_FILE}.old")))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    // Flush after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing::subscriber::set_global_default(build_subscriber(writer))
        .context("Failed to install the log subscriber")?;
    Ok(())
}

fn build_subscriber<W>(writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(LOG_FILTER)
        .with_writer(writer)
        .with_ansi(false);
    // The local offset can't be read once the runtime has spawned its workers.
    match OffsetTime::local_rfc_3339() {
        Ok(timer) => Box::new(builder.with_timer(timer).finish()),
        Err(_) => Box::new(builder.with_timer(UtcTime::rfc_3339()).finish()),
    }
}

fn rotate_log(log_path: &Path, backup_path: &Path) -> std::io::Result<()> {
    if !log_path.exists() || std::fs::metadata(log_path)?.len() <= MAX_LOG_SIZE {
        return Ok(());
    }
    if backup_path.exists() {
        std::fs::remove_file(backup_path)?;
    }
    std::fs::rename(log_path, backup_path)
}
