use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::summary::event::Event;
use crate::summary::record::write_record;

const FILE_VERSION: &str = "brain.Event:2";

/// Distinguishes event files created by one process within the same second.
static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Append-only writer for one TensorBoard event file.
///
/// Every writer owns a fresh file in its directory, so several writers (or
/// several runs) can target the same directory without clobbering each other.
pub struct SummaryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SummaryWriter {
    /// Creates `dir` if needed and opens a new event file inside it.
    pub fn create(dir: impl AsRef<Path>) -> Result<SummaryWriter> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let name = format!(
            "events.out.tfevents.{:010}.{}.{}.{:06}.v2",
            secs,
            hostname(),
            std::process::id(),
            FILE_COUNTER.fetch_add(1, Ordering::Relaxed),
        );
        let path = dir.join(name);
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;

        let mut writer = SummaryWriter { path, writer: BufWriter::new(file) };
        writer.write_event(&Event::file_version(wall_time(), FILE_VERSION))?;
        writer.flush()?;
        tracing::debug!(path = %writer.path.display(), "created event file");
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one scalar point. Not visible to readers until `flush`.
    pub fn scalar(&mut self, tag: &str, value: f64, step: i64) -> Result<()> {
        self.write_event(&Event::scalar(wall_time(), step, tag, value as f32))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        write_record(&mut self.writer, &event.encode())?;
        Ok(())
    }
}

impl Drop for SummaryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), "failed to flush event file: {e}");
        }
    }
}

fn wall_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Host name from the environment, restricted to filename-safe characters.
fn hostname() -> String {
    let raw = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "localhost".to_string()
    } else {
        cleaned
    }
}
