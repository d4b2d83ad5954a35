use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::summary::event::Event;
use crate::summary::record::read_record;

/// One logged scalar value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarPoint {
    pub step: i64,
    pub wall_time: f64,
    pub value: f64,
}

pub fn is_event_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.contains("tfevents"))
}

/// Decodes every complete event in one file.
pub fn read_event_file(path: &Path) -> Result<Vec<Event>> {
    let corrupt = |reason: String| Error::CorruptEvent { path: path.to_path_buf(), reason };
    let mut reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    loop {
        let payload = match read_record(&mut reader) {
            Ok(Some(p)) => p,
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => return Err(corrupt(e.to_string())),
            Err(e) => return Err(e.into()),
        };
        events.push(Event::decode(&payload).map_err(corrupt)?);
    }
    Ok(events)
}

fn event_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_event_file(p))
        .collect();
    files.sort_by_cached_key(|p| file_order(p));
    Ok(files)
}

/// Sort key for an event file: creation second, then the per-process counter
/// (`events.out.tfevents.<secs>.<host>.<pid>.<n>.v2`), then the name.
/// Names that do not follow this layout sort by name after the timestamp.
fn file_order(path: &Path) -> (u64, u64, String) {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let fields: Vec<&str> = name.split('.').collect();
    let secs = fields.get(3).and_then(|f| f.parse().ok()).unwrap_or(0);
    let counter = match fields.as_slice() {
        [.., n, "v2"] if fields.len() >= 7 => n.parse().unwrap_or(0),
        _ => 0,
    };
    (secs, counter, name)
}

/// All scalar series in a run directory, keyed by tag.
///
/// Files are read in creation order (timestamp, then counter), and points
/// keep the order in which they were written.
pub fn read_scalars(run_dir: &Path) -> Result<BTreeMap<String, Vec<ScalarPoint>>> {
    let mut series: BTreeMap<String, Vec<ScalarPoint>> = BTreeMap::new();
    for file in event_files(run_dir)? {
        for event in read_event_file(&file)? {
            for v in event.values {
                series.entry(v.tag).or_default().push(ScalarPoint {
                    step: event.step,
                    wall_time: event.wall_time,
                    value: v.simple_value as f64,
                });
            }
        }
    }
    Ok(series)
}

/// Every directory under `log_dir` (inclusive) that holds event files,
/// named by its `/`-separated path relative to `log_dir` (`.` for the root).
pub fn discover_runs(log_dir: &Path) -> Result<Vec<String>> {
    let mut runs = Vec::new();
    collect_runs(log_dir, log_dir, &mut runs)?;
    runs.sort();
    Ok(runs)
}

fn collect_runs(root: &Path, dir: &Path, runs: &mut Vec<String>) -> Result<()> {
    if !event_files(dir)?.is_empty() {
        runs.push(run_name(root, dir));
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_runs(root, &path, runs)?;
        }
    }
    Ok(())
}

fn run_name(root: &Path, dir: &Path) -> String {
    let parts: Vec<String> = dir
        .strip_prefix(root)
        .map(|rel| rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Resolves a run name from `discover_runs` back to its directory.
///
/// Names with `..` components or absolute paths are rejected.
pub fn run_dir(log_dir: &Path, run: &str) -> Result<PathBuf> {
    if run == "." {
        return Ok(log_dir.to_path_buf());
    }
    let mut dir = log_dir.to_path_buf();
    for part in run.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
            return Err(Error::config(format!("invalid run name '{}'", run)));
        }
        dir.push(part);
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dir_rejects_traversal() {
        let root = Path::new("logs");
        assert_eq!(run_dir(root, ".").unwrap(), PathBuf::from("logs"));
        assert_eq!(run_dir(root, "a/b").unwrap(), PathBuf::from("logs/a/b"));
        assert!(run_dir(root, "../etc").is_err());
        assert!(run_dir(root, "/abs").is_err());
        assert!(run_dir(root, "a//b").is_err());
    }

    #[test]
    fn file_order_compares_counter_numerically() {
        let a = Path::new("events.out.tfevents.0000000100.host.42.2.v2");
        let b = Path::new("events.out.tfevents.0000000100.host.42.10.v2");
        let c = Path::new("events.out.tfevents.0000000101.host.42.0.v2");
        assert!(file_order(a) < file_order(b));
        assert!(file_order(b) < file_order(c));
    }
}
