use std::io::Cursor;
use std::path::Path;

use serde::Serialize;
use tiny_http::Response;

use ferrite_metrics::summary::{discover_runs, read_scalars, run_dir};

use crate::routes::{json_response, server_error};
use crate::state::BoardState;

#[derive(Debug, Serialize)]
pub struct RunInfo {
    pub name: String,
    pub tags: Vec<String>,
}

/// Every run under `log_dir` with its scalar tags. A missing log directory
/// has no runs yet.
pub fn list_runs(log_dir: &Path) -> ferrite_metrics::Result<Vec<RunInfo>> {
    if !log_dir.is_dir() {
        return Ok(Vec::new());
    }
    discover_runs(log_dir)?
        .into_iter()
        .map(|name| {
            let tags = read_scalars(&run_dir(log_dir, &name)?)?.into_keys().collect();
            Ok(RunInfo { name, tags })
        })
        .collect()
}

/// `GET /api/runs`
pub fn handle_get(state: &BoardState) -> Response<Cursor<Vec<u8>>> {
    let runs = match list_runs(&state.log_dir) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(logdir = %state.log_dir.display(), "listing runs failed: {e}");
            return server_error(&e.to_string());
        }
    };
    let body = serde_json::json!({
        "log_dir": state.log_dir.display().to_string(),
        "runs": runs,
    });
    json_response(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_metrics::SummaryWriter;

    #[test]
    fn lists_runs_with_tags() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = SummaryWriter::create(dir.path().join("sequential")).unwrap();
        w.scalar("jaccard_score", 0.5, 1).unwrap();
        w.flush().unwrap();
        let mut t = SummaryWriter::create(dir.path().join("train")).unwrap();
        t.scalar("epoch_loss", 1.0, 1).unwrap();
        t.scalar("epoch_accuracy", 0.3, 1).unwrap();
        t.flush().unwrap();

        let runs = list_runs(dir.path()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].name, "sequential");
        assert_eq!(runs[0].tags, vec!["jaccard_score".to_string()]);
        assert_eq!(runs[1].tags, vec!["epoch_accuracy".to_string(), "epoch_loss".to_string()]);
    }

    #[test]
    fn missing_log_dir_has_no_runs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_runs(&dir.path().join("nope")).unwrap().is_empty());
    }
}
