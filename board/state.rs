use std::path::PathBuf;
use std::sync::Arc;

/// Read-only configuration shared by every request thread.
#[derive(Debug)]
pub struct BoardState {
    pub log_dir: PathBuf,
}

impl BoardState {
    pub fn new(log_dir: PathBuf) -> BoardState {
        BoardState { log_dir }
    }
}

pub type SharedState = Arc<BoardState>;
