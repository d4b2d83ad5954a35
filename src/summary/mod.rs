//! TensorBoard-compatible scalar logging.

pub mod event;
pub mod reader;
pub mod record;
pub mod writer;

pub use event::{Event, ScalarValue};
pub use reader::{discover_runs, read_event_file, read_scalars, run_dir, ScalarPoint};
pub use writer::SummaryWriter;
