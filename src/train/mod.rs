pub mod epoch_logs;
pub mod fit_config;
pub mod loop_fn;

pub use epoch_logs::{EpochLogs, History};
pub use fit_config::FitConfig;
pub use loop_fn::{evaluate, fit};
