//! Utilities - logging setup, progress spinners and terminal styling

mod logging;
mod progress;
mod styling;

pub use logging::init_logging;
pub use progress::*;
pub use styling::*;
