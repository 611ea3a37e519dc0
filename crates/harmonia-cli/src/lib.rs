//! Library side of the `harmonia` command line runner.

pub mod logging;
pub mod pipeline;
pub mod types;
