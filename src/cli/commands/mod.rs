//! CLI command implementations.

mod config;
mod serve;
mod tools;

pub use config::run_config;
pub use serve::run_serve;
pub use tools::run_tools;
