//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::BootstrapArgs;
pub use defaults::default_worker_count;
pub use types::{ReadinessPolicy, Role};

pub(crate) use defaults::SCRIPT_EXTENSION;
