//! Role-based bootstrap for Locust load-testing clusters.
//!
//! A single binary runs as the Locust master, as a pool of slaves, or as a
//! controller that drives a running master through its web API. The role and
//! its parameters come from environment variables, CLI flags, or an optional
//! TOML/JSON config file.
pub mod args;
pub mod automation;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod process;
pub mod script;

mod entry;
mod logger;
pub mod shutdown;
mod shutdown_handlers;

pub use entry::run;
