//! Configuration loading, layering, and validation.
mod apply;
mod build;
mod loader;
pub mod types;


pub use apply::apply_config;
pub use build::build_launch_config;
pub use loader::load_config;
pub use types::{
    ControllerConfig, CoordinatorConfig, EngineConfig, LaunchConfig, WorkerConfig, WorkerCount,
};

#[cfg(test)]
pub(crate) use loader::load_config_file;
