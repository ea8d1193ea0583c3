//! Child process supervision for the Locust engine.
mod engine;
mod supervisor;


pub use engine::{LaunchCommand, coordinator_command, worker_command};
pub use supervisor::{ManagedProcess, ProcessKind, ProcessSupervisor};
