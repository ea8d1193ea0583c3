mod app;
mod automation;
mod config;
mod process;
mod script;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult, ExitCodeClass};
pub use automation::AutomationError;
pub use config::ConfigError;
pub use process::ProcessError;
pub use script::{FetchError, ScriptError};
pub use validation::ValidationError;
