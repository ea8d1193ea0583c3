use thiserror::Error;

use super::{
    AutomationError, ConfigError, FetchError, ProcessError, ScriptError, ValidationError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
    #[error("Automation error: {0}")]
    Automation(#[from] AutomationError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Exit status families reported by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCodeClass {
    Runtime,
    Configuration,
    ScriptRejected,
    ScriptFetch,
    Automation,
}

impl ExitCodeClass {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            ExitCodeClass::Runtime => 1,
            ExitCodeClass::Configuration => 2,
            ExitCodeClass::ScriptRejected => 3,
            ExitCodeClass::ScriptFetch => 4,
            ExitCodeClass::Automation => 5,
        }
    }
}

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn script<E>(error: E) -> Self
    where
        E: Into<ScriptError>,
    {
        error.into().into()
    }

    pub fn fetch(error: FetchError) -> Self {
        ScriptError::from(error).into()
    }

    pub fn process<E>(error: E) -> Self
    where
        E: Into<ProcessError>,
    {
        error.into().into()
    }

    pub fn automation<E>(error: E) -> Self
    where
        E: Into<AutomationError>,
    {
        error.into().into()
    }

    /// Classifies the error into the exit status family the process reports.
    #[must_use]
    pub const fn exit_class(&self) -> ExitCodeClass {
        match self {
            AppError::Clap { .. } | AppError::Validation(_) | AppError::Config(_) => {
                ExitCodeClass::Configuration
            }
            AppError::Script(ScriptError::EmptyScript | ScriptError::UnsupportedFormat { .. }) => {
                ExitCodeClass::ScriptRejected
            }
            AppError::Script(ScriptError::InvalidS3Locator { .. } | ScriptError::Fetch(_)) => {
                ExitCodeClass::ScriptFetch
            }
            AppError::Automation(_) => ExitCodeClass::Automation,
            AppError::Io { .. } | AppError::Process(_) => ExitCodeClass::Runtime,
        }
    }

    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.exit_class().code()
    }
}
