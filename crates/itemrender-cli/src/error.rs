use itemrender_config::{ConfigError, ErrorKind};
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{failures} record(s) failed the check")]
    CheckFailed { failures: usize, report: String },
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'itemrender --help' for usage information.",
                    message
                )
            }
            CliError::Config(e) => match e.kind() {
                ErrorKind::MalformedData => format!(
                    "{}\n\nFix the file by hand or delete it to regenerate the default.",
                    e
                ),
                ErrorKind::IoFailure => format!(
                    "{}\n\nCheck that the configuration directory is writable ('itemrender check').",
                    e
                ),
                ErrorKind::InvalidArgument | ErrorKind::Validation => e.to_string(),
            },
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::CheckFailed { failures, report } => {
                format!("{}\n{} record(s) failed the check", report, failures)
            }
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
