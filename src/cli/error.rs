//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Script { .. } => crate::exitcode::DATAERR,
            CliError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                crate::exitcode::NOINPUT
            }
            CliError::Io { .. } => crate::exitcode::IOERR,
            CliError::Application(e) => match e {
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::UnknownNode(_) | ApplicationError::AmbiguousNode { .. } => {
                    crate::exitcode::DATAERR
                }
                ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, NodeId};

    #[test]
    fn given_errors_when_mapping_exit_codes_then_sysexits_values() {
        let script = CliError::Script {
            line: 3,
            message: "unknown command".into(),
        };
        assert_eq!(script.exit_code(), crate::exitcode::DATAERR);

        let missing = CliError::io(
            "read script",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(missing.exit_code(), crate::exitcode::NOINPUT);

        let fault = CliError::from(ApplicationError::from(DomainError::DuplicateId(
            NodeId::random(),
        )));
        assert_eq!(fault.exit_code(), crate::exitcode::SOFTWARE);
    }
}
