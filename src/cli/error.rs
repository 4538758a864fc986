//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Http { .. } => exitcode::UNAVAILABLE,
                InfraError::Application(e) => match e {
                    ApplicationError::Domain(e) => match e {
                        DomainError::Parse { .. } => exitcode::DATAERR,
                        DomainError::ResourceExceeded(_) => exitcode::TOOBIG,
                        DomainError::InvariantViolation(_) => exitcode::SOFTWARE,
                        DomainError::OverlappingTagGroups { .. }
                        | DomainError::ConjunctionInTagGroup { .. }
                        | DomainError::EmptyTagGroup(_)
                        | DomainError::UnsupportedPolicyVersion(_) => exitcode::CONFIG,
                    },
                    ApplicationError::Parser(_) => exitcode::UNAVAILABLE,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::EmptyInput => exitcode::NOINPUT,
                },
            },
        }
    }
}
