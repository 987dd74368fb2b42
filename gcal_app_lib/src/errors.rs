use anyhow::Error as AnyhowError;
use stack_string::StackString;
use std::fmt;
use thiserror::Error;

/// Exit status for usage errors and unparseable dates.
pub const EXIT_USAGE: u8 = 2;
/// Exit status for failures reported by the event source or token store.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("unable to parse time or duration: {0}")]
    UnparseableExpression(StackString),
    #[error("wrong number of arguments: {}", .0.join(", "))]
    ArgumentCount(Vec<StackString>),
}

/// A usage problem together with the usage text of the command it concerns.
/// `message` is `None` when help was asked for explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    pub message: Option<StackString>,
    pub usage: StackString,
}

impl UsageError {
    #[must_use]
    pub fn is_help(&self) -> bool {
        self.message.is_none()
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str("help requested"),
        }
    }
}

impl std::error::Error for UsageError {}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("{0}")]
    Collaborator(#[from] AnyhowError),
    #[error("io Error {0}")]
    IoError(#[from] std::io::Error),
    #[error("command {0} registered twice")]
    DuplicateVerb(StackString),
}

impl CommandError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(e) if e.is_help() => 0,
            Self::Date(_) | Self::Usage(_) => EXIT_USAGE,
            Self::Collaborator(_) | Self::IoError(_) | Self::DuplicateVerb(_) => EXIT_FAILURE,
        }
    }
}
