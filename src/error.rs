//! Error types reported by builtins and the dispatcher.

use std::io;

/// Errors a command can report to the user.
///
/// The `Display` text is the exact line written to the error sink.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Wrong number of arguments to a builtin. The loop continues.
    #[error("{command}: too many arguments")]
    Usage { command: &'static str },

    /// A path or program that does not exist.
    #[error("{0}: No such file or directory")]
    NotFound(String),

    /// A path that exists but is not a directory.
    #[error("{0}: Not a directory")]
    NotADirectory(String),

    /// Unrecoverable input; the shell terminates with `code`.
    #[error("{message}")]
    FatalInput { message: String, code: i32 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Whether this error must abort the read-eval loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::FatalInput { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
