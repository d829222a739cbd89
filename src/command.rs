use std::io::{self, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// A writable destination for one command's standard output or error.
///
/// Builtins only need the [`Write`] half. External programs additionally ask
/// for a [`Stdio`] handle so the child can write to the destination directly;
/// sinks without an OS-level handle (in-memory buffers) return `None` and the
/// child's output is captured and copied through `Write` instead.
pub trait Sink: Write {
    /// Handle to give to a spawned child, if the sink has one.
    fn stdio(&self) -> io::Result<Option<Stdio>>;
}

/// What the read-eval loop should do after a line has been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep prompting. Carries the status of the last command.
    Continue(ExitCode),
    /// Terminate the shell with this status.
    Exit(ExitCode),
}

impl Outcome {
    pub fn code(self) -> ExitCode {
        match self {
            Outcome::Continue(code) | Outcome::Exit(code) => code,
        }
    }
}
