//! A small interactive shell.
//!
//! Each input line goes through the same pipeline: [`tokenize`] splits it into
//! words honoring quotes and backslash escapes, [`extract_redirection`] pulls
//! out `>`/`>>`/`2>` style clauses, and the [`Interpreter`] runs either a
//! [`Builtin`] in-process or an external program found on PATH, with output
//! sent to the resolved sinks.
//!
//! The public modules [`command`] and [`env`] expose the sink abstraction and
//! the session state, so the whole pipeline can be driven against in-memory
//! buffers.

mod builtin;
pub mod command;
mod completion;
pub mod env;
mod error;
mod external;
mod interpreter;
pub mod io_adapters;
mod lexer;
mod parser;
pub mod resolver;

pub use builtin::Builtin;
pub use command::{ExitCode, Outcome, Sink};
pub use completion::ShellHelper;
pub use env::ShellState;
pub use error::ShellError;
pub use external::{ExternalCommand, find_command_path, locate_command};
pub use interpreter::{Interpreter, ReplOptions};
pub use lexer::{QuoteState, tokenize};
pub use parser::{ParsedCommand, RedirectOperator, RedirectionClause, extract_redirection};
