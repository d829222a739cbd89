use crate::command::{ExitCode, Outcome};
use crate::env::ShellState;
use crate::error::{Result, ShellError};
use crate::external::locate_command;
use crate::resolver;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

/// Built-in commands known to the shell at compile time.
///
/// Builtins run in-process against the session's [`ShellState`]. Anything that
/// is not one of these falls through to an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Echo,
    Type,
    Pwd,
    Cd,
}

impl Builtin {
    /// Every builtin, in the order they are offered for completion.
    pub const ALL: [Builtin; 5] = [
        Builtin::Cd,
        Builtin::Echo,
        Builtin::Exit,
        Builtin::Pwd,
        Builtin::Type,
    ];

    /// Looks up a builtin by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Canonical name of the command, e.g. "echo" or "cd".
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::Echo => "echo",
            Builtin::Type => "type",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
        }
    }

    /// Executes the builtin with `args` (not including the command name).
    ///
    /// Non-fatal errors are returned for the caller to report; the state is
    /// left untouched when an error is returned.
    pub fn execute<W: Write + ?Sized>(
        self,
        args: &[String],
        stdout: &mut W,
        state: &mut ShellState,
    ) -> Result<Outcome> {
        match self {
            Builtin::Exit => exit(args),
            Builtin::Echo => echo(args, stdout).map(Outcome::Continue),
            Builtin::Type => type_of(args, stdout, state).map(Outcome::Continue),
            Builtin::Pwd => pwd(args, stdout, state).map(Outcome::Continue),
            Builtin::Cd => cd(args, state).map(Outcome::Continue),
        }
    }
}

/// `exit [code]`
fn exit(args: &[String]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Exit(0)),
        [code] => match code.parse::<ExitCode>() {
            Ok(code) => Ok(Outcome::Exit(code)),
            Err(_) => Err(ShellError::FatalInput {
                message: format!("exit: {code}: numeric argument required"),
                code: 2,
            }),
        },
        _ => Err(ShellError::Usage { command: "exit" }),
    }
}

/// `echo [word...]`
fn echo<W: Write + ?Sized>(args: &[String], stdout: &mut W) -> Result<ExitCode> {
    writeln!(stdout, "{}", args.join(" "))?;
    Ok(0)
}

/// `pwd`
fn pwd<W: Write + ?Sized>(
    args: &[String],
    stdout: &mut W,
    state: &ShellState,
) -> Result<ExitCode> {
    if !args.is_empty() {
        return Err(ShellError::Usage { command: "pwd" });
    }
    writeln!(stdout, "{}", state.working_dir)?;
    Ok(0)
}

/// `cd [dir]`
fn cd(args: &[String], state: &mut ShellState) -> Result<ExitCode> {
    match args {
        [] => resolver::change_dir(state, None)?,
        [dir] => resolver::change_dir(state, Some(dir.as_str()))?,
        _ => return Err(ShellError::Usage { command: "cd" }),
    }
    Ok(0)
}

/// `type name...`: every name is reported, misses do not stop the scan.
fn type_of<W: Write + ?Sized>(
    args: &[String],
    stdout: &mut W,
    state: &ShellState,
) -> Result<ExitCode> {
    let search_paths = state.get_var("PATH").unwrap_or_default();
    let cwd = Path::new(&state.working_dir);
    let mut status = 0;
    for name in args {
        if Builtin::from_name(name).is_some() {
            writeln!(stdout, "{name} is a shell builtin")?;
            continue;
        }
        match locate_command(OsStr::new(search_paths), cwd, name) {
            Some(path) => writeln!(stdout, "{name} is {}", path.display())?,
            None => {
                writeln!(stdout, "{name}: not found")?;
                status = 1;
            }
        }
    }
    Ok(status)
}
