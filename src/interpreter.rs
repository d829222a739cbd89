use crate::builtin::Builtin;
use crate::command::{ExitCode, Outcome, Sink};
use crate::completion::ShellHelper;
use crate::env::ShellState;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::io_adapters::open_redirections;
use crate::lexer;
use crate::parser::{self, ParsedCommand, RedirectionClause, Stream};
use anyhow::Context;
use rustyline::config::{BellStyle, CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Status reported when a command cannot be found or started.
pub const NOT_FOUND_STATUS: ExitCode = 127;

/// Status the shell exits with when input ends.
pub const EOF_STATUS: ExitCode = 1;

/// Settings for the interactive loop.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub prompt: String,
    /// File to load history from at startup and save it to on exit.
    pub history: Option<PathBuf>,
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            history: None,
        }
    }
}

/// What a command word resolved to.
enum Target {
    /// The line held only redirections.
    Nothing,
    Builtin(Builtin),
    External(ExternalCommand),
    Missing,
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the session's [`ShellState`]; every line is tokenized,
/// stripped of its redirections and dispatched to a builtin or a program on
/// PATH.
///
/// Example
/// ```
/// use mini_shell::{Interpreter, Outcome, ShellState};
/// let mut sh = Interpreter::new(ShellState::with_dir("/"));
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// let outcome = sh.execute_line("echo 'hello   world'", &mut out, &mut err).unwrap();
/// assert_eq!(outcome, Outcome::Continue(0));
/// assert_eq!(out, b"hello   world\n");
/// ```
pub struct Interpreter {
    state: ShellState,
}

impl Interpreter {
    pub fn new(state: ShellState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Executes one input line.
    ///
    /// `stdout` and `stderr` are the inherited sinks, used for every stream
    /// the line does not redirect. Redirection files are closed before this
    /// returns. An `Err` means the sinks themselves failed.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Sink,
        stderr: &mut dyn Sink,
    ) -> anyhow::Result<Outcome> {
        let tokens = lexer::tokenize(line);
        if tokens.is_empty() {
            return Ok(Outcome::Continue(0));
        }
        log::debug!("tokens: {tokens:?}");

        let parsed = parser::extract_redirection(tokens);
        let target = self.resolve(&parsed);

        // A missing command must not create its output files, but its error
        // message still goes where the user sent stderr.
        let clauses: Vec<RedirectionClause> = match target {
            Target::Missing => parsed
                .redirections
                .iter()
                .filter(|clause| clause.operator.stream() == Stream::Stderr)
                .cloned()
                .collect(),
            _ => parsed.redirections.clone(),
        };

        let cwd = Path::new(&self.state.working_dir);
        let mut redirected = match open_redirections(&clauses, cwd) {
            Ok(files) => files,
            Err(e) => {
                writeln!(stderr, "{e}").context("writing to stderr")?;
                return Ok(Outcome::Continue(1));
            }
        };
        let out: &mut dyn Sink = match redirected.stdout.as_mut() {
            Some(file) => file,
            None => stdout,
        };
        let err: &mut dyn Sink = match redirected.stderr.as_mut() {
            Some(file) => file,
            None => stderr,
        };

        let outcome = self.dispatch(&parsed, target, out, err);
        out.flush().context("flushing stdout")?;
        err.flush().context("flushing stderr")?;
        outcome
    }

    fn resolve(&self, parsed: &ParsedCommand) -> Target {
        let Some(name) = parsed.args.first() else {
            return Target::Nothing;
        };
        if let Some(builtin) = Builtin::from_name(name) {
            return Target::Builtin(builtin);
        }
        let search_paths = self.state.get_var("PATH").unwrap_or_default();
        let cwd = Path::new(&self.state.working_dir);
        match ExternalCommand::resolve(OsStr::new(search_paths), cwd, name, parsed.params()) {
            Some(cmd) => Target::External(cmd),
            None => Target::Missing,
        }
    }

    fn dispatch(
        &mut self,
        parsed: &ParsedCommand,
        target: Target,
        stdout: &mut dyn Sink,
        stderr: &mut dyn Sink,
    ) -> anyhow::Result<Outcome> {
        let name = &parsed.name;
        match target {
            Target::Nothing => Ok(Outcome::Continue(0)),
            Target::Builtin(builtin) => {
                log::debug!("builtin {} {:?}", builtin.name(), parsed.params());
                match builtin.execute(parsed.params(), stdout, &mut self.state) {
                    Ok(outcome) => Ok(outcome),
                    Err(ShellError::FatalInput { message, code }) => {
                        writeln!(stderr, "{message}")?;
                        Ok(Outcome::Exit(code))
                    }
                    Err(e) => {
                        writeln!(stderr, "{e}")?;
                        Ok(Outcome::Continue(1))
                    }
                }
            }
            Target::External(cmd) => match cmd.execute(
                Path::new(&self.state.working_dir),
                stdout,
                stderr,
            ) {
                Ok(code) => {
                    log::debug!("{name} exited with {code}");
                    Ok(Outcome::Continue(code))
                }
                Err(e) => {
                    log::debug!("failed to start {name}: {e}");
                    writeln!(stderr, "{name}: command not found")?;
                    Ok(Outcome::Continue(NOT_FOUND_STATUS))
                }
            },
            Target::Missing => {
                writeln!(stderr, "{name}: command not found")?;
                Ok(Outcome::Continue(NOT_FOUND_STATUS))
            }
        }
    }

    /// Runs a single line against the process's own stdout and stderr and
    /// returns the status the shell should exit with.
    pub fn run(&mut self, line: &str) -> anyhow::Result<ExitCode> {
        let outcome =
            self.execute_line(line, &mut std::io::stdout(), &mut std::io::stderr())?;
        Ok(outcome.code())
    }

    /// Handles one result from the line editor: runs the line, or decides
    /// what an interrupt or end of input means for the loop.
    fn step(
        &mut self,
        input: rustyline::Result<String>,
        stdout: &mut dyn Sink,
        stderr: &mut dyn Sink,
    ) -> anyhow::Result<Step> {
        match input {
            Ok(line) => match self.execute_line(&line, stdout, stderr) {
                Ok(Outcome::Continue(_)) => Ok(Step::Prompt),
                Ok(Outcome::Exit(code)) => Ok(Step::Stop(code)),
                Err(e) => {
                    log::error!("{e:#}");
                    Ok(Step::Prompt)
                }
            },
            Err(ReadlineError::Interrupted) => Ok(Step::Prompt),
            Err(ReadlineError::Eof) => Ok(Step::Stop(EOF_STATUS)),
            Err(err) => Err(err).context("reading input"),
        }
    }

    /// The interactive read-eval-print loop.
    ///
    /// Returns the status the process should exit with: the argument of
    /// `exit`, or [`EOF_STATUS`] when input ends.
    pub fn repl(&mut self, options: &ReplOptions) -> anyhow::Result<ExitCode> {
        let mut rl: Editor<ShellHelper, DefaultHistory> =
            Editor::with_config(editor_config()).context("initializing line editor")?;
        let search_paths = self.state.get_var("PATH").unwrap_or_default();
        rl.set_helper(Some(ShellHelper::new(search_paths)));

        if let Some(path) = &options.history {
            if let Err(e) = rl.load_history(path) {
                log::debug!("no history loaded from {}: {e}", path.display());
            }
        }

        let status = loop {
            let input = rl.readline(&options.prompt);
            if let Ok(line) = &input {
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
            }
            match self.step(input, &mut std::io::stdout(), &mut std::io::stderr())? {
                Step::Prompt => continue,
                Step::Stop(code) => break code,
            }
        };

        if let Some(path) = &options.history {
            if let Err(e) = rl.save_history(path) {
                log::warn!("could not save history to {}: {e}", path.display());
            }
        }
        Ok(status)
    }
}

/// What the loop does after one editor result.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Prompt,
    Stop(ExitCode),
}

/// List-style completion: bell on the first ambiguous TAB, candidates on the
/// second, never a "Display all N possibilities?" question.
fn editor_config() -> Config {
    Config::builder()
        .completion_type(CompletionType::List)
        .completion_prompt_limit(usize::MAX)
        .bell_style(BellStyle::Audible)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use std::fs;

    struct Run {
        outcome: Outcome,
        out: String,
        err: String,
    }

    fn run_line(sh: &mut Interpreter, line: &str) -> Run {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = sh.execute_line(line, &mut out, &mut err).unwrap();
        Run {
            outcome,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn shell_in(dir: &Path) -> Interpreter {
        let mut state = ShellState::with_dir(dir.to_string_lossy().into_owned());
        state.set_var("PATH", "/bin:/usr/bin");
        Interpreter::new(state)
    }

    #[test]
    fn test_blank_line_is_noop() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let r = run_line(&mut sh, "   ");
        assert_eq!(r.outcome, Outcome::Continue(0));
        assert!(r.out.is_empty() && r.err.is_empty());
    }

    #[test]
    fn test_echo_with_quotes() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let r = run_line(&mut sh, r#"echo "a  b" 'c'\ d"#);
        assert_eq!(r.out, "a  b c d\n");
    }

    #[test]
    fn test_unknown_command_reports_once_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "definitely_not_a_command_42 arg > out.txt");
        assert_eq!(r.outcome, Outcome::Continue(NOT_FOUND_STATUS));
        assert!(r.out.is_empty());
        assert_eq!(r.err, "definitely_not_a_command_42: command not found\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_command_honors_stderr_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "nope_cmd_42 2> err.txt");
        assert!(r.err.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("err.txt")).unwrap(),
            "nope_cmd_42: command not found\n"
        );
    }

    #[test]
    fn test_redirect_truncates_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        run_line(&mut sh, "echo first > out.txt");
        let r = run_line(&mut sh, "echo hi > out.txt");
        assert!(r.out.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "hi\n"
        );
    }

    #[test]
    fn test_append_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        run_line(&mut sh, "echo one >> log.txt");
        run_line(&mut sh, "echo two 1>> log.txt");
        assert_eq!(
            fs::read_to_string(dir.path().join("log.txt")).unwrap(),
            "one\ntwo\n"
        );
    }

    #[test]
    fn test_builtin_error_goes_to_redirected_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "pwd extra 2> err.txt");
        assert_eq!(r.outcome, Outcome::Continue(1));
        assert!(r.err.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("err.txt")).unwrap(),
            "pwd: too many arguments\n"
        );
    }

    #[test]
    fn test_redirection_only_line_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "> empty.txt");
        assert_eq!(r.outcome, Outcome::Continue(0));
        assert!(dir.path().join("empty.txt").exists());
    }

    #[test]
    fn test_unopenable_redirection_skips_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "echo hi > missing/out.txt");
        assert_eq!(r.outcome, Outcome::Continue(1));
        assert!(r.out.is_empty());
        assert_eq!(r.err, "missing/out.txt: No such file or directory\n");
    }

    #[test]
    fn test_exit_outcomes() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        assert_eq!(run_line(&mut sh, "exit").outcome, Outcome::Exit(0));
        assert_eq!(run_line(&mut sh, "exit 7").outcome, Outcome::Exit(7));

        let r = run_line(&mut sh, "exit 1 2");
        assert_eq!(r.outcome, Outcome::Continue(1));
        assert_eq!(r.err, "exit: too many arguments\n");

        let r = run_line(&mut sh, "exit nope");
        assert_eq!(r.outcome, Outcome::Exit(2));
        assert_eq!(r.err, "exit: nope: numeric argument required\n");
    }

    #[test]
    fn test_cd_missing_reports_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let before = sh.state().working_dir.clone();
        let r = run_line(&mut sh, "cd /definitely/not/here");
        assert_eq!(r.outcome, Outcome::Continue(1));
        assert_eq!(
            r.err,
            "cd: /definitely/not/here: No such file or directory\n"
        );
        assert_eq!(sh.state().working_dir, before);
    }

    #[test]
    #[cfg(unix)]
    fn test_external_output_reaches_memory_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "sh -c 'echo out; echo err 1>&2; exit 4'");
        assert_eq!(r.outcome, Outcome::Continue(4));
        assert_eq!(r.out, "out\n");
        assert_eq!(r.err, "err\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_external_stdout_redirected_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let target = dir.path().join("listing.txt");
        let line = format!("sh -c 'echo written' > {}", target.display());
        let r = run_line(&mut sh, &line);
        assert_eq!(r.outcome, Outcome::Continue(0));
        assert!(r.out.is_empty());
        assert_eq!(fs::read_to_string(target).unwrap(), "written\n");
    }

    #[test]
    fn test_mem_writer_as_inherited_sink() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let (mut out, handle) = MemWriter::with_handle();
        let mut err = MemWriter::new();
        sh.execute_line("type echo", &mut out, &mut err).unwrap();
        assert_eq!(&*handle.borrow(), b"echo is a shell builtin\n");
        assert!(err.contents().is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_external_runs_in_tracked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "sh -c 'pwd -P' > where.txt");
        assert_eq!(r.outcome, Outcome::Continue(0));
        let reported = fs::read_to_string(dir.path().join("where.txt")).unwrap();
        assert_eq!(
            Path::new(reported.trim_end()),
            fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_relative_program_found_under_tracked_directory() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hello.sh");
        fs::write(&script, "#!/bin/sh\necho hello from script\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut sh = shell_in(dir.path());
        let r = run_line(&mut sh, "./hello.sh");
        assert_eq!(r.outcome, Outcome::Continue(0));
        assert_eq!(r.out, "hello from script\n");
    }

    #[test]
    fn test_eof_stops_with_eof_status() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let step = sh.step(Err(ReadlineError::Eof), &mut out, &mut err).unwrap();
        assert_eq!(step, Step::Stop(EOF_STATUS));
        assert!(out.is_empty() && err.is_empty());
    }

    #[test]
    fn test_interrupt_discards_line_and_prompts_again() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let step = sh
            .step(Err(ReadlineError::Interrupted), &mut out, &mut err)
            .unwrap();
        assert_eq!(step, Step::Prompt);
        assert!(out.is_empty() && err.is_empty());
    }

    #[test]
    fn test_step_runs_lines_until_exit() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let step = sh.step(Ok("echo hi".to_string()), &mut out, &mut err).unwrap();
        assert_eq!(step, Step::Prompt);
        assert_eq!(out, b"hi\n");

        let step = sh.step(Ok("exit 3".to_string()), &mut out, &mut err).unwrap();
        assert_eq!(step, Step::Stop(3));
    }

    #[test]
    fn test_editor_read_failure_is_an_error() {
        let mut sh = Interpreter::new(ShellState::with_dir("/"));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let failure = ReadlineError::Io(std::io::Error::other("tty gone"));
        assert!(sh.step(Err(failure), &mut out, &mut err).is_err());
    }

    #[test]
    fn test_editor_lists_candidates_without_asking() {
        let config = editor_config();
        assert_eq!(config.completion_type(), CompletionType::List);
        assert_eq!(config.completion_prompt_limit(), usize::MAX);
        assert_eq!(config.bell_style(), BellStyle::Audible);
    }
}
