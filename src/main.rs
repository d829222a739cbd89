use argh::FromArgs;
use mini_shell::{Interpreter, ReplOptions, ShellState};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// A small interactive shell with builtins, quoting and output redirection.
struct Options {
    #[argh(option, default = "String::from(\"$ \")")]
    /// prompt printed before each line.
    prompt: String,

    #[argh(option, short = 'c')]
    /// run a single command line and exit with its status.
    command: Option<String>,

    #[argh(option)]
    /// file to load line-editor history from and save it to.
    history: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options: Options = argh::from_env();
    let mut interpreter = Interpreter::new(ShellState::new());
    log::debug!("starting in {}", interpreter.state().working_dir);

    let status = match options.command {
        Some(line) => interpreter.run(&line)?,
        None => interpreter.repl(&ReplOptions {
            prompt: options.prompt,
            history: options.history,
        })?,
    };

    // Only the low byte reaches the parent, as with any POSIX exit status.
    Ok(ExitCode::from(status as u8))
}
