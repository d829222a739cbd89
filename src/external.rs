use crate::command::{ExitCode, Sink};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// A program found on disk, ready to be run with the command's sinks.
pub struct ExternalCommand {
    /// Name the user typed; becomes the child's `argv[0]`.
    name: OsString,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<OsString>, program: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            name: name.into(),
            program,
            args,
        }
    }

    /// Resolves `name` against `search_paths` (a PATH value), or against
    /// `cwd` when the name contains a separator.
    pub fn resolve(search_paths: &OsStr, cwd: &Path, name: &str, args: &[String]) -> Option<Self> {
        let program = locate_command(search_paths, cwd, name)?;
        Some(Self::new(
            name,
            program,
            args.iter().map(OsString::from).collect(),
        ))
    }

    /// Spawns the program in `cwd` and blocks until it exits.
    ///
    /// Sinks backed by a real file or terminal are handed to the child
    /// directly; in-memory sinks receive the child's captured output after it
    /// exits. A spawn failure is returned as an error; a non-zero exit is not.
    pub fn execute(
        &self,
        cwd: &Path,
        stdout: &mut dyn Sink,
        stderr: &mut dyn Sink,
    ) -> io::Result<ExitCode> {
        let out_handle = stdout.stdio()?;
        let err_handle = stderr.stdio()?;
        let capture_out = out_handle.is_none();
        let capture_err = err_handle.is_none();

        log::debug!("spawning {} {:?}", self.program.display(), self.args);
        let mut command = std::process::Command::new(&self.program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&self.name);
        }
        let child = command
            .args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(out_handle.unwrap_or_else(Stdio::piped))
            .stderr(err_handle.unwrap_or_else(Stdio::piped))
            .spawn()?;
        let output = child.wait_with_output()?;

        if capture_out {
            stdout.write_all(&output.stdout)?;
        }
        if capture_err {
            stderr.write_all(&output.stderr)?;
        }

        match output.status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(output.status)),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Relative with multiple components (e.g., `bin/sh` or `./foo`): returns it
///   if it is an executable file.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) if !path.as_os_str().to_string_lossy().contains('/') => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Has a separator -> relative to the current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

/// Like [`find_command_path`], except that a relative name with a separator
/// (`./prog`, `bin/tool`) is looked up under `cwd` instead of the process's
/// own directory.
pub fn locate_command(search_paths: &OsStr, cwd: &Path, name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if !path.is_absolute() && name.contains('/') {
        return find_by_path(&cwd.join(path)).map(Path::to_path_buf);
    }
    find_command_path(search_paths, path).map(Cow::into_owned)
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable(path))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

/// A regular file with at least one execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Names of all executables in the PATH directories, sorted and deduplicated.
///
/// Unreadable directories are skipped.
pub fn path_executables(search_paths: &OsStr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for dir in std::env::split_paths(search_paths) {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            if is_executable(&entry.path()) {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    names
}
