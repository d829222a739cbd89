use std::collections::HashMap;
use std::env as stdenv;

/// Mutable state of one shell session.
///
/// The environment contains:
/// - `vars`: environment variables visible to the shell and its children.
/// - `working_dir`: the shell's own notion of the current directory. It is
///   computed by `cd` and is what `pwd` prints, even if the OS would spell the
///   same directory differently (symlinks, `..` through a link).
#[derive(Debug, Clone)]
pub struct ShellState {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The tracked working directory.
    pub working_dir: String,
}

impl ShellState {
    /// Capture the current process state into a new `ShellState`.
    ///
    /// Copies variables from `std::env::vars()` and initializes `working_dir`
    /// from `std::env::current_dir()`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let working_dir = match stdenv::current_dir() {
            Ok(dir) => dir.to_string_lossy().into_owned(),
            Err(e) => {
                log::warn!("error reading current directory: {e}");
                String::from("/")
            }
        };
        Self { vars, working_dir }
    }

    /// A state with no variables, rooted at `working_dir`.
    pub fn with_dir(working_dir: impl Into<String>) -> Self {
        Self {
            vars: HashMap::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Get the value of a variable from `self.vars`.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The user's home directory, if `HOME` is set and non-empty.
    pub fn home(&self) -> Option<&str> {
        self.get_var("HOME").filter(|home| !home.is_empty())
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}
