//! Tab completion of command names for the line editor.
//!
//! Candidates are the builtin names plus every executable found on PATH.
//! Ringing the bell on an ambiguous first TAB and listing on the second is
//! done by rustyline's `CompletionType::List`.

use crate::builtin::Builtin;
use crate::external::path_executables;
use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Helper, Result};
use std::collections::BTreeSet;
use std::ffi::OsString;

/// Line-editor helper offering command-name completion.
pub struct ShellHelper {
    search_paths: OsString,
}

impl ShellHelper {
    pub fn new(search_paths: impl Into<OsString>) -> Self {
        Self {
            search_paths: search_paths.into(),
        }
    }

    /// Sorted, deduplicated command names starting with `prefix`.
    pub fn candidates(&self, prefix: &str) -> Vec<String> {
        let mut names: BTreeSet<String> = Builtin::ALL
            .iter()
            .map(|builtin| builtin.name().to_string())
            .collect();
        names.extend(path_executables(&self.search_paths));
        names
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect()
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        // Only the command word is completed.
        if typed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let pairs = self
            .candidates(typed)
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{name} "),
                display: name,
            })
            .collect::<Vec<_>>();
        log::trace!("completion for {typed:?}: {} candidates", pairs.len());
        Ok((0, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;
    use std::fs;

    #[cfg(unix)]
    fn make_executable(dir: &std::path::Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn complete(helper: &ShellHelper, line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|p| p.replacement).collect())
    }

    #[test]
    fn test_builtin_prefix_completes_with_space() {
        let helper = ShellHelper::new("");
        assert_eq!(complete(&helper, "ech"), (0, vec!["echo ".to_string()]));
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let helper = ShellHelper::new("");
        assert_eq!(complete(&helper, "zzz_no_such").1, Vec::<String>::new());
    }

    #[test]
    fn test_arguments_are_not_completed() {
        let helper = ShellHelper::new("");
        assert!(complete(&helper, "echo ec").1.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_path_executables_merge_with_builtins() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "exotic_tool_one");
        make_executable(dir.path(), "exotic_tool_two");
        make_executable(dir.path(), "echo");
        fs::write(dir.path().join("exotic_not_exec"), "").unwrap();

        let helper = ShellHelper::new(dir.path().as_os_str());
        assert_eq!(
            helper.candidates("exotic"),
            vec!["exotic_tool_one".to_string(), "exotic_tool_two".to_string()]
        );
        assert_eq!(helper.candidates("ech"), vec!["echo".to_string()]);
    }
}
