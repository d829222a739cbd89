//! Working-directory resolution for `cd`.
//!
//! Relative destinations are normalized on the tracked path string rather
//! than asking the OS to canonicalize, so `pwd` reports the logical path the
//! user navigated to.

use crate::env::ShellState;
use crate::error::{Result, ShellError};
use std::fs;
use std::path::Path;

/// Computes the directory `cd destination` should switch to from `current`.
///
/// Fails without side effects when the target is missing or not a directory,
/// and fatally when the home directory is needed but unknown.
pub fn resolve_cd(current: &str, destination: Option<&str>, home: Option<&str>) -> Result<String> {
    let Some(destination) = destination else {
        let home = require_home(home)?;
        verify_dir(Path::new(home), home)?;
        return Ok(home.to_string());
    };

    let destination = strip_trailing_slash(destination);

    if destination.starts_with('/') {
        verify_dir(Path::new(destination), destination)?;
        return Ok(destination.to_string());
    }

    if destination == "~" || destination.starts_with("~/") {
        let expanded = format!("{}{}", require_home(home)?, &destination[1..]);
        verify_dir(Path::new(&expanded), &expanded)?;
        return Ok(expanded);
    }

    let candidate = format!("{current}/{destination}");
    verify_dir(Path::new(&candidate), destination)?;
    Ok(normalize(current, destination))
}

/// Applies the segments of a relative `destination` to `current`.
///
/// `..` drops the last segment but never goes above `/`; `.` and empty
/// segments are ignored.
///
/// ```
/// use mini_shell::resolver::normalize;
/// assert_eq!(normalize("/home/user", "../.."), "/");
/// assert_eq!(normalize("/home/user", "./docs/../src"), "/home/user/src");
/// ```
pub fn normalize(current: &str, destination: &str) -> String {
    let mut segments: Vec<&str> = current.split('/').filter(|s| !s.is_empty()).collect();
    for segment in destination.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Runs `cd` against the session: resolves the destination, asks the OS to
/// follow, and records the new directory.
///
/// The computed path is recorded even if the OS call fails, since it is the
/// path later relative moves are based on.
pub fn change_dir(state: &mut ShellState, destination: Option<&str>) -> Result<()> {
    let new_dir = resolve_cd(&state.working_dir, destination, state.home())?;
    if let Err(e) = std::env::set_current_dir(&new_dir) {
        log::warn!("cd: could not change OS directory to {new_dir}: {e}");
    }
    log::debug!("cd: {} -> {}", state.working_dir, new_dir);
    state.working_dir = new_dir;
    Ok(())
}

fn strip_trailing_slash(destination: &str) -> &str {
    let stripped = destination.trim_end_matches('/');
    if stripped.is_empty() && destination.starts_with('/') {
        "/"
    } else {
        stripped
    }
}

fn require_home(home: Option<&str>) -> Result<&str> {
    home.ok_or_else(|| ShellError::FatalInput {
        message: "cd: could not determine home directory (HOME not set)".to_string(),
        code: 1,
    })
}

fn verify_dir(path: &Path, shown: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ShellError::NotADirectory(format!("cd: {shown}"))),
        Err(_) => Err(ShellError::NotFound(format!("cd: {shown}"))),
    }
}
