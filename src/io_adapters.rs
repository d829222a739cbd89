use crate::command::Sink;
use crate::parser::{RedirectionClause, Stream};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Result as IoResult, Write};
use std::path::Path;
use std::process::Stdio;
use std::rc::Rc;

impl Sink for io::Stdout {
    fn stdio(&self) -> IoResult<Option<Stdio>> {
        Ok(Some(Stdio::inherit()))
    }
}

impl Sink for io::Stderr {
    fn stdio(&self) -> IoResult<Option<Stdio>> {
        Ok(Some(Stdio::inherit()))
    }
}

impl Sink for File {
    fn stdio(&self) -> IoResult<Option<Stdio>> {
        Ok(Some(Stdio::from(self.try_clone()?)))
    }
}

impl Sink for Vec<u8> {
    fn stdio(&self) -> IoResult<Option<Stdio>> {
        Ok(None)
    }
}

/// Memory-backed writer whose contents stay readable after the writer has
/// been handed off (and dropped) by the dispatcher.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }

    /// Collected bytes decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Sink for MemWriter {
    fn stdio(&self) -> IoResult<Option<Stdio>> {
        Ok(None)
    }
}

/// Files opened for one command's redirections.
///
/// Dropping the value closes the files, so a command's sinks never outlive
/// the command.
#[derive(Default)]
pub struct Redirections {
    pub stdout: Option<File>,
    pub stderr: Option<File>,
}

/// Opens every clause in order. A later clause for the same stream replaces
/// (and closes) the file opened by an earlier one, but the earlier target is
/// still created or truncated.
///
/// Relative targets are resolved against `cwd`.
pub fn open_redirections(clauses: &[RedirectionClause], cwd: &Path) -> IoResult<Redirections> {
    let mut opened = Redirections::default();
    for clause in clauses {
        let path = cwd.join(&clause.target);
        let mut options = OpenOptions::new();
        options.create(true);
        if clause.operator.appends() {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {}", clause.target, describe(&e)))
        })?;
        log::debug!("redirect {} -> {}", clause.operator, path.display());
        match clause.operator.stream() {
            Stream::Stdout => opened.stdout = Some(file),
            Stream::Stderr => opened.stderr = Some(file),
        }
    }
    Ok(opened)
}

/// Short OS error text, without the "(os error N)" suffix.
fn describe(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        io::ErrorKind::IsADirectory => "Is a directory".to_string(),
        _ => e.to_string(),
    }
}
