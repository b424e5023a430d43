//! Audit trail for catalog mutations.
//!
//! The catalog reports what it did through an [`AuditSink`]. Sinks are best effort: a
//! failed write never reaches the caller.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Local;

use crate::config::AuditConfig;

/// Severity of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditLevel {
    /// Successful mutation
    Info,
    /// Rejected operation
    Warning,
    /// Failure outside the catalog itself
    Error,
}

impl AuditLevel {
    /// Tag written between brackets in each entry
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of human-readable audit lines
pub trait AuditSink: Send + Sync {
    /// Record `message` at `level`
    fn log(&self, level: AuditLevel, message: &str);

    /// Record a successful mutation
    fn log_info(&self, message: &str) {
        self.log(AuditLevel::Info, message);
    }

    /// Record a rejected operation
    fn log_warning(&self, message: &str) {
        self.log(AuditLevel::Warning, message);
    }

    /// Record a failure
    fn log_error(&self, message: &str) {
        self.log(AuditLevel::Error, message);
    }
}

/// Format an entry as `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` in local time
#[must_use]
pub fn format_entry(level: AuditLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{timestamp}] [{level}] {message}")
}

/// Mutable part of [`FileAuditLog`], guarded by its mutex
struct AuditState {
    /// Destination file path
    path: PathBuf,
    /// Open destination, `None` if opening failed
    writer: Option<BufWriter<File>>,
    /// Where echoed entries go, stdout unless replaced
    console: Box<dyn Write + Send>,
    /// Echo every entry to the console
    console_output: bool,
    /// Flush the file after every entry
    auto_flush: bool,
}

// Manual implementation of Debug for AuditState
impl fmt::Debug for AuditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditState")
            .field("path", &self.path)
            .field("writer", &self.writer)
            .field("console_output", &self.console_output)
            .field("auto_flush", &self.auto_flush)
            .finish_non_exhaustive()
    }
}

impl AuditState {
    /// Open `path` for writing, appending or truncating
    fn open(path: &Path, append: bool) -> Option<BufWriter<File>> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .ok()
            .map(BufWriter::new)
    }

    /// Flush whatever is buffered; errors are dropped
    fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            drop(writer.flush());
        }
    }
}

/// Audit sink writing timestamped lines to a file and optionally to stdout.
///
/// One mutex covers the file and the settings, so a single entry is formatted, written
/// and flushed before the next caller gets in.
#[derive(Debug)]
pub struct FileAuditLog {
    /// Writer and settings
    state: Mutex<AuditState>,
}

impl FileAuditLog {
    /// Open `path` and start logging to it.
    ///
    /// If the file cannot be opened the log keeps running without a file; console echo
    /// still works.
    #[must_use]
    pub fn new(
        path: impl AsRef<Path>,
        append: bool,
        console_output: bool,
        auto_flush: bool,
    ) -> Self {
        let path = path.as_ref().to_path_buf();
        let writer = AuditState::open(&path, append);
        let console: Box<dyn Write + Send> = Box::new(io::stdout());
        Self { state: Mutex::new(AuditState { path, writer, console, console_output, auto_flush }) }
    }

    /// Build a log from loaded configuration
    #[must_use]
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(&config.path, config.append, config.console_output, config.auto_flush)
    }

    /// Lock the state, recovering it if a writer panicked mid-entry
    fn state(&self) -> MutexGuard<'_, AuditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flush buffered entries to disk
    pub fn save(&self) {
        self.state().flush();
    }

    /// Switch to a different file, closing the current one
    pub fn set_path(&self, path: impl AsRef<Path>, append: bool) {
        let mut state = self.state();
        state.flush();
        state.path = path.as_ref().to_path_buf();
        state.writer = AuditState::open(&state.path, append);
    }

    /// Turn stdout echo on or off
    pub fn set_console_output(&self, enabled: bool) {
        self.state().console_output = enabled;
    }

    /// Send echoed entries to `console` instead of stdout
    pub fn set_console_writer(&self, console: Box<dyn Write + Send>) {
        self.state().console = console;
    }

    /// Turn flush-after-every-entry on or off
    pub fn set_auto_flush(&self, enabled: bool) {
        self.state().auto_flush = enabled;
    }

    /// Current destination path
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.state().path.clone()
    }

    /// Whether the destination file is open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().writer.is_some()
    }
}

impl AuditSink for FileAuditLog {
    fn log(&self, level: AuditLevel, message: &str) {
        let mut state = self.state();
        let entry = format_entry(level, message);

        let auto_flush = state.auto_flush;
        if let Some(writer) = state.writer.as_mut() {
            drop(writeln!(writer, "{entry}"));
            if auto_flush {
                drop(writer.flush());
            }
        }
        if state.console_output {
            drop(writeln!(state.console, "{entry}"));
        }
    }
}

/// Sink that keeps entries in memory, without timestamps
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    /// Recorded `(level, message)` pairs in arrival order
    entries: Mutex<Vec<(AuditLevel, String)>>,
}

impl MemoryAuditLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    #[must_use]
    pub fn entries(&self) -> Vec<(AuditLevel, String)> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Messages recorded at `level`
    #[must_use]
    pub fn messages(&self, level: AuditLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl AuditSink for MemoryAuditLog {
    fn log(&self, level: AuditLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::{
        fs,
        io::{self, Write},
        sync::Arc,
    };

    use super::{AuditLevel, AuditSink, FileAuditLog, MemoryAuditLog, format_entry};
    use crate::{book::Book, catalog::Catalog, user::User};

    #[test]
    fn test_entry_format() {
        let entry = format_entry(AuditLevel::Warning, "Return failed: ISBN=1");
        // [2024-01-31 12:00:00] is 21 characters
        assert_eq!(entry.find("] [WARN] Return failed: ISBN=1"), Some(20));
        assert!(entry.starts_with('['));
    }

    #[test]
    fn test_file_log_appends_lines() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("audit.log");

        let log = FileAuditLog::new(&path, true, false, true);
        log.log_info("first");
        log.log_warning("second");
        log.log_error("third");

        let contents = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.first().is_some_and(|line| line.ends_with("[INFO] first")));
        assert!(lines.get(1).is_some_and(|line| line.ends_with("[WARN] second")));
        assert!(lines.get(2).is_some_and(|line| line.ends_with("[ERROR] third")));
    }

    #[test]
    fn test_truncate_and_reopen() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        fs::write(&first, "stale\n").expect("seed log");

        let log = FileAuditLog::new(&first, false, false, false);
        log.log_info("fresh");
        log.save();
        let contents = fs::read_to_string(&first).expect("read log");
        assert!(!contents.contains("stale"));
        assert!(contents.contains("fresh"));

        log.set_path(&second, true);
        log.set_auto_flush(true);
        log.log_info("moved");
        assert_eq!(log.path(), second);
        assert!(fs::read_to_string(&second).expect("read log").contains("moved"));
        assert!(!fs::read_to_string(&first).expect("read log").contains("moved"));
    }

    #[test]
    fn test_unopenable_path_is_tolerated() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let missing = dir.path().join("missing").join("audit.log");
        let log = FileAuditLog::new(missing, true, false, true);
        assert!(!log.is_open());
        log.log_info("dropped");
        log.save();
    }

    /// Console that rejects every write, like stdout redirected to a full disk
    struct FullConsole;

    impl Write for FullConsole {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device"))
        }
    }

    #[test]
    fn test_failing_console_does_not_block_catalog() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("audit.log");
        let log = Arc::new(FileAuditLog::new(&path, true, true, true));
        log.set_console_writer(Box::new(FullConsole));

        let sink: Arc<dyn AuditSink> = log.clone();
        let mut catalog = Catalog::new(Some(sink));
        catalog.add_book(Book::new("Dune", "Frank Herbert", "42"));
        catalog.add_user(User::new("u1", "Alice"));

        assert_eq!(catalog.counts().total, 1);
        assert!(catalog.check_out_book("42", "u1"));
        assert!(catalog.book_by_isbn("42").is_some_and(|book| book.borrower() == "Alice"));

        let contents = fs::read_to_string(&path).expect("read log");
        assert!(contents.contains("[INFO] Book added: Dune (ISBN: 42)"));
        assert!(contents.contains("[INFO] Book checked out: ISBN=42 by user=u1"));
    }

    #[test]
    fn test_memory_log_filters_by_level() {
        let log = MemoryAuditLog::new();
        log.log_info("a");
        log.log_warning("b");
        log.log_info("c");
        assert_eq!(log.messages(AuditLevel::Info), vec!["a", "c"]);
        assert_eq!(log.entries().len(), 3);
    }
}
