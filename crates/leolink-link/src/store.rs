use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use leolink_frame::{log_header, Telemetry};

use crate::error::StoreError;
use crate::log::Logger;
use crate::summary::{StatsSummarizer, Summarizer};
use crate::{log_info, log_warn};

/// `strftime` pattern of the per-session directory name.
pub const SESSION_DIR_FORMAT: &str = "%m%d_%H%M%S";

/// Result of finalizing a session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The log held no records and was removed.
    Discarded,
    /// The log was kept, with the summary file if one was written.
    Kept {
        path: PathBuf,
        summary: Option<PathBuf>,
    },
    /// `close` had already run.
    AlreadyClosed,
}

/// Append-only CSV log of accepted telemetry for one session.
pub struct SessionStore {
    dir: PathBuf,
    path: PathBuf,
    file: Option<File>,
    enabled: bool,
    sync_writes: bool,
    records_written: u64,
    summarizer: Box<dyn Summarizer>,
    logger: Arc<dyn Logger>,
}

impl SessionStore {
    /// Create `<root>/<MMDD_HHMMSS>/Flight_<team_id>.csv` and write the header
    /// if the file is new.
    pub fn create(
        root: &Path,
        team_id: u32,
        started: DateTime<Local>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, StoreError> {
        let dir = root.join(started.format(SESSION_DIR_FORMAT).to_string());
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("Flight_{team_id}.csv"));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{}", log_header())?;
            file.flush()?;
        }

        log_info!(logger, "Session log: {}", path.display());
        Ok(Self {
            dir,
            path,
            file: Some(file),
            enabled: true,
            sync_writes: true,
            records_written: 0,
            summarizer: Box::new(StatsSummarizer),
            logger,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// `fdatasync` after every record (on by default).
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Records appended during this session.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Append one record. Returns `Ok(false)` while disabled or after close.
    pub fn write(&mut self, telemetry: &Telemetry) -> Result<bool, StoreError> {
        if !self.enabled {
            return Ok(false);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(false);
        };
        writeln!(file, "{}", telemetry.to_log_row())?;
        file.flush()?;
        if self.sync_writes {
            file.sync_data()?;
        }
        self.records_written += 1;
        Ok(true)
    }

    /// Finalize the log: remove it if it holds no records, otherwise run the
    /// summarizer. Safe to call more than once.
    pub fn close(&mut self) -> Result<SessionOutcome, StoreError> {
        let Some(mut file) = self.file.take() else {
            return Ok(SessionOutcome::AlreadyClosed);
        };
        file.flush()?;
        drop(file);

        if count_lines(&self.path)? <= 1 {
            fs::remove_file(&self.path)?;
            if fs::read_dir(&self.dir)?.next().is_none() {
                fs::remove_dir(&self.dir)?;
            }
            log_info!(self.logger, "Empty session log removed");
            return Ok(SessionOutcome::Discarded);
        }

        let summary = match self.summarizer.summarize(&self.path) {
            Ok(summary) => summary,
            Err(err) => {
                log_warn!(self.logger, "Session summary failed: {err}");
                None
            }
        };
        log_info!(
            self.logger,
            "Session log kept: {} ({} record(s))",
            self.path.display(),
            self.records_written
        );
        Ok(SessionOutcome::Kept {
            path: self.path.clone(),
            summary,
        })
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.close() {
                log_warn!(self.logger, "Session log could not be finalized: {err}");
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .field("enabled", &self.enabled)
            .field("closed", &self.file.is_none())
            .field("records_written", &self.records_written)
            .finish()
    }
}

fn count_lines(path: &Path) -> Result<usize, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let count = reader
        .lines()
        .try_fold(0usize, |count, line| line.map(|_| count + 1))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::log::MemoryLogger;
    use crate::summary::{NoSummary, SUMMARY_FILE_NAME};

    const FIELDS: &str = "3171,12:00:00,1,F,ASCENT,100.0,20.0,101.3,3.7,0,0,0,0,0,0,0,0,0,5,12:00:00,100.0,1.0,2.0,8,CX ON,,1.5,90";

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 14, 9, 30, 5).unwrap()
    }

    fn store(root: &Path) -> (SessionStore, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let store = SessionStore::create(root, 3171, started(), logger.clone()).unwrap();
        (store, logger)
    }

    fn telemetry(count: u32) -> Telemetry {
        let mut telemetry = Telemetry::parse(FIELDS).unwrap();
        telemetry.packet_count = count;
        telemetry
    }

    #[test]
    fn creates_session_directory_with_header() {
        let root = tempfile::tempdir().unwrap();
        let (store, _) = store(root.path());

        assert_eq!(store.dir(), root.path().join("0614_093005"));
        assert_eq!(store.path(), store.dir().join("Flight_3171.csv"));
        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, format!("{}\n", log_header()));
    }

    #[test]
    fn header_only_log_is_removed_with_directory() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        let dir = store.dir().to_path_buf();

        assert_eq!(store.close().unwrap(), SessionOutcome::Discarded);
        assert!(!dir.exists());
        assert!(root.path().exists());
    }

    #[test]
    fn empty_log_is_removed_with_directory() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        let dir = store.dir().to_path_buf();
        fs::OpenOptions::new()
            .write(true)
            .open(store.path())
            .unwrap()
            .set_len(0)
            .unwrap();

        assert_eq!(store.close().unwrap(), SessionOutcome::Discarded);
        assert!(!store.path().exists());
        assert!(!dir.exists());
    }

    #[test]
    fn directory_with_other_files_survives_discard() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        fs::write(store.dir().join("notes.txt"), "wind 5 knots").unwrap();

        assert_eq!(store.close().unwrap(), SessionOutcome::Discarded);
        assert!(!store.path().exists());
        assert!(store.dir().join("notes.txt").exists());
    }

    #[test]
    fn log_with_records_is_kept_and_summarized() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        assert!(store.write(&telemetry(1)).unwrap());
        assert!(store.write(&telemetry(2)).unwrap());

        let outcome = store.close().unwrap();
        let expected_summary = store.dir().join(SUMMARY_FILE_NAME);
        assert_eq!(
            outcome,
            SessionOutcome::Kept {
                path: store.path().to_path_buf(),
                summary: Some(expected_summary.clone()),
            }
        );
        assert!(expected_summary.exists());

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text
            .lines()
            .nth(1)
            .unwrap()
            .starts_with("3171,12:00:00,1,F,ASCENT"));
    }

    #[test]
    fn disabled_store_skips_writes() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        store.disable();
        assert!(!store.write(&telemetry(1)).unwrap());
        store.enable();
        assert!(store.write(&telemetry(2)).unwrap());
        assert_eq!(store.records_written(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let (mut store, _) = store(root.path());
        store = store.with_summarizer(Box::new(NoSummary));
        store.write(&telemetry(1)).unwrap();

        assert!(matches!(
            store.close().unwrap(),
            SessionOutcome::Kept { summary: None, .. }
        ));
        assert_eq!(store.close().unwrap(), SessionOutcome::AlreadyClosed);
        assert!(!store.write(&telemetry(2)).unwrap());
    }

    #[test]
    fn reopening_existing_log_does_not_repeat_header() {
        let root = tempfile::tempdir().unwrap();
        let (mut first, _) = store(root.path());
        first.write(&telemetry(1)).unwrap();
        drop(first);

        let (second, _) = store(root.path());
        let text = fs::read_to_string(second.path()).unwrap();
        assert_eq!(text.matches("TEAM_ID").count(), 1);
    }

    #[test]
    fn unwritable_root_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();

        let logger = Arc::new(MemoryLogger::new());
        let err = SessionStore::create(&blocker, 3171, started(), logger).unwrap_err();
        assert!(matches!(err, StoreError::CreateDir { .. }));
    }

    #[test]
    fn drop_finalizes_empty_session() {
        let root = tempfile::tempdir().unwrap();
        let (store, _) = store(root.path());
        let dir = store.dir().to_path_buf();
        drop(store);
        assert!(!dir.exists());
    }
}
