//! Session log writer.
//!
//! A log is a `# {header}` line followed by one [`SessionRecord`] per line.
//! Records only ever go to the end of the file and must not go back in time,
//! so an interrupted run leaves every flushed record readable.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use zenposture_common::error::{ZenError, ZenResult};
use zenposture_pose_model::sample::{SessionLogHeader, SessionRecord};

use crate::session::{parse_session_header, parse_session_records, SESSION_SCHEMA_VERSION};

/// Records buffered between forced flushes (one minute at the default 5 s cadence).
pub const DEFAULT_FLUSH_EVERY: u64 = 12;

pub struct SessionWriter {
    out: BufWriter<File>,
    path: PathBuf,
    header: SessionLogHeader,
    records_written: u64,
    unflushed: u64,
    flush_every: u64,
    last_recorded_at: Option<DateTime<Utc>>,
}

impl SessionWriter {
    /// Start a fresh log at `path`, replacing any existing file.
    pub fn create(path: PathBuf, header: SessionLogHeader) -> ZenResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);
        let line = serde_json::to_string(&header)?;
        writeln!(out, "# {line}").map_err(|e| write_error(&path, "header", e))?;

        Ok(Self::from_parts(out, path, header, 0, None))
    }

    /// Continue an existing log, or start one if `path` does not exist yet.
    ///
    /// The existing header is kept; `header` is only used for a new file.
    /// Logs from another schema version are refused rather than mixed.
    pub fn append(path: PathBuf, header: SessionLogHeader) -> ZenResult<Self> {
        if !path.exists() {
            return Self::create(path, header);
        }

        let content = std::fs::read_to_string(&path)?;
        let existing = parse_session_header(&content)?.ok_or_else(|| {
            ZenError::session(format!("{} has no session header", path.display()))
        })?;
        if existing.schema_version != SESSION_SCHEMA_VERSION {
            return Err(ZenError::session(format!(
                "{} uses schema {}, expected {SESSION_SCHEMA_VERSION}",
                path.display(),
                existing.schema_version
            )));
        }
        let records = parse_session_records(&content)?;
        let last = records.iter().map(|r| r.recorded_at).max();

        let file = OpenOptions::new().append(true).open(&path)?;
        let mut writer = Self::from_parts(
            BufWriter::new(file),
            path,
            existing,
            records.len() as u64,
            last,
        );
        if !content.is_empty() && !content.ends_with('\n') {
            writeln!(writer.out).map_err(|e| write_error(&writer.path, "record", e))?;
        }
        tracing::debug!(
            path = %writer.path.display(),
            records = writer.records_written,
            "Resuming session log"
        );
        Ok(writer)
    }

    fn from_parts(
        out: BufWriter<File>,
        path: PathBuf,
        header: SessionLogHeader,
        records_written: u64,
        last_recorded_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            out,
            path,
            header,
            records_written,
            unflushed: 0,
            flush_every: DEFAULT_FLUSH_EVERY,
            last_recorded_at,
        }
    }

    /// Flush after every `n` records (at least 1).
    pub fn with_flush_every(mut self, n: u64) -> Self {
        self.flush_every = n.max(1);
        self
    }

    /// Append one record. Records older than the last one written are refused.
    pub fn write_record(&mut self, record: &SessionRecord) -> ZenResult<()> {
        if let Some(last) = self.last_recorded_at {
            if record.recorded_at < last {
                return Err(ZenError::session(format!(
                    "record at {} precedes the last logged record at {last}",
                    record.recorded_at
                )));
            }
        }

        serde_json::to_writer(&mut self.out, record)?;
        self.out
            .write_all(b"\n")
            .map_err(|e| write_error(&self.path, "record", e))?;
        self.records_written += 1;
        self.unflushed += 1;
        self.last_recorded_at = Some(record.recorded_at);

        if self.unflushed >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> ZenResult<()> {
        self.out
            .flush()
            .map_err(|e| write_error(&self.path, "buffered records", e))?;
        self.unflushed = 0;
        Ok(())
    }

    /// Records in the log, including those present before [`Self::append`].
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn header(&self) -> &SessionLogHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(path = %self.path.display(), "Session log flush on close failed: {e}");
        }
    }
}

fn write_error(path: &Path, what: &str, err: std::io::Error) -> ZenError {
    ZenError::session(format!("{}: failed to write {what}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_session_writer_output_is_readable() {
        let dir = std::env::temp_dir().join("zenposture_test_writer");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.join("session.jsonl");
        let header = SessionLogHeader {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            epoch_wall: wall("2026-01-01T09:00:00Z"),
            publish_interval_secs: 5,
        };

        {
            let mut writer = SessionWriter::create(path.clone(), header.clone()).unwrap();
            for (i, score) in [92u8, 88, 61].into_iter().enumerate() {
                writer
                    .write_record(&SessionRecord {
                        posture_score: score,
                        duration_secs: 5.0,
                        recorded_at: header.epoch_wall
                            + chrono::Duration::seconds(5 * (i as i64 + 1)),
                    })
                    .unwrap();
            }
            assert_eq!(writer.records_written(), 3);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("# "));

        assert_eq!(parse_session_header(&content).unwrap(), Some(header));
        let records = parse_session_records(&content).unwrap();
        assert_eq!(
            records.iter().map(|r| r.posture_score).collect::<Vec<_>>(),
            vec![92, 88, 61]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_periodic_flush_makes_records_visible() {
        let dir = std::env::temp_dir().join("zenposture_test_writer_flush");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("session.jsonl");
        let header = SessionLogHeader {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            epoch_wall: wall("2026-01-01T09:00:00Z"),
            publish_interval_secs: 5,
        };

        let mut writer = SessionWriter::create(path.clone(), header)
            .unwrap()
            .with_flush_every(2);
        let record = SessionRecord {
            posture_score: 75,
            duration_secs: 5.0,
            recorded_at: wall("2026-01-01T09:00:05Z"),
        };
        writer.write_record(&record).unwrap();
        writer.write_record(&record).unwrap();

        // Still open: only the periodic flush can have written these.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_session_records(&content).unwrap().len(), 2);

        drop(writer);
        std::fs::remove_dir_all(&dir).ok();
    }

    fn header_at(rfc3339: &str) -> SessionLogHeader {
        SessionLogHeader {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            epoch_wall: wall(rfc3339),
            publish_interval_secs: 5,
        }
    }

    fn record_at(rfc3339: &str, score: u8) -> SessionRecord {
        SessionRecord {
            posture_score: score,
            duration_secs: 5.0,
            recorded_at: wall(rfc3339),
        }
    }

    #[test]
    fn test_append_continues_existing_log() {
        let dir = std::env::temp_dir().join("zenposture_test_writer_append");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("session.jsonl");
        let first_header = header_at("2026-01-01T09:00:00Z");

        {
            let mut writer = SessionWriter::append(path.clone(), first_header.clone()).unwrap();
            writer.write_record(&record_at("2026-01-01T09:00:05Z", 80)).unwrap();
        }
        {
            // A later run keeps the original header and adds to the records.
            let mut writer =
                SessionWriter::append(path.clone(), header_at("2026-01-01T10:00:00Z")).unwrap();
            assert_eq!(writer.records_written(), 1);
            assert_eq!(writer.header(), &first_header);
            writer.write_record(&record_at("2026-01-01T10:00:05Z", 60)).unwrap();
            assert_eq!(writer.records_written(), 2);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_session_header(&content).unwrap(), Some(first_header));
        let scores: Vec<u8> = parse_session_records(&content)
            .unwrap()
            .iter()
            .map(|r| r.posture_score)
            .collect();
        assert_eq!(scores, vec![80, 60]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_refuses_records_out_of_order() {
        let dir = std::env::temp_dir().join("zenposture_test_writer_order");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("session.jsonl");

        let mut writer = SessionWriter::create(path.clone(), header_at("2026-01-01T09:00:00Z"))
            .unwrap();
        writer.write_record(&record_at("2026-01-01T09:00:10Z", 70)).unwrap();
        let err = writer
            .write_record(&record_at("2026-01-01T09:00:05Z", 70))
            .unwrap_err();
        assert!(matches!(err, ZenError::Session { .. }));
        assert_eq!(writer.records_written(), 1);

        drop(writer);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_append_rejects_log_without_header() {
        let dir = std::env::temp_dir().join("zenposture_test_writer_no_header");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.jsonl");
        std::fs::write(&path, "{\"posture_score\":1}\n").unwrap();

        assert!(SessionWriter::append(path, header_at("2026-01-01T09:00:00Z")).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
