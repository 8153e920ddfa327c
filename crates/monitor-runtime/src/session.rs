//! Session log reading and daily aggregation.
//!
//! A session log is JSONL: a `# {header}` first line followed by one
//! [`SessionRecord`] per publication. A directory of logs is read as one
//! record stream, which is how per-day statistics span several runs.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use zenposture_common::error::{ZenError, ZenResult};
use zenposture_pose_model::sample::{SessionLogHeader, SessionRecord};

pub const SESSION_SCHEMA_VERSION: &str = "1.0";

/// File name for a session started at `epoch_wall`, e.g. `session-20260101T090000Z.jsonl`.
pub fn session_file_name(epoch_wall: DateTime<Utc>) -> String {
    format!("session-{}.jsonl", epoch_wall.format("%Y%m%dT%H%M%SZ"))
}

/// Parse the header line, if the content starts with one.
pub fn parse_session_header(content: &str) -> ZenResult<Option<SessionLogHeader>> {
    let Some(first) = content.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(None);
    };
    let Some(json) = first.strip_prefix('#') else {
        return Ok(None);
    };
    let header = serde_json::from_str(json.trim())
        .map_err(|e| ZenError::session(format!("Invalid session header: {e}")))?;
    Ok(Some(header))
}

/// Parse every record line, skipping comments and blanks.
pub fn parse_session_records(content: &str) -> ZenResult<Vec<SessionRecord>> {
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record: SessionRecord = serde_json::from_str(line)
            .map_err(|e| ZenError::session(format!("line {}: {e}", index + 1)))?;
        records.push(record);
    }
    Ok(records)
}

/// Read records from a session log file, or from every `.jsonl` file in a directory.
pub fn read_session_records(path: &Path) -> ZenResult<Vec<SessionRecord>> {
    if !path.exists() {
        return Err(ZenError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        let content = std::fs::read_to_string(path)?;
        return parse_session_records(&content);
    }

    let mut files = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
        .collect::<Vec<_>>();
    files.sort();

    let mut records = Vec::new();
    for file in files {
        let content = std::fs::read_to_string(&file)?;
        match parse_session_records(&content) {
            Ok(mut parsed) => records.append(&mut parsed),
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable session log"),
        }
    }
    Ok(records)
}

/// Aggregates for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Mean record score; 0 when the day has no records.
    pub average_posture_score: f64,
    /// Seconds of monitoring covered by the day's records.
    pub total_posture_secs: f64,
    /// Number of records on the day.
    pub sessions_count: usize,
}

impl DailyStats {
    pub fn for_day(records: &[SessionRecord], date: NaiveDate) -> Self {
        let day: Vec<&SessionRecord> = records.iter().filter(|r| r.day() == date).collect();

        let average_posture_score = if day.is_empty() {
            0.0
        } else {
            day.iter().map(|r| r.posture_score as f64).sum::<f64>() / day.len() as f64
        };

        Self {
            date,
            average_posture_score,
            total_posture_secs: day.iter().map(|r| r.duration_secs).sum(),
            sessions_count: day.len(),
        }
    }

    /// Stats for every day that has at least one record, in date order.
    pub fn by_day(records: &[SessionRecord]) -> Vec<Self> {
        let mut days = BTreeMap::new();
        for record in records {
            days.entry(record.day()).or_insert(());
        }
        days.into_keys()
            .map(|date| Self::for_day(records, date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u8, secs: f64, at: &str) -> SessionRecord {
        SessionRecord {
            posture_score: score,
            duration_secs: secs,
            recorded_at: DateTime::parse_from_rfc3339(at)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_stats_filters_by_day() {
        let records = vec![
            record(80, 5.0, "2026-02-10T08:00:05Z"),
            record(60, 5.0, "2026-02-10T08:00:10Z"),
            record(100, 2.5, "2026-02-10T23:59:59Z"),
            record(10, 5.0, "2026-02-11T00:00:01Z"),
        ];

        let stats = DailyStats::for_day(&records, date(2026, 2, 10));
        assert_eq!(stats.sessions_count, 3);
        assert!((stats.average_posture_score - 80.0).abs() < 1e-9);
        assert!((stats.total_posture_secs - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_day_averages_zero() {
        let stats = DailyStats::for_day(&[], date(2026, 2, 10));
        assert_eq!(stats.average_posture_score, 0.0);
        assert_eq!(stats.total_posture_secs, 0.0);
        assert_eq!(stats.sessions_count, 0);
    }

    #[test]
    fn test_by_day_is_date_ordered() {
        let records = vec![
            record(50, 5.0, "2026-02-11T10:00:00Z"),
            record(70, 5.0, "2026-02-10T10:00:00Z"),
        ];
        let days = DailyStats::by_day(&records);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(2026, 2, 10));
        assert_eq!(days[1].average_posture_score, 50.0);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let content = "# {}\n{\"posture_score\":80,\"duration_secs\":5.0,\"recorded_at\":\"2026-02-10T08:00:05Z\"}\nnot json\n";
        let err = parse_session_records(content).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_header_absent_or_invalid() {
        assert_eq!(parse_session_header("").unwrap(), None);
        assert_eq!(
            parse_session_header("{\"posture_score\":1}").unwrap(),
            None
        );
        assert!(parse_session_header("# {\"schema_version\":1}").is_err());
    }

    #[test]
    fn test_session_file_name() {
        let epoch = DateTime::parse_from_rfc3339("2026-01-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(session_file_name(epoch), "session-20260101T093000Z.jsonl");
    }

    #[test]
    fn test_reads_directory_of_logs() {
        let dir = std::env::temp_dir().join("zenposture_test_session_dir");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let line = |score: u8| {
            serde_json::to_string(&record(score, 5.0, "2026-02-10T08:00:05Z")).unwrap()
        };
        std::fs::write(dir.join("a.jsonl"), format!("# {{}}\n{}\n", line(40))).unwrap();
        std::fs::write(dir.join("b.jsonl"), format!("{}\n{}\n", line(60), line(80))).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let records = read_session_records(&dir).unwrap();
        assert_eq!(records.len(), 3);
        let stats = DailyStats::for_day(&records, date(2026, 2, 10));
        assert!((stats.average_posture_score - 60.0).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }
}
