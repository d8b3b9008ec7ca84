use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::attendance::domain::attendance_log::{AttendanceLog, AttendanceSummary};
use crate::attendance::domain::remote_sink::RemoteAttendanceSink;
use crate::shared::constants::ATTENDANCE_COOLDOWN;

const HEADER: &str = "Name,Date,Time,Confidence";

/// Append-only CSV attendance log with a per-identity business cooldown.
///
/// The CSV file is the primary durable record; an optional remote sink is
/// pushed best-effort after each successful append and can never fail the
/// primary write.
pub struct CsvAttendanceLog {
    path: PathBuf,
    cooldown: Duration,
    last_accepted: HashMap<String, DateTime<Local>>,
    remote: Option<Box<dyn RemoteAttendanceSink>>,
}

impl CsvAttendanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_cooldown(path, ATTENDANCE_COOLDOWN)
    }

    pub fn with_cooldown(
        path: impl Into<PathBuf>,
        cooldown: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = File::create(&path)?;
            writeln!(file, "{HEADER}")?;
        }
        Ok(Self {
            path,
            cooldown,
            last_accepted: HashMap::new(),
            remote: None,
        })
    }

    pub fn with_remote_sink(mut self, sink: Box<dyn RemoteAttendanceSink>) -> Self {
        self.remote = Some(sink);
        self
    }

    fn rows_for_date(&self, date: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let file = File::open(&self.path)?;
        let mut names = Vec::new();
        for line in BufReader::new(file).lines().skip(1) {
            let line = line?;
            let mut fields = line.split(',');
            let name = fields.next().unwrap_or_default();
            let row_date = fields.next().unwrap_or_default();
            if row_date == date && !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

impl AttendanceLog for CsvAttendanceLog {
    fn commit(&mut self, name: &str, confidence: f64) -> Result<bool, Box<dyn std::error::Error>> {
        let now = Local::now();

        if let Some(last) = self.last_accepted.get(name) {
            let elapsed = (now - *last).to_std().unwrap_or_default();
            if elapsed < self.cooldown {
                log::debug!(
                    "{name} already recorded; cooldown has {}s left",
                    (self.cooldown - elapsed).as_secs()
                );
                return Ok(false);
            }
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(
            file,
            "{},{},{},{confidence:.3}",
            name,
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S")
        )?;
        self.last_accepted.insert(name.to_string(), now);
        log::info!("attendance recorded: {name}");

        if let Some(remote) = self.remote.as_mut() {
            if let Err(e) = remote.push(name, now) {
                log::warn!("remote attendance sync failed for {name}: {e}");
            }
        }

        Ok(true)
    }

    fn today_summary(&self) -> Result<AttendanceSummary, Box<dyn std::error::Error>> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let rows = self.rows_for_date(&date)?;

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for name in &rows {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }

        Ok(AttendanceSummary {
            date,
            total_records: rows.len(),
            unique_attendees: names.len(),
            names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn log_in(dir: &tempfile::TempDir) -> CsvAttendanceLog {
        CsvAttendanceLog::new(dir.path().join("attendance.csv")).unwrap()
    }

    #[test]
    fn test_creates_file_with_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");

        {
            let mut log = CsvAttendanceLog::new(&path).unwrap();
            log.commit("Maria", 0.91).unwrap();
        }
        // Reopening must not rewrite the header or the rows.
        let _log = CsvAttendanceLog::new(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Maria,"));
        assert!(lines[1].ends_with(",0.910"));
    }

    #[test]
    fn test_cooldown_suppresses_repeat_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);

        assert!(log.commit("Maria", 0.9).unwrap());
        assert!(!log.commit("Maria", 0.9).unwrap());
    }

    #[test]
    fn test_suppression_does_not_affect_other_identities() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);

        assert!(log.commit("Maria", 0.9).unwrap());
        assert!(!log.commit("Maria", 0.9).unwrap());
        assert!(log.commit("Yusuf", 0.8).unwrap());
    }

    #[test]
    fn test_zero_cooldown_accepts_every_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvAttendanceLog::with_cooldown(
            dir.path().join("attendance.csv"),
            Duration::ZERO,
        )
        .unwrap();

        assert!(log.commit("Maria", 0.9).unwrap());
        assert!(log.commit("Maria", 0.9).unwrap());
    }

    #[test]
    fn test_today_summary_counts_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvAttendanceLog::with_cooldown(
            dir.path().join("attendance.csv"),
            Duration::ZERO,
        )
        .unwrap();

        log.commit("Maria", 0.9).unwrap();
        log.commit("Maria", 0.9).unwrap();
        log.commit("Yusuf", 0.8).unwrap();

        let summary = log.today_summary().unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.unique_attendees, 2);
        assert_eq!(summary.names, vec!["Maria".to_string(), "Yusuf".to_string()]);
    }

    #[test]
    fn test_empty_log_summary() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        let summary = log.today_summary().unwrap();
        assert_eq!(summary.total_records, 0);
        assert!(summary.names.is_empty());
    }

    struct RecordingSink {
        pushes: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl RemoteAttendanceSink for RecordingSink {
        fn push(
            &mut self,
            name: &str,
            _recorded_at: DateTime<Local>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.pushes.lock().unwrap().push(name.to_string());
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_remote_sink_receives_accepted_events_only() {
        let dir = tempfile::tempdir().unwrap();
        let pushes = Arc::new(Mutex::new(Vec::new()));
        let mut log = log_in(&dir).with_remote_sink(Box::new(RecordingSink {
            pushes: pushes.clone(),
            fail: false,
        }));

        log.commit("Maria", 0.9).unwrap();
        log.commit("Maria", 0.9).unwrap(); // suppressed, no push

        assert_eq!(*pushes.lock().unwrap(), vec!["Maria".to_string()]);
    }

    #[test]
    fn test_remote_failure_does_not_fail_primary_write() {
        let dir = tempfile::tempdir().unwrap();
        let pushes = Arc::new(Mutex::new(Vec::new()));
        let mut log = log_in(&dir).with_remote_sink(Box::new(RecordingSink {
            pushes,
            fail: true,
        }));

        assert!(log.commit("Maria", 0.9).unwrap());
        let summary = log.today_summary().unwrap();
        assert_eq!(summary.total_records, 1);
    }
}
