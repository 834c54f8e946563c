use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use gate_core::CommandRequest;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const LOG_LAYOUT_VERSION: &str = "v1";

/// Receives one record per invocation. Must not block and must not fail.
pub trait AuditSink: Send + Sync {
    fn record(&self, rec: AuditRecord);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    /// Gateway-assigned request id; also on every tracing event of the dispatch.
    pub req_id: u64,
    pub identity: String,
    pub action: String,
    pub args: Map<String, Value>,
    pub channel: String,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_request(req_id: u64, req: &CommandRequest) -> Self {
        Self {
            req_id,
            identity: req.identity.display.clone(),
            action: req.action.clone(),
            args: req.args.clone(),
            channel: req.channel.clone(),
            at: req.created_at,
        }
    }

    pub fn args_text(&self) -> String {
        Value::Object(self.args.clone()).to_string()
    }

    pub fn to_logfmt(&self, dest: &str) -> String {
        format!(
            "ts={} req={} user={} action={} args={} channel={} dest={}",
            self.at.format("%Y-%m-%dT%H:%M:%SZ"),
            self.req_id,
            logfmt_str(&self.identity),
            logfmt_str(&self.action),
            logfmt_str(&self.args_text()),
            logfmt_str(&self.channel),
            logfmt_str(dest),
        )
    }
}

pub fn object_relpath(ts: DateTime<Utc>) -> String {
    format!(
        "{}/audit/{:04}/{:02}/{:02}.log",
        LOG_LAYOUT_VERSION,
        ts.year(),
        ts.month(),
        ts.day()
    )
}

fn logfmt_str(s: &str) -> String {
    // Always quote; logfmt readers accept this and it avoids edge cases.
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub enabled: bool,
    pub spool_dir: PathBuf,
    pub flush_interval_s: u64,
    pub queue_len: usize,
    /// Chat channel the records are destined for; stamped into each line.
    pub dest: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spool_dir: PathBuf::from("locks/audit"),
            flush_interval_s: 60,
            queue_len: 1024,
            dest: String::new(),
        }
    }
}

/// Emits every record as a tracing event and, when enabled, appends it to a
/// daily spool file from a background task.
pub struct AuditLog {
    dest: String,
    tx: Option<mpsc::Sender<AuditRecord>>,
    writer: Option<JoinHandle<()>>,
}

impl AuditLog {
    /// Must be called from within a tokio runtime when `cfg.enabled`.
    pub fn new(cfg: AuditConfig) -> Self {
        if !cfg.enabled {
            return Self {
                dest: cfg.dest,
                tx: None,
                writer: None,
            };
        }
        let (tx, rx) = mpsc::channel::<AuditRecord>(cfg.queue_len.max(1));
        let dest = cfg.dest.clone();
        let writer = tokio::spawn(writer_task(cfg, rx));
        Self {
            dest,
            tx: Some(tx),
            writer: Some(writer),
        }
    }

    /// Stop accepting records and wait until queued ones are on disk.
    pub async fn shutdown(mut self) {
        self.tx.take();
        if let Some(w) = self.writer.take() {
            if let Err(e) = w.await {
                warn!(err=%e, "audit writer ended abnormally");
            }
        }
    }
}

impl AuditSink for AuditLog {
    fn record(&self, rec: AuditRecord) {
        info!(
            req = rec.req_id,
            user = %rec.identity,
            action = %rec.action,
            args = %rec.args_text(),
            channel = %rec.channel,
            dest = %self.dest,
            "command used"
        );
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        match tx.try_send(rec) {
            Ok(()) => {}
            Err(TrySendError::Full(rec)) => {
                warn!(action=%rec.action, "audit queue full; record dropped from spool");
            }
            Err(TrySendError::Closed(rec)) => {
                warn!(action=%rec.action, "audit writer gone; record dropped from spool");
            }
        }
    }
}

async fn writer_task(cfg: AuditConfig, mut rx: mpsc::Receiver<AuditRecord>) {
    let mut w = LocalWriter::new(cfg.spool_dir.clone(), Utc::now().date_naive());
    let mut tick = tokio::time::interval(Duration::from_secs(cfg.flush_interval_s.max(1)));
    tick.tick().await;

    loop {
        tokio::select! {
            rec = rx.recv() => {
                let Some(rec) = rec else { break; };
                let now = Utc::now();
                let line = rec.to_logfmt(&cfg.dest);
                if let Err(e) = w.write_line(now.date_naive(), &object_relpath(now), &line) {
                    warn!(err=%e, "audit write failed");
                }
            }
            _ = tick.tick() => {
                if let Err(e) = w.flush_all() {
                    warn!(err=%e, "audit flush failed");
                }
            }
        }
    }

    if let Err(e) = w.flush_all() {
        warn!(err=%e, "audit flush failed");
    }
}

struct LocalWriter {
    root: PathBuf,
    date: NaiveDate,
    open: HashMap<String, BufWriter<std::fs::File>>,
}

impl LocalWriter {
    fn new(root: PathBuf, date: NaiveDate) -> Self {
        Self {
            root,
            date,
            open: HashMap::new(),
        }
    }

    fn rotate_if_needed(&mut self, date: NaiveDate) {
        if date == self.date {
            return;
        }
        // Flush and close all file handles before rotating.
        let _ = self.flush_all();
        self.open.clear();
        self.date = date;
    }

    fn write_line(&mut self, date: NaiveDate, rel: &str, line: &str) -> std::io::Result<()> {
        self.rotate_if_needed(date);

        if !self.open.contains_key(rel) {
            let mut path = self.root.clone();
            path.push(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let f = OpenOptions::new().create(true).append(true).open(&path)?;
            self.open.insert(rel.to_string(), BufWriter::new(f));
        }
        let Some(w) = self.open.get_mut(rel) else {
            return Ok(());
        };

        w.write_all(line.trim_end_matches('\n').as_bytes())?;
        w.write_all(b"\n")
    }

    fn flush_all(&mut self) -> std::io::Result<()> {
        for w in self.open.values_mut() {
            w.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Keeps every record in memory.
    #[derive(Default)]
    pub(crate) struct MemoryAudit {
        pub(crate) records: Mutex<Vec<AuditRecord>>,
    }

    impl AuditSink for MemoryAudit {
        fn record(&self, rec: AuditRecord) {
            self.records.lock().unwrap().push(rec);
        }
    }

    fn rec() -> AuditRecord {
        let mut args = Map::new();
        args.insert("server_name".to_string(), Value::from("eu-1"));
        args.insert("player_name".to_string(), Value::from("bad \"guy\""));
        AuditRecord {
            req_id: 7,
            identity: "@mod".to_string(),
            action: "kick".to_string(),
            args,
            channel: "#ops".to_string(),
            at: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
        }
    }

    #[test]
    fn logfmt_line_quotes_everything() {
        assert_eq!(
            rec().to_logfmt("1234"),
            r##"ts=2026-03-04T05:06:07Z req=7 user="@mod" action="kick" args="{\"player_name\":\"bad \\\"guy\\\"\",\"server_name\":\"eu-1\"}" channel="#ops" dest="1234""##
        );
    }

    #[test]
    fn relpath_layout() {
        assert_eq!(object_relpath(rec().at), "v1/audit/2026/03/04.log");
    }

    #[test]
    fn writer_rotates_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let mut w = LocalWriter::new(dir.path().to_path_buf(), d1);
        w.write_line(d1, "v1/audit/2026/03/04.log", "a").unwrap();
        w.write_line(d1, "v1/audit/2026/03/04.log", "b\n").unwrap();
        w.write_line(d2, "v1/audit/2026/03/05.log", "c").unwrap();
        w.flush_all().unwrap();

        let day1 = std::fs::read_to_string(dir.path().join("v1/audit/2026/03/04.log")).unwrap();
        let day2 = std::fs::read_to_string(dir.path().join("v1/audit/2026/03/05.log")).unwrap();
        assert_eq!(day1, "a\nb\n");
        assert_eq!(day2, "c\n");
        assert_eq!(w.open.len(), 1);
    }

    #[tokio::test]
    async fn spool_receives_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(AuditConfig {
            enabled: true,
            spool_dir: dir.path().to_path_buf(),
            flush_interval_s: 3600,
            queue_len: 8,
            dest: "audit-chan".to_string(),
        });
        log.record(rec());
        log.shutdown().await;

        let today = object_relpath(Utc::now());
        let s = std::fs::read_to_string(dir.path().join(today)).unwrap();
        assert_eq!(s.lines().count(), 1);
        assert!(s.contains(r#"action="kick""#));
        assert!(s.contains(r#"dest="audit-chan""#));
    }

    #[test]
    fn disabled_log_needs_no_runtime() {
        let log = AuditLog::new(AuditConfig::default());
        log.record(rec());
    }
}
