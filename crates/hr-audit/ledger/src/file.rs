//! JSONL evidence logs on disk: `<dir>/<scenario_id>.jsonl`, one record per line.

use crate::digest::LogDigest;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::{head_of_line, EvidenceLog};
use async_trait::async_trait;
use dashmap::DashMap;
use hr_audit_evidence::{EvidenceRecord, GENESIS_HASH};
use hr_audit_types::ScenarioId;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const LOG_EXTENSION: &str = "jsonl";
const TAIL_CHUNK: u64 = 8 * 1024;

/// File-backed evidence log directory.
///
/// Appends and head reads run on a blocking thread under a per-scenario write
/// lock, and the caller always waits for that thread. A deadline is checked
/// under the lock immediately before writing, so a timed-out append never
/// lands. A failed write is rolled back by truncating to the previous length.
pub struct FileEvidenceLog {
    dir: PathBuf,
    write_locks: DashMap<ScenarioId, Arc<Mutex<()>>>,
}

impl FileEvidenceLog {
    /// Open (creating if needed) a log directory.
    pub async fn open(dir: impl Into<PathBuf>) -> LedgerResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LedgerError::io("create evidence directory", e))?;
        Ok(Self {
            dir,
            write_locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self, scenario_id: &ScenarioId) -> LedgerResult<PathBuf> {
        check_scenario_id(scenario_id)?;
        Ok(self
            .dir
            .join(format!("{}.{}", scenario_id.as_str(), LOG_EXTENSION)))
    }

    pub fn meta_path(&self, scenario_id: &ScenarioId) -> LedgerResult<PathBuf> {
        check_scenario_id(scenario_id)?;
        Ok(self.dir.join(format!("{}.meta.json", scenario_id.as_str())))
    }

    /// Write a digest next to its log as `<scenario_id>.meta.json`.
    pub async fn write_meta(&self, digest: &LogDigest) -> LedgerResult<PathBuf> {
        let path = self.meta_path(&digest.scenario_id)?;
        let json = serde_json::to_string_pretty(digest)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LedgerError::io("write log digest", e))?;
        Ok(path)
    }

    fn write_lock(&self, scenario_id: &ScenarioId) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(scenario_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn append_until(
        &self,
        record: &EvidenceRecord,
        deadline: Option<Deadline>,
    ) -> LedgerResult<()> {
        let scenario_id = record.scenario.scenario_id.clone();
        let path = self.log_path(&scenario_id)?;
        let line = record.to_json_line().map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let parent = record.parent_hash().to_string();
        let lock = self.write_lock(&scenario_id);

        let task_path = path.clone();
        tokio::task::spawn_blocking(move || {
            append_blocking(&task_path, &scenario_id, &lock, &parent, &line, deadline)
        })
        .await
        .map_err(|e| LedgerError::Backend(format!("append task failed: {}", e)))??;

        debug!(path = %path.display(), record_hash = %record.record_hash(), "Evidence line appended");
        Ok(())
    }
}

/// Latest instant a write may start, and the timeout it came from.
#[derive(Clone, Copy)]
struct Deadline {
    /// `None` when the timeout is too large to represent: never expires.
    at: Option<Instant>,
    timeout: Duration,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
            timeout,
        }
    }

    fn check(&self) -> LedgerResult<()> {
        if self.at.is_some_and(|at| Instant::now() >= at) {
            return Err(LedgerError::Timeout {
                operation: "evidence append",
                timeout: self.timeout,
            });
        }
        Ok(())
    }
}

fn check_scenario_id(scenario_id: &ScenarioId) -> LedgerResult<()> {
    let id = scenario_id.as_str();
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidScenarioId(id.to_string()))
    }
}

fn read_log(path: &Path) -> LedgerResult<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(LedgerError::io("read evidence log", e)),
    }
}

fn head_from_content(scenario_id: &ScenarioId, content: &str) -> LedgerResult<String> {
    if !content.is_empty() && !content.ends_with('\n') {
        return Err(LedgerError::Corrupt {
            scenario_id: scenario_id.to_string(),
            line: content.lines().count(),
            message: "unterminated last line".to_string(),
        });
    }
    match content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .last()
    {
        Some((i, line)) => head_of_line(scenario_id, i + 1, line),
        None => Ok(GENESIS_HASH.to_string()),
    }
}

/// Head hash from the end of the log, reading backwards one chunk at a time
/// until the last non-blank line is complete.
///
/// Anything unexpected falls back to a full read, which reports the exact
/// corrupt line.
fn read_head(path: &Path, scenario_id: &ScenarioId) -> LedgerResult<String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(GENESIS_HASH.to_string()),
        Err(e) => return Err(LedgerError::io("open evidence log", e)),
    };
    let len = file
        .metadata()
        .map_err(|e| LedgerError::io("stat evidence log", e))?
        .len();
    if len == 0 {
        return Ok(GENESIS_HASH.to_string());
    }

    let mut pos = len;
    let mut tail: Vec<u8> = Vec::new();
    loop {
        let start = pos.saturating_sub(TAIL_CHUNK);
        let mut chunk = vec![0u8; usize::try_from(pos - start).unwrap_or(0)];
        file.seek(SeekFrom::Start(start))
            .and_then(|_| file.read_exact(&mut chunk))
            .map_err(|e| LedgerError::io("read evidence log", e))?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
        pos = start;

        if tail.last() != Some(&b'\n') {
            break;
        }
        match last_line(&tail, pos == 0) {
            Tail::Empty => return Ok(GENESIS_HASH.to_string()),
            Tail::Line(line) => {
                let parsed = std::str::from_utf8(line).map(|l| head_of_line(scenario_id, 0, l));
                match parsed {
                    Ok(Ok(head)) => return Ok(head),
                    _ => break,
                }
            }
            Tail::NeedMore => {}
        }
    }
    head_from_content(scenario_id, &read_log(path)?)
}

enum Tail<'a> {
    Empty,
    Line(&'a [u8]),
    NeedMore,
}

fn last_line(tail: &[u8], at_start: bool) -> Tail<'_> {
    let Some(end) = tail.iter().rposition(|b| !b.is_ascii_whitespace()) else {
        return if at_start { Tail::Empty } else { Tail::NeedMore };
    };
    match tail[..end].iter().rposition(|&b| b == b'\n') {
        Some(newline) => Tail::Line(&tail[newline + 1..=end]),
        None if at_start => Tail::Line(&tail[..=end]),
        None => Tail::NeedMore,
    }
}

fn head_blocking(path: &Path, scenario_id: &ScenarioId, lock: &Mutex<()>) -> LedgerResult<String> {
    let _guard = lock
        .lock()
        .map_err(|_| LedgerError::Backend("lock poisoned".into()))?;
    read_head(path, scenario_id)
}

fn append_blocking(
    path: &Path,
    scenario_id: &ScenarioId,
    lock: &Mutex<()>,
    parent_hash: &str,
    line: &str,
    deadline: Option<Deadline>,
) -> LedgerResult<()> {
    let _guard = lock
        .lock()
        .map_err(|_| LedgerError::Backend("lock poisoned".into()))?;

    let head = read_head(path, scenario_id)?;
    if head != parent_hash {
        return Err(LedgerError::ChainConflict {
            expected: head,
            found: parent_hash.to_string(),
        });
    }
    if let Some(deadline) = deadline {
        deadline.check()?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::io("open evidence log", e))?;
    let previous_len = file
        .metadata()
        .map_err(|e| LedgerError::io("stat evidence log", e))?
        .len();

    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');

    if let Err(e) = file.write_all(&bytes).and_then(|_| file.sync_data()) {
        if let Err(rollback) = file.set_len(previous_len) {
            error!(path = %path.display(), error = %rollback, "Rollback of partial append failed");
        }
        return Err(LedgerError::io("append evidence record", e));
    }
    Ok(())
}

#[async_trait]
impl EvidenceLog for FileEvidenceLog {
    async fn head_hash(&self, scenario_id: &ScenarioId) -> LedgerResult<String> {
        let path = self.log_path(scenario_id)?;
        let lock = self.write_lock(scenario_id);
        let scenario_id = scenario_id.clone();
        tokio::task::spawn_blocking(move || head_blocking(&path, &scenario_id, &lock))
            .await
            .map_err(|e| LedgerError::Backend(format!("head read task failed: {}", e)))?
    }

    async fn append(&self, record: &EvidenceRecord) -> LedgerResult<()> {
        self.append_until(record, None).await
    }

    async fn append_within(&self, record: &EvidenceRecord, timeout: Duration) -> LedgerResult<()> {
        self.append_until(record, Some(Deadline::after(timeout))).await
    }

    async fn raw_lines(&self, scenario_id: &ScenarioId) -> LedgerResult<Vec<String>> {
        let path = self.log_path(scenario_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io("read evidence log", e)),
        };
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn scenarios(&self) -> LedgerResult<Vec<ScenarioId>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| LedgerError::io("list evidence logs", e))?;
        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LedgerError::io("list evidence logs", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(ScenarioId::new(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}
