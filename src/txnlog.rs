//! Append-only, line-oriented write-ahead log. Every phase transition for a
//! node is one `TID [<uuid>] - <phase>` line; the log write precedes the
//! network side-effect it records.
//!
//! Grounded on `wal.rs`'s durability discipline (flush, then fsync before
//! returning) but framed as text lines rather than length-prefixed binary
//! records, per the wire format this engine's log actually uses.

use crate::error::TpcResult;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    VoteCommit,
    VoteAbort,
    Commit,
    Abort,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prepare => "PREPARE",
            Phase::VoteCommit => "VoteCommit",
            Phase::VoteAbort => "VoteAbort",
            Phase::Commit => "COMMIT",
            Phase::Abort => "ABORT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PREPARE" => Some(Phase::Prepare),
            "VoteCommit" => Some(Phase::VoteCommit),
            "VoteAbort" => Some(Phase::VoteAbort),
            "COMMIT" => Some(Phase::Commit),
            "ABORT" => Some(Phase::Abort),
            _ => None,
        }
    }

    /// Whether this phase is a terminal outcome for the transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Commit | Phase::Abort)
    }
}

pub struct TransactionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl TransactionLog {
    pub fn open(path: impl Into<PathBuf>) -> TpcResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(TransactionLog {
            path,
            file: Mutex::new(file),
        })
    }

    /// Appends one line and fsyncs before returning, so the caller's
    /// subsequent network call is guaranteed write-ahead of this entry.
    pub fn append(&self, tid: Uuid, phase: Phase) -> TpcResult<()> {
        let mut file = self.file.lock().unwrap();
        writeln!(file, "TID [{tid}] - {}", phase.as_str())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Streams the file top-to-bottom and returns the most recent terminal
    /// (COMMIT/ABORT) phase recorded for `tid`, if any.
    pub fn terminal_entry(&self, tid: Uuid) -> TpcResult<Option<Phase>> {
        let _guard = self.file.lock().unwrap();
        let reader = BufReader::new(File::open(&self.path)?);
        let mut latest = None;
        let needle = format!("TID [{tid}] - ");
        for line in reader.lines() {
            let line = line?;
            if let Some(rest) = line.strip_prefix(&needle) {
                if let Some(phase) = Phase::parse(rest) {
                    if phase.is_terminal() {
                        latest = Some(phase);
                    }
                }
            }
        }
        Ok(latest)
    }
}
