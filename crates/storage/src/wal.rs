// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log. JSON-lines on disk; the source of truth that
//! [`crate::state::MaterializedState`] is replayed from at startup.

use crate::error::StoreError;
use dispatchd_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub trait Wal: Send {
    fn append(&mut self, event: &Event) -> Result<(), StoreError>;
}

/// A [`Wal`] backed by a single append-only file. A trailing line left
/// malformed by a process killed mid-write is skipped on replay rather than
/// failing startup.
pub struct FileWal {
    writer: BufWriter<File>,
}

impl FileWal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = OpenOptions::new().create(true).append(true).open(path).map_err(StoreError::Wal)?;
        Ok(Self { writer: BufWriter::new(file) })
    }

    /// Replay every well-formed event in file order. Missing file means an
    /// empty log, not an error.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<Event>, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path).map_err(StoreError::Wal)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping corrupt WAL line");
                }
            }
        }
        Ok(events)
    }
}

impl Wal for FileWal {
    fn append(&mut self, event: &Event) -> Result<(), StoreError> {
        let line = serde_json::to_string(event).map_err(StoreError::Corrupt)?;
        self.writer.write_all(line.as_bytes()).map_err(StoreError::Wal)?;
        self.writer.write_all(b"\n").map_err(StoreError::Wal)?;
        self.writer.flush().map_err(StoreError::Wal)?;
        Ok(())
    }
}

/// No-op WAL for tests that only care about [`crate::state::MaterializedState`]
/// transitions, not durability.
#[derive(Default)]
pub struct NullWal;

impl Wal for NullWal {
    fn append(&mut self, _event: &Event) -> Result<(), StoreError> {
        Ok(())
    }
}
