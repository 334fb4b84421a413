// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::entry::{LogEntry, LogLine};

/// Lines accumulated since the last successful flush.
///
/// Append-only until [`BatchBuffer::clear`]. Owned by the ingestion worker,
/// so no synchronization is needed.
#[derive(Debug, Clone)]
pub struct BatchBuffer {
    lines: Vec<LogLine>,
    file: String,
    flush_limit: usize,
}

impl BatchBuffer {
    #[must_use]
    pub fn new(file: impl Into<String>, flush_limit: usize) -> Self {
        Self {
            lines: Vec::new(),
            file: file.into(),
            flush_limit,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.lines.push(entry.into_line(&self.file));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True once the buffer holds at least `flush_limit` lines.
    #[must_use]
    pub fn reached_limit(&self) -> bool {
        self.lines.len() >= self.flush_limit
    }

    #[must_use]
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Empties the buffer, handing back what it held.
    pub fn take(&mut self) -> Vec<LogLine> {
        std::mem::take(&mut self.lines)
    }
}
