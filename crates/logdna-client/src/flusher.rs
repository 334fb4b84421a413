// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Flush controller: owns the batch buffer and decides when it is delivered.
//!
//! Three triggers exist:
//! - the threshold check after every append,
//! - an explicit flush requested through the client,
//! - the final flush when the worker shuts down.
//!
//! Only threshold flushes are retried. A failed threshold flush keeps the
//! batch and arms a backoff deadline; the threshold check is suspended until
//! the worker reports the deadline as due. Permanent failures and exhausted
//! retries hand the batch to the dead-letter callback and clear the buffer.

use crate::buffer::BatchBuffer;
use crate::config::{DeadLetterFn, RetryConfig};
use crate::entry::{LogEntry, LogLine};
use crate::errors::FlushError;
use crate::retry::{BackoffState, RetryDecision};
use crate::sink::DeliverySink;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

/// A batch the client stopped trying to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub lines: Vec<LogLine>,
    /// Rendered error of the last attempt.
    pub error: String,
    /// Whether the last error was classified as transient.
    pub retryable: bool,
    /// Delivery attempts made for this batch.
    pub attempts: u32,
}

pub(crate) struct FlushController {
    buffer: BatchBuffer,
    sink: DeliverySink,
    backoff: BackoffState,
    retry_at: Option<Instant>,
    dead_letter: Option<DeadLetterFn>,
}

impl FlushController {
    pub fn new(
        buffer: BatchBuffer,
        sink: DeliverySink,
        retry: RetryConfig,
        dead_letter: Option<DeadLetterFn>,
    ) -> Self {
        Self {
            buffer,
            sink,
            backoff: BackoffState::new(retry),
            retry_at: None,
            dead_letter,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Deadline of the pending retry, if a threshold flush failed.
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Appends an entry and flushes if the threshold is reached.
    pub async fn append(&mut self, entry: LogEntry) {
        trace!("LOGDNA | {}", entry.message);
        self.buffer.push(entry);
        if self.retry_at.is_none() && self.buffer.reached_limit() {
            self.threshold_flush().await;
        }
    }

    /// Called by the worker once the backoff deadline has passed.
    pub async fn retry_due(&mut self) {
        self.retry_at = None;
        self.threshold_flush().await;
    }

    /// Delivers the buffer once. The buffer is cleared only on success.
    pub async fn flush(&mut self) -> Result<(), FlushError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!("LOGDNA | Flushing {} lines", self.buffer.len());
        self.sink.deliver(self.buffer.lines()).await?;
        self.buffer.clear();
        self.backoff.register_success();
        self.retry_at = None;
        Ok(())
    }

    /// Last flush before the worker exits. Lines that could not be sent are
    /// dead-lettered since no later attempt will happen.
    pub async fn final_flush(&mut self) -> Result<(), FlushError> {
        let result = self.flush().await;
        if let Err(e) = &result {
            let attempts = self.backoff.attempts().saturating_add(1);
            self.give_up(e, attempts);
        }
        result
    }

    async fn threshold_flush(&mut self) {
        let Err(e) = self.flush().await else {
            return;
        };

        match self.backoff.register_error(e.is_retryable()) {
            RetryDecision::RetryAfter(delay) => {
                warn!(
                    "LOGDNA | Failed to flush {} lines (attempt {}): {e}, retrying in {} ms",
                    self.buffer.len(),
                    self.backoff.attempts(),
                    delay.as_millis()
                );
                self.retry_at = Some(Instant::now() + delay);
            }
            RetryDecision::GiveUp => {
                let attempts = self.backoff.attempts();
                self.backoff.register_success();
                self.give_up(&e, attempts);
            }
        }
    }

    fn give_up(&mut self, e: &FlushError, attempts: u32) {
        let lines = self.buffer.take();
        self.retry_at = None;
        error!(
            "LOGDNA | Dropping {} lines after {attempts} failed attempts: {e}",
            lines.len()
        );
        if let Some(dead_letter) = &self.dead_letter {
            dead_letter(DeadLetter {
                lines,
                error: e.to_string(),
                retryable: e.is_retryable(),
                attempts,
            });
        }
    }
}
