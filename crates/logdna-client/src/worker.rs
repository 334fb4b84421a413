// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ingestion worker: the single owner of the batch buffer.
//!
//! Producers never touch the buffer. They send [`Command`]s over a bounded
//! channel and the worker applies them one at a time, so appends, size
//! queries and every kind of flush are serialized without locks.
//!
//! ```text
//!    producers ──Log/Flush/Size──▶ [ bounded queue ] ──▶ worker ──▶ FlushController ──▶ sink
//! ```
//!
//! The worker stops when its cancellation token fires or every sender is
//! dropped. It then drains what is already queued, flushes once more and
//! returns the result of that final flush.

use crate::entry::LogEntry;
use crate::errors::FlushError;
use crate::flusher::FlushController;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[derive(Debug)]
pub(crate) enum Command {
    Log(LogEntry),
    Flush(oneshot::Sender<Result<(), FlushError>>),
    Size(oneshot::Sender<usize>),
}

pub(crate) struct IngestionWorker {
    rx: mpsc::Receiver<Command>,
    controller: FlushController,
    cancel: CancellationToken,
    drain_limit: usize,
}

impl IngestionWorker {
    pub fn new(
        rx: mpsc::Receiver<Command>,
        controller: FlushController,
        cancel: CancellationToken,
        drain_limit: usize,
    ) -> Self {
        Self {
            rx,
            controller,
            cancel,
            drain_limit,
        }
    }

    pub async fn run(mut self) -> Result<(), FlushError> {
        debug!("LOGDNA | Ingestion worker started");

        loop {
            let retry_at = self.controller.retry_at();
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("LOGDNA | Ingestion worker cancelled");
                    break;
                }
                () = wait_for_retry(retry_at) => {
                    self.controller.retry_due().await;
                }
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => {
                        debug!("LOGDNA | All client handles dropped");
                        break;
                    }
                },
            }
        }

        self.drain().await;
        let result = self.controller.final_flush().await;
        debug!("LOGDNA | Ingestion worker stopped");
        result
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Log(entry) => self.controller.append(entry).await,
            Command::Flush(response_tx) => {
                let result = self.controller.flush().await;
                if response_tx.send(result).is_err() {
                    error!("LOGDNA | Failed to send flush response - receiver dropped");
                }
            }
            Command::Size(response_tx) => {
                if response_tx.send(self.controller.len()).is_err() {
                    error!("LOGDNA | Failed to send size response - receiver dropped");
                }
            }
        }
    }

    /// Processes commands queued before shutdown, at most `drain_limit`.
    async fn drain(&mut self) {
        self.rx.close();

        let mut drained = 0;
        while drained < self.drain_limit {
            let Ok(command) = self.rx.try_recv() else {
                break;
            };
            self.handle(command).await;
            drained += 1;
        }

        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            warn!("LOGDNA | Discarded {discarded} commands queued during shutdown");
        }
        debug!("LOGDNA | Drained {drained} queued commands");
    }
}

async fn wait_for_retry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
