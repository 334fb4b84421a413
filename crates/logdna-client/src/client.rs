// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Public entry point: [`Client`] owns the ingestion worker, [`ClientHandle`]
//! is the cloneable producer side.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use logdna_client::{Client, ClientConfig};
//! use std::time::SystemTime;
//!
//! let client = Client::new(ClientConfig {
//!     api_key: "ingestion-key".to_string(),
//!     log_file: "app.log".to_string(),
//!     hostname: "web-1".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let handle = client.handle();
//! tokio::spawn(async move {
//!     handle.log(SystemTime::now(), "from another task").await.unwrap();
//! });
//!
//! client.log(SystemTime::now(), "hello").await?;
//! client.close().await?;
//! ```

use crate::buffer::BatchBuffer;
use crate::config::ClientConfig;
use crate::endpoint::IngestEndpoint;
use crate::entry::LogEntry;
use crate::errors::{ClientError, FlushError};
use crate::flusher::FlushController;
use crate::sink::DeliverySink;
use crate::worker::{Command, IngestionWorker};
use std::time::SystemTime;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Producer handle for a [`Client`]. Cheap to clone and share across tasks
/// and threads.
#[derive(Clone, Debug)]
pub struct ClientHandle {
    tx: mpsc::Sender<Command>,
}

impl ClientHandle {
    /// Queues a line for delivery.
    ///
    /// Waits while the submission queue is full. Delivery failures are never
    /// reported here; the only error is [`ClientError::Closed`].
    pub async fn log(
        &self,
        timestamp: SystemTime,
        message: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.tx
            .send(Command::Log(LogEntry::new(timestamp, message)))
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// [`ClientHandle::log`] for threads outside the async runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_log(
        &self,
        timestamp: SystemTime,
        message: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.tx
            .blocking_send(Command::Log(LogEntry::new(timestamp, message)))
            .map_err(|_| ClientError::Closed)
    }

    /// Lines buffered and not yet delivered.
    ///
    /// Answered by the worker after every command queued before it, so a
    /// producer always observes its own earlier `log` calls.
    pub async fn size(&self) -> Result<usize, ClientError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(Command::Size(response_tx))
            .await
            .map_err(|_| ClientError::Closed)?;
        response_rx.await.map_err(|_| ClientError::Closed)
    }

    /// Delivers the buffered lines now.
    ///
    /// No-op on an empty buffer. On failure the buffer is left intact and
    /// the error is returned; no retry is scheduled.
    pub async fn flush(&self) -> Result<(), ClientError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(response_tx))
            .await
            .map_err(|_| ClientError::Closed)?;
        response_rx
            .await
            .map_err(|_| ClientError::Closed)?
            .map_err(ClientError::from)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Batching client for the LogDNA ingest API.
///
/// Must be created inside a Tokio runtime: construction spawns the
/// ingestion worker.
pub struct Client {
    handle: ClientHandle,
    cancel: CancellationToken,
    worker: JoinHandle<Result<(), FlushError>>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_cancellation(config, &CancellationToken::new())
    }

    /// Like [`Client::new`], with the worker also stopping when `parent`
    /// is cancelled. Closing the client never cancels `parent`.
    pub fn with_cancellation(
        config: ClientConfig,
        parent: &CancellationToken,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let flush_limit = config.effective_flush_limit();
        let capacity = config.queue_capacity();
        let endpoint =
            IngestEndpoint::new(&config.ingest_url, &config.api_key, &config.hostname)?;
        let sink = DeliverySink::new(endpoint, config.flush_timeout);
        debug!(
            "LOGDNA | Client created for {} with flush limit {flush_limit}",
            sink.endpoint().request_url()
        );

        let controller = FlushController::new(
            BatchBuffer::new(config.log_file, flush_limit),
            sink,
            config.retry,
            config.dead_letter,
        );

        let (tx, rx) = mpsc::channel(capacity);
        let cancel = parent.child_token();
        let worker = IngestionWorker::new(rx, controller, cancel.clone(), capacity);

        Ok(Self {
            handle: ClientHandle { tx },
            cancel,
            worker: tokio::spawn(worker.run()),
        })
    }

    /// A cloneable producer handle bound to this client.
    #[must_use]
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    pub async fn log(
        &self,
        timestamp: SystemTime,
        message: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.handle.log(timestamp, message).await
    }

    pub fn blocking_log(
        &self,
        timestamp: SystemTime,
        message: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.handle.blocking_log(timestamp, message)
    }

    pub async fn size(&self) -> Result<usize, ClientError> {
        self.handle.size().await
    }

    pub async fn flush(&self) -> Result<(), ClientError> {
        self.handle.flush().await
    }

    /// Stops the worker and returns the result of its final flush.
    ///
    /// Commands already queued are processed first, up to the queue
    /// capacity. Handles still held elsewhere get [`ClientError::Closed`]
    /// afterwards.
    pub async fn close(self) -> Result<(), ClientError> {
        self.cancel.cancel();
        self.worker.await??;
        Ok(())
    }
}
