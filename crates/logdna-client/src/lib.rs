// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client library that batches log lines in memory and ships them as JSON
//! to the LogDNA ingest API.
//!
//! # Architecture
//!
//! ```text
//!   producers (any number of tasks/threads)
//!        │  log / flush / size
//!        v
//!   ┌──────────────────┐
//!   │ Submission queue │  bounded, 10 × flush limit
//!   └────────┬─────────┘
//!            v
//!   ┌──────────────────┐
//!   │ Ingestion worker │  single owner of the buffer
//!   └────────┬─────────┘
//!            v
//!   ┌──────────────────┐
//!   │ Flush controller │  threshold / explicit / final flush, backoff
//!   └────────┬─────────┘
//!            v
//!   ┌──────────────────┐
//!   │  Delivery sink   │  one JSON POST per flush
//!   └──────────────────┘
//! ```

#![deny(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod buffer;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod entry;
pub mod errors;
mod flusher;
pub mod retry;
pub mod sink;
mod worker;

pub use client::{Client, ClientHandle};
pub use config::{ClientConfig, DeadLetterFn, RetryConfig, DEFAULT_FLUSH_LIMIT, INGEST_BASE_URL};
pub use entry::{LogEntry, LogLine};
pub use errors::{ClientError, FlushError};
pub use flusher::DeadLetter;
