// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::ClientError;
use crate::flusher::DeadLetter;
use reqwest::Url;
use std::env;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Base URL of the LogDNA ingest API.
pub const INGEST_BASE_URL: &str = "https://logs.logdna.com/logs/ingest";

/// Number of buffered lines that triggers an automatic flush.
pub const DEFAULT_FLUSH_LIMIT: usize = 5000;

/// Submission queue capacity, as a multiple of the flush limit.
pub(crate) const QUEUE_CAPACITY_FACTOR: usize = 10;

const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Callback receiving batches the client gave up on.
pub type DeadLetterFn = Arc<dyn Fn(DeadLetter) + Send + Sync>;

/// Retry policy applied to threshold-triggered flushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Consecutive failed attempts before the batch is dead-lettered.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on every further failure.
    pub base_backoff: Duration,
    /// Upper bound for a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Configuration used by [`crate::Client::new`].
///
/// Immutable once the client is built. Empty `api_key` or `hostname` are
/// accepted here and show up later as rejected deliveries.
#[derive(Clone)]
pub struct ClientConfig {
    /// Ingestion key, sent as the basic-auth user of every request.
    pub api_key: String,
    /// Label attached to every line as `file`.
    pub log_file: String,
    /// Label sent as the `hostname` query parameter.
    pub hostname: String,
    /// Lines buffered before an automatic flush. Zero means [`DEFAULT_FLUSH_LIMIT`].
    pub flush_limit: usize,
    /// Ingest endpoint, without credentials or query.
    pub ingest_url: String,
    /// Timeout applied to each delivery request.
    pub flush_timeout: Duration,
    /// Backoff and give-up policy for failed threshold flushes.
    pub retry: RetryConfig,
    /// Receives batches dropped after permanent or exhausted failures.
    pub dead_letter: Option<DeadLetterFn>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            log_file: String::new(),
            hostname: String::new(),
            flush_limit: DEFAULT_FLUSH_LIMIT,
            ingest_url: INGEST_BASE_URL.to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            retry: RetryConfig::default(),
            dead_letter: None,
        }
    }
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("log_file", &self.log_file)
            .field("hostname", &self.hostname)
            .field("flush_limit", &self.flush_limit)
            .field("ingest_url", &self.ingest_url)
            .field("flush_timeout", &self.flush_timeout)
            .field("retry", &self.retry)
            .field("dead_letter", &self.dead_letter.is_some())
            .finish()
    }
}

impl ClientConfig {
    /// Create configuration from `LOGDNA_*` environment variables.
    ///
    /// Unset or unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();
        let api_key = env::var("LOGDNA_API_KEY").unwrap_or_default();
        let log_file = env::var("LOGDNA_LOG_FILE").unwrap_or_default();
        let hostname = env::var("LOGDNA_HOSTNAME").unwrap_or_default();
        let flush_limit = env::var("LOGDNA_FLUSH_LIMIT")
            .ok()
            .and_then(|limit| limit.parse::<usize>().ok())
            .unwrap_or(DEFAULT_FLUSH_LIMIT);
        let ingest_url = env::var("LOGDNA_INGEST_URL").unwrap_or(defaults.ingest_url);
        let flush_timeout = env::var("LOGDNA_FLUSH_TIMEOUT")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map_or(defaults.flush_timeout, Duration::from_secs);

        let config = Self {
            api_key,
            log_file,
            hostname,
            flush_limit,
            ingest_url,
            flush_timeout,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the client cannot operate with.
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Err(e) = Url::parse(&self.ingest_url) {
            return Err(ClientError::InvalidConfig(format!(
                "invalid ingest url '{}': {e}",
                self.ingest_url
            )));
        }

        if self.flush_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "flush timeout must be greater than 0".to_string(),
            ));
        }

        let max_flush_limit = Semaphore::MAX_PERMITS / QUEUE_CAPACITY_FACTOR;
        if self.effective_flush_limit() > max_flush_limit {
            return Err(ClientError::InvalidConfig(format!(
                "flush limit must be at most {max_flush_limit}"
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "retry max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Flush limit with the zero-means-default rule applied.
    #[must_use]
    pub fn effective_flush_limit(&self) -> usize {
        if self.flush_limit == 0 {
            DEFAULT_FLUSH_LIMIT
        } else {
            self.flush_limit
        }
    }

    pub(crate) fn queue_capacity(&self) -> usize {
        self.effective_flush_limit()
            .saturating_mul(QUEUE_CAPACITY_FACTOR)
    }
}
