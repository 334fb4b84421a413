// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::RetryConfig;
use std::time::Duration;

/// What the flush controller should do after a failed threshold flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the batch and try again after the delay.
    RetryAfter(Duration),
    /// Stop retrying this batch.
    GiveUp,
}

/// Tracks consecutive failures of threshold-triggered flushes.
#[derive(Debug)]
pub struct BackoffState {
    config: RetryConfig,
    attempts: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Failed attempts since the last success.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Registers a failure and decides whether another attempt is allowed.
    pub fn register_error(&mut self, retryable: bool) -> RetryDecision {
        self.attempts = self.attempts.saturating_add(1);
        if !retryable || self.attempts >= self.config.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.delay())
    }

    pub fn register_success(&mut self) {
        self.attempts = 0;
    }

    /// `base * 2^(attempts-1)`, capped at `max_backoff`.
    fn delay(&self) -> Duration {
        let exponent = self.attempts.saturating_sub(1).min(31);
        self.config
            .base_backoff
            .checked_mul(1u32 << exponent)
            .map_or(self.config.max_backoff, |d| d.min(self.config.max_backoff))
    }
}
