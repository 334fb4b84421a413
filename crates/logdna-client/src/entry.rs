// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A log line submitted by a producer, not yet buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: SystemTime, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// Converts the entry into its wire representation.
    #[must_use]
    pub fn into_line(self, file: &str) -> LogLine {
        LogLine {
            timestamp: unix_millis(self.timestamp),
            line: self.message,
            file: file.to_string(),
        }
    }
}

/// One element of the ingest payload's `lines` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub line: String,
    pub file: String,
}

/// Complete JSON document posted to the ingest API.
#[derive(Debug, Serialize)]
pub(crate) struct Payload<'a> {
    pub lines: &'a [LogLine],
}

/// Milliseconds since the Unix epoch, truncated toward zero from
/// nanosecond precision. Instants before the epoch yield negative values.
#[must_use]
pub fn unix_millis(timestamp: SystemTime) -> i64 {
    let nanos = match timestamp.duration_since(UNIX_EPOCH) {
        Ok(after) => i128::try_from(after.as_nanos()).unwrap_or(i128::MAX),
        Err(before) => -i128::try_from(before.duration().as_nanos()).unwrap_or(i128::MAX),
    };
    let millis = nanos / 1_000_000;
    i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    #[test]
    fn truncates_sub_millisecond_precision() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 999_999);
        assert_eq!(unix_millis(t), 1_700_000_000_000);

        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 1_000_000);
        assert_eq!(unix_millis(t), 1_700_000_000_001);
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(unix_millis(UNIX_EPOCH), 0);
    }

    #[test]
    fn pre_epoch_truncates_toward_zero() {
        let t = UNIX_EPOCH - Duration::from_nanos(1_500_000);
        assert_eq!(unix_millis(t), -1);

        let t = UNIX_EPOCH - Duration::from_nanos(999_999);
        assert_eq!(unix_millis(t), 0);
    }

    #[test]
    fn into_line_attaches_file_label() {
        let entry = LogEntry::new(UNIX_EPOCH + Duration::from_millis(42), "hello");
        let line = entry.into_line("app.log");
        assert_eq!(
            line,
            LogLine {
                timestamp: 42,
                line: "hello".to_string(),
                file: "app.log".to_string(),
            }
        );
    }

    #[test]
    fn payload_json_layout() {
        let lines = vec![LogLine {
            timestamp: 1,
            line: "a \"quoted\" line".to_string(),
            file: "f".to_string(),
        }];
        let body = serde_json::to_string(&Payload { lines: &lines }).unwrap();
        assert_eq!(
            body,
            r#"{"lines":[{"timestamp":1,"line":"a \"quoted\" line","file":"f"}]}"#
        );
    }

    #[test]
    fn empty_payload_json_layout() {
        let body = serde_json::to_string(&Payload { lines: &[] }).unwrap();
        assert_eq!(body, r#"{"lines":[]}"#);
    }

    proptest! {
        #[test]
        fn millis_are_nanos_divided_by_a_million(nanos in 0u64..=u64::MAX / 2) {
            let t = UNIX_EPOCH + Duration::from_nanos(nanos);
            prop_assert_eq!(unix_millis(t), (nanos / 1_000_000) as i64);
        }
    }
}
