//! Timestamped values.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{StatusCode, Variant};

/// Timestamp (nanoseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTime(i64);

impl DateTime {
    /// The current wall-clock time.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX));
        Self(nanos)
    }

    /// Create from nanoseconds since the epoch.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the epoch.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }
}

/// A value together with its status and timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    /// The value, `Empty` when the status is bad.
    pub value: Variant,
    /// Quality of the value.
    pub status: StatusCode,
    /// When the source produced the value.
    pub source_timestamp: Option<DateTime>,
    /// When the address space served the value.
    pub server_timestamp: Option<DateTime>,
}

impl DataValue {
    /// Create a good value without timestamps.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Create an empty value carrying a status.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set the source timestamp.
    #[must_use]
    pub fn with_source_timestamp(mut self, timestamp: DateTime) -> Self {
        self.source_timestamp = Some(timestamp);
        self
    }

    /// Set the server timestamp.
    #[must_use]
    pub fn with_server_timestamp(mut self, timestamp: DateTime) -> Self {
        self.server_timestamp = Some(timestamp);
        self
    }
}

impl From<Variant> for DataValue {
    fn from(value: Variant) -> Self {
        Self::new(value)
    }
}
