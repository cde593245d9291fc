//! Run-time configuration and the clock used for expiry checks.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Options controlling transaction serialization.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct TransactionConfig {
    /// Serialize transactions whose expiry is already in the past instead of failing.
    pub allow_expired: bool,
    /// Signature count assumed when computing a signing digest before any signature exists.
    pub default_signature_count: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            allow_expired: false,
            default_signature_count: 1,
        }
    }
}

/// A source of the current time.
pub trait Clock {
    /// Seconds since the unix epoch
    fn now_unix_seconds(&self) -> u64;
}

/// Reads the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_seconds(&self) -> u64 {
        // a clock before the epoch reads as the epoch
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock frozen at a given unix time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_unix_seconds(&self) -> u64 {
        self.0
    }
}
