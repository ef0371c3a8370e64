// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Tolerance applied to every validity window comparison.
pub const MAX_SKEW: Duration = Duration::from_secs(60);

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Seconds since the Unix epoch, negative before it.
pub fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// True when `[not_before, not_after]` (seconds) contains `at` within [`MAX_SKEW`].
pub(crate) fn within_window(not_before: i64, not_after: i64, at: SystemTime) -> bool {
    let at = unix_seconds(at);
    let skew = MAX_SKEW.as_secs() as i64;
    not_before <= at + skew && not_after >= at - skew
}
