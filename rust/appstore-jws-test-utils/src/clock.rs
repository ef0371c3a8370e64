// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use appstore_jws_x509::Clock;
use parking_lot::Mutex;

/// Settable clock.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<SystemTime>,
}

impl MockClock {
    pub fn at(now: SystemTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn at_millis(millis: u64) -> Self {
        Self::at(UNIX_EPOCH + Duration::from_millis(millis))
    }

    pub fn set(&self, now: SystemTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn advances_are_shared_across_threads() {
        let clock = Arc::new(MockClock::at_millis(1_000));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                thread::spawn(move || clock.advance(Duration::from_secs(1)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(clock.now(), UNIX_EPOCH + Duration::from_millis(5_000));

        clock.set(UNIX_EPOCH);
        assert_eq!(clock.now(), UNIX_EPOCH);
    }
}
