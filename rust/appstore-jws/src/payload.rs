// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// The payload kinds the verifier understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadKind {
    Transaction,
    RenewalInfo,
    Notification,
    AppTransaction,
    RealtimeRequest,
}

/// A decoded payload type.
///
/// Deserializing into the typed model is the shape check: a payload whose
/// known fields have the wrong JSON types is rejected before any
/// cryptographic work is done.
pub trait SignedPayload: DeserializeOwned + Send + Sized {
    const KIND: PayloadKind;

    /// Milliseconds since the epoch at which the payload claims to have
    /// been signed.
    fn signed_at_millis(&self) -> Option<i64>;

    fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Effective date for offline chain validation; `now` when the payload
    /// carries no date. `None` if the date is not representable.
    fn signed_at(&self, now: SystemTime) -> Option<SystemTime> {
        match self.signed_at_millis() {
            None => Some(now),
            Some(ms) if ms >= 0 => UNIX_EPOCH.checked_add(Duration::from_millis(ms as u64)),
            Some(ms) => UNIX_EPOCH.checked_sub(Duration::from_millis(ms.unsigned_abs())),
        }
    }
}
