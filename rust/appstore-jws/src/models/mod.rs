// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoded payload models.
//!
//! Field names follow the App Store JSON (camelCase). Every known field is
//! optional unless the payload kind requires it, and unknown fields are
//! carried in `extra` so re-serializing reproduces the received JSON.
//! A known field may be absent but never `null`.

use serde::{Deserialize, Deserializer};

mod app_transaction;
mod notification;
mod realtime_request;
mod renewal_info;
mod transaction;

pub use app_transaction::AppTransaction;
pub use notification::{
    AppData, ExternalPurchaseToken, NotificationData, NotificationIdentity,
    ResponseBodyV2DecodedPayload, Summary,
};
pub use realtime_request::DecodedRealtimeRequestBody;
pub use renewal_info::JwsRenewalInfoDecodedPayload;
pub use transaction::JwsTransactionDecodedPayload;

/// `deserialize_with` for optional fields: absence is handled by
/// `#[serde(default)]`, an explicit `null` fails like any other wrong type.
pub(crate) fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
