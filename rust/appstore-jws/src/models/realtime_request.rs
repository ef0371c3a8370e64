// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::environment::Environment;
use crate::payload::{PayloadKind, SignedPayload};

/// Retention Messaging realtime request. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedRealtimeRequestBody {
    pub original_transaction_id: String,
    pub app_apple_id: i64,
    pub product_id: String,
    pub user_locale: String,
    pub request_identifier: String,
    pub signed_date: i64,
    pub environment: Environment,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignedPayload for DecodedRealtimeRequestBody {
    const KIND: PayloadKind = PayloadKind::RealtimeRequest;

    fn signed_at_millis(&self) -> Option<i64> {
        Some(self.signed_date)
    }
}
