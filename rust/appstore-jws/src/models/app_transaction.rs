// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::non_null;
use crate::environment::Environment;
use crate::payload::{PayloadKind, SignedPayload};

/// Information about the app's original purchase (`AppTransaction`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTransaction {
    /// Environment the receipt was issued in.
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<Environment>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_apple_id: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub version_external_identifier: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub receipt_creation_date: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub original_purchase_date: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub original_application_version: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub device_verification: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub device_verification_nonce: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub preorder_date: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignedPayload for AppTransaction {
    const KIND: PayloadKind = PayloadKind::AppTransaction;

    // App transactions carry no signedDate; the receipt creation date stands in.
    fn signed_at_millis(&self) -> Option<i64> {
        self.receipt_creation_date
    }
}
