// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::non_null;
use crate::environment::Environment;
use crate::payload::{PayloadKind, SignedPayload};

/// App Store Server Notifications V2 envelope (`signedPayload`).
///
/// The nested `data`, `summary`, `externalPurchaseToken` and `appData`
/// objects are mutually exclusive in practice. See
/// [`ResponseBodyV2DecodedPayload::identity`] for how the verifier picks one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBodyV2DecodedPayload {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(rename = "notificationUUID", default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub notification_uuid: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub signed_date: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub external_purchase_token: Option<ExternalPurchaseToken>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_data: Option<AppData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The app identity a notification claims to be about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationIdentity {
    pub app_apple_id: Option<i64>,
    pub bundle_id: Option<String>,
    pub environment: Option<Environment>,
}

impl ResponseBodyV2DecodedPayload {
    /// Identity taken from the first present of `data`, `summary`,
    /// `externalPurchaseToken` and `appData`, in that order. Empty when none
    /// is present.
    pub fn identity(&self) -> NotificationIdentity {
        if let Some(data) = &self.data {
            NotificationIdentity {
                app_apple_id: data.app_apple_id,
                bundle_id: data.bundle_id.clone(),
                environment: data.environment.clone(),
            }
        } else if let Some(summary) = &self.summary {
            NotificationIdentity {
                app_apple_id: summary.app_apple_id,
                bundle_id: summary.bundle_id.clone(),
                environment: summary.environment.clone(),
            }
        } else if let Some(token) = &self.external_purchase_token {
            NotificationIdentity {
                app_apple_id: token.app_apple_id,
                bundle_id: token.bundle_id.clone(),
                environment: Some(token.environment()),
            }
        } else if let Some(app_data) = &self.app_data {
            NotificationIdentity {
                app_apple_id: app_data.app_apple_id,
                bundle_id: app_data.bundle_id.clone(),
                environment: app_data.environment.clone(),
            }
        } else {
            NotificationIdentity::default()
        }
    }
}

impl SignedPayload for ResponseBodyV2DecodedPayload {
    const KIND: PayloadKind = PayloadKind::Notification;

    fn signed_at_millis(&self) -> Option<i64> {
        self.signed_date
    }
}

/// Subscription or purchase data carried by most notification types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_apple_id: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_version: Option<String>,
    /// Still-signed `JWSTransaction`; verify it separately.
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub signed_transaction_info: Option<String>,
    /// Still-signed `JWSRenewalInfo`; verify it separately.
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub signed_renewal_info: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub consumption_request_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result summary of a mass subscription-renewal-date extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_apple_id: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub request_identifier: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub storefront_country_codes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub succeeded_count: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// External purchase token notification payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPurchaseToken {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub external_purchase_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub token_creation_date: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_apple_id: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExternalPurchaseToken {
    /// The token carries no environment field; sandbox ids are prefixed.
    pub fn environment(&self) -> Environment {
        match &self.external_purchase_id {
            Some(id) if id.starts_with("SANDBOX") => Environment::Sandbox,
            _ => Environment::Production,
        }
    }
}

/// App metadata notification payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub app_apple_id: Option<i64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub signed_app_transaction_info: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
