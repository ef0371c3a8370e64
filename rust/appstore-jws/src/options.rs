// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::environment::Environment;

/// Configuration for [`crate::SignedDataVerifier`].
#[derive(Debug, Clone)]
pub struct SignedDataVerifierOptions {
    /// DER-encoded Apple root certificates to pin.
    pub root_certificates: Vec<Vec<u8>>,
    /// Query OCSP and validate chains against the current time. When off,
    /// chains are validated as of the payload's own signing date.
    pub enable_online_checks: bool,
    pub environment: Environment,
    pub bundle_id: String,
    /// Required for [`Environment::Production`].
    pub app_apple_id: Option<i64>,
}

impl SignedDataVerifierOptions {
    pub fn new(
        root_certificates: Vec<Vec<u8>>,
        environment: Environment,
        bundle_id: impl Into<String>,
    ) -> Self {
        Self {
            root_certificates,
            enable_online_checks: true,
            environment,
            bundle_id: bundle_id.into(),
            app_apple_id: None,
        }
    }

    pub fn with_online_checks(mut self, enabled: bool) -> Self {
        self.enable_online_checks = enabled;
        self
    }

    pub fn with_app_apple_id(mut self, app_apple_id: i64) -> Self {
        self.app_apple_id = Some(app_apple_id);
        self
    }
}
