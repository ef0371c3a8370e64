// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::error::Error as StdError;
use std::fmt;

use appstore_jws_x509::CertificateError;
use thiserror::Error;

/// Why a token was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// Not a 3-segment token, bad base64url/JSON, or the payload has the wrong shape.
    StructuralFailure,
    /// `x5c` does not hold exactly leaf and intermediate.
    InvalidChainLength,
    /// A certificate is malformed or outside its validity window, or an OCSP
    /// responder could not be identified or trusted.
    InvalidCertificate,
    /// A chain signature, trust marker or revocation check failed.
    ChainVerificationFailure,
    /// The token signature does not verify under the leaf key.
    OuterSignatureFailure,
    InvalidAppIdentifier,
    InvalidEnvironment,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::StructuralFailure => "structural_failure",
            VerificationStatus::InvalidChainLength => "invalid_chain_length",
            VerificationStatus::InvalidCertificate => "invalid_certificate",
            VerificationStatus::ChainVerificationFailure => "chain_verification_failure",
            VerificationStatus::OuterSignatureFailure => "outer_signature_failure",
            VerificationStatus::InvalidAppIdentifier => "invalid_app_identifier",
            VerificationStatus::InvalidEnvironment => "invalid_environment",
        };
        f.write_str(s)
    }
}

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// A failed verification.
///
/// `status` is the only signal callers should branch on. The lower-level
/// error, when there is one, is available through [`StdError::source`].
#[derive(Debug)]
pub struct VerificationError {
    status: VerificationStatus,
    cause: Option<Cause>,
}

impl VerificationError {
    pub(crate) fn new(status: VerificationStatus) -> Self {
        Self { status, cause: None }
    }

    pub(crate) fn with_cause(status: VerificationStatus, cause: impl Into<Cause>) -> Self {
        Self {
            status,
            cause: Some(cause.into()),
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "verification_failed: {}: {cause}", self.status),
            None => write!(f, "verification_failed: {}", self.status),
        }
    }
}

impl StdError for VerificationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Invalid verifier configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("app_apple_id is required when the environment is Production")]
    MissingAppAppleId,

    #[error("trusted root certificate {index} is invalid: {source}")]
    InvalidRootCertificate {
        index: usize,
        #[source]
        source: CertificateError,
    },
}
