// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Leaf -> intermediate -> pinned root validation.
//!
//! Every sub-check must pass; the first failure ends validation and nothing
//! is partially trusted. Revocation is only consulted when a [`OcspChecker`]
//! has been attached.

use std::time::SystemTime;

use appstore_jws_validation::PublicKey;
use futures::future::try_join;
use thiserror::Error;
use tracing::{debug, warn};

use crate::certificate::{CertificateError, ParsedCertificate};
use crate::ocsp::{OcspChecker, OcspError};

/// Extension present on every App Store receipt-signing leaf.
pub const LEAF_MARKER_OID: &str = "1.2.840.113635.100.6.11.1";

/// Extension present on the Apple WWDR intermediate.
pub const INTERMEDIATE_MARKER_OID: &str = "1.2.840.113635.100.6.2.1";

/// How a chain failure is reported upward.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// A certificate is malformed, expired, or an OCSP responder is not trustworthy.
    InvalidCertificate,
    /// A signature, trust marker or revocation status check failed.
    ChainVerification,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error("intermediate_not_issued_by_trusted_root")]
    UntrustedIntermediate,

    #[error("leaf_not_issued_by_intermediate")]
    LeafNotIssuedByIntermediate,

    #[error("intermediate_not_ca")]
    IntermediateNotCa,

    #[error("missing_trust_marker: {certificate} lacks {oid}")]
    MissingMarker {
        certificate: &'static str,
        oid: &'static str,
    },

    #[error("revocation_check_failed: {0}")]
    Revocation(#[from] OcspError),
}

impl ChainError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ChainError::Certificate(_) => FailureKind::InvalidCertificate,
            ChainError::Revocation(e) => e.kind(),
            _ => FailureKind::ChainVerification,
        }
    }
}

#[derive(Debug)]
pub struct ChainVerifier {
    trusted_roots: Vec<ParsedCertificate>,
    revocation: Option<OcspChecker>,
}

impl ChainVerifier {
    pub fn new(trusted_roots: Vec<ParsedCertificate>) -> Self {
        Self {
            trusted_roots,
            revocation: None,
        }
    }

    /// Enable OCSP checks for both links of every validated chain.
    pub fn with_revocation(mut self, checker: OcspChecker) -> Self {
        self.revocation = Some(checker);
        self
    }

    pub fn trusted_roots(&self) -> &[ParsedCertificate] {
        &self.trusted_roots
    }

    pub fn checks_revocation(&self) -> bool {
        self.revocation.is_some()
    }

    /// Validate `leaf` and `intermediate` against the pinned roots at
    /// `effective_date` and return the leaf's public key.
    pub async fn verify(
        &self,
        leaf: &ParsedCertificate,
        intermediate: &ParsedCertificate,
        effective_date: SystemTime,
    ) -> Result<PublicKey, ChainError> {
        let root = self
            .trusted_roots
            .iter()
            .find(|root| intermediate.is_issued_by(root))
            .ok_or_else(|| {
                warn!(intermediate = %intermediate.subject, "no trusted root issued the intermediate");
                ChainError::UntrustedIntermediate
            })?;

        if !leaf.is_issued_by(intermediate) {
            warn!(leaf = %leaf.subject, "leaf is not issued by the intermediate");
            return Err(ChainError::LeafNotIssuedByIntermediate);
        }

        if !intermediate.is_ca {
            return Err(ChainError::IntermediateNotCa);
        }

        if !leaf.has_extension(LEAF_MARKER_OID) {
            return Err(ChainError::MissingMarker {
                certificate: "leaf",
                oid: LEAF_MARKER_OID,
            });
        }
        if !intermediate.has_extension(INTERMEDIATE_MARKER_OID) {
            return Err(ChainError::MissingMarker {
                certificate: "intermediate",
                oid: INTERMEDIATE_MARKER_OID,
            });
        }

        leaf.check_validity_at(effective_date)?;
        intermediate.check_validity_at(effective_date)?;
        root.check_validity_at(effective_date)?;

        if let Some(checker) = &self.revocation {
            debug!(leaf = %leaf.subject, "checking revocation status of chain");
            try_join(checker.check(leaf, intermediate), checker.check(intermediate, root))
                .await
                .map_err(|e| {
                    warn!(error = %e, "revocation check failed");
                    e
                })?;
        }

        Ok(leaf.public_key()?)
    }
}
