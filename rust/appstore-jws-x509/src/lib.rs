// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate chain validation for App Store signed data.
//!
//! The chain is always leaf + intermediate delivered in the token, anchored
//! to one of a fixed set of pinned roots. Revocation is checked over OCSP
//! when online checks are enabled.

pub mod certificate;
pub mod chain;
pub mod clock;
pub mod ocsp;
pub mod transport;

pub use certificate::{CertificateError, ParsedCertificate};
pub use chain::{
    ChainError, ChainVerifier, FailureKind, INTERMEDIATE_MARKER_OID, LEAF_MARKER_OID,
};
pub use clock::{unix_seconds, Clock, SystemClock, MAX_SKEW};
pub use ocsp::{OcspChecker, OcspError};
pub use transport::{OcspTransport, TransportError, UreqOcspTransport, OCSP_REQUEST_CONTENT_TYPE};
