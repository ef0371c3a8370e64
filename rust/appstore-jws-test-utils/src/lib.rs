// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test-only fixtures for App Store signed-data verification.
//!
//! Everything here is generated at test time: a P-384 root and intermediate
//! and a P-256 leaf carrying the platform marker extensions, compact tokens
//! signed by that leaf, and an in-process OCSP responder that answers real
//! DER requests with signed responses.

pub mod clock;
pub mod ocsp;
pub mod pki;
pub mod token;

pub use clock::MockClock;
pub use ocsp::{MockCertStatus, MockOcspResponder, ResponderScenario};
pub use pki::{Issued, PkiBuilder, TestPki, TestSigner};
pub use token::{sign_token, unsigned_token, x5c_header};
