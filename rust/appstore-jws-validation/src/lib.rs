// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Public-key signature verification for App Store signed data.
//!
//! Two signature encodings meet here:
//! - JWS signatures (`ES256`/`ES384` as raw `r || s`, `RS256`).
//! - X.509 and OCSP signatures, identified by algorithm OID, with ECDSA
//!   signatures in DER form.

pub mod algorithms;
pub mod error;
pub mod public_key;

pub use algorithms::{DigestAlgorithm, JwsAlgorithm, SignatureAlgorithm};
pub use error::{KeyError, SignatureError};
pub use public_key::{KeyType, PublicKey};
