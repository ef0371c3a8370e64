// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::SignatureError;

const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const OID_SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const OID_SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
const OID_ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const OID_ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const OID_ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
        }
    }
}

/// Signature algorithm of an X.509 certificate or OCSP response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// ECDSA with a DER-encoded `Ecdsa-Sig-Value`.
    Ecdsa(DigestAlgorithm),
    /// RSASSA-PKCS1-v1_5.
    RsaPkcs1(DigestAlgorithm),
}

impl SignatureAlgorithm {
    /// Map a dotted algorithm OID (e.g. `1.2.840.10045.4.3.2`).
    pub fn from_oid(oid: &str) -> Result<Self, SignatureError> {
        match oid {
            OID_SHA256_WITH_RSA => Ok(Self::RsaPkcs1(DigestAlgorithm::Sha256)),
            OID_SHA384_WITH_RSA => Ok(Self::RsaPkcs1(DigestAlgorithm::Sha384)),
            OID_SHA512_WITH_RSA => Ok(Self::RsaPkcs1(DigestAlgorithm::Sha512)),
            OID_ECDSA_WITH_SHA256 => Ok(Self::Ecdsa(DigestAlgorithm::Sha256)),
            OID_ECDSA_WITH_SHA384 => Ok(Self::Ecdsa(DigestAlgorithm::Sha384)),
            OID_ECDSA_WITH_SHA512 => Ok(Self::Ecdsa(DigestAlgorithm::Sha512)),
            other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn digest(self) -> DigestAlgorithm {
        match self {
            Self::Ecdsa(d) | Self::RsaPkcs1(d) => d,
        }
    }
}

/// JWS `alg` values accepted for the outer token signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JwsAlgorithm {
    /// ECDSA P-256 with SHA-256.
    ES256,
    /// ECDSA P-384 with SHA-384.
    ES384,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
}

impl JwsAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            JwsAlgorithm::ES256 => "ES256",
            JwsAlgorithm::ES384 => "ES384",
            JwsAlgorithm::RS256 => "RS256",
        }
    }
}

impl FromStr for JwsAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ES256" => Ok(JwsAlgorithm::ES256),
            "ES384" => Ok(JwsAlgorithm::ES384),
            "RS256" => Ok(JwsAlgorithm::RS256),
            other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
