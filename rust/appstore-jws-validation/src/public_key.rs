// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verifying keys recovered from SubjectPublicKeyInfo.
//!
//! The key type is detected by trying each supported decoder in turn; the
//! SPKI algorithm identifier makes the decoders mutually exclusive.

use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1v15;
use rsa::RsaPublicKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier;
use signature::Verifier;

use crate::algorithms::{DigestAlgorithm, JwsAlgorithm, SignatureAlgorithm};
use crate::error::{KeyError, SignatureError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyType {
    EcP256,
    EcP384,
    Rsa,
}

#[derive(Debug, Clone)]
enum KeyMaterial {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    Rsa(RsaPublicKey),
}

/// A parsed public key together with the SPKI it came from.
///
/// Equality compares the SPKI bytes.
#[derive(Debug, Clone)]
pub struct PublicKey {
    spki_der: Vec<u8>,
    material: KeyMaterial,
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.spki_der == other.spki_der
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    pub fn from_spki_der(spki_der: &[u8]) -> Result<Self, KeyError> {
        let material = if let Ok(k) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
            KeyMaterial::P256(k)
        } else if let Ok(k) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
            KeyMaterial::P384(k)
        } else if let Ok(k) = RsaPublicKey::from_public_key_der(spki_der) {
            KeyMaterial::Rsa(k)
        } else {
            return Err(KeyError::UnsupportedKey);
        };

        Ok(Self {
            spki_der: spki_der.to_vec(),
            material,
        })
    }

    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    pub fn key_type(&self) -> KeyType {
        match self.material {
            KeyMaterial::P256(_) => KeyType::EcP256,
            KeyMaterial::P384(_) => KeyType::EcP384,
            KeyMaterial::Rsa(_) => KeyType::Rsa,
        }
    }

    /// Verify an X.509-style signature (certificate, OCSP response).
    ///
    /// ECDSA signatures are DER encoded. The digest comes from `algorithm`,
    /// not from the curve.
    pub fn verify_signature(
        &self,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        match (algorithm, &self.material) {
            (SignatureAlgorithm::Ecdsa(digest), KeyMaterial::P256(vk)) => {
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| SignatureError::Malformed(e.to_string()))?;
                vk.verify_prehash(&digest.digest(message), &sig)
                    .map_err(|_| SignatureError::Invalid)
            }
            (SignatureAlgorithm::Ecdsa(digest), KeyMaterial::P384(vk)) => {
                let sig = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|e| SignatureError::Malformed(e.to_string()))?;
                vk.verify_prehash(&digest.digest(message), &sig)
                    .map_err(|_| SignatureError::Invalid)
            }
            (SignatureAlgorithm::RsaPkcs1(digest), KeyMaterial::Rsa(key)) => {
                verify_rsa_pkcs1(key, digest, message, signature)
            }
            (algorithm, _) => Err(SignatureError::KeyMismatch {
                algorithm: format!("{algorithm:?}"),
                key_type: self.key_type(),
            }),
        }
    }

    /// Verify a JWS signature over the ASCII signing input.
    ///
    /// ECDSA signatures are the fixed-width `r || s` concatenation.
    pub fn verify_jws(
        &self,
        algorithm: JwsAlgorithm,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        match (algorithm, &self.material) {
            (JwsAlgorithm::ES256, KeyMaterial::P256(vk)) => {
                let sig = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| SignatureError::Malformed(e.to_string()))?;
                vk.verify(signing_input, &sig).map_err(|_| SignatureError::Invalid)
            }
            (JwsAlgorithm::ES384, KeyMaterial::P384(vk)) => {
                let sig = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| SignatureError::Malformed(e.to_string()))?;
                vk.verify(signing_input, &sig).map_err(|_| SignatureError::Invalid)
            }
            (JwsAlgorithm::RS256, KeyMaterial::Rsa(key)) => {
                verify_rsa_pkcs1(key, DigestAlgorithm::Sha256, signing_input, signature)
            }
            (algorithm, _) => Err(SignatureError::KeyMismatch {
                algorithm: algorithm.to_string(),
                key_type: self.key_type(),
            }),
        }
    }
}

fn verify_rsa_pkcs1(
    key: &RsaPublicKey,
    digest: DigestAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let sig = pkcs1v15::Signature::try_from(signature)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;

    let result = match digest {
        DigestAlgorithm::Sha256 => pkcs1v15::VerifyingKey::<Sha256>::new(key.clone()).verify(message, &sig),
        DigestAlgorithm::Sha384 => pkcs1v15::VerifyingKey::<Sha384>::new(key.clone()).verify(message, &sig),
        DigestAlgorithm::Sha512 => pkcs1v15::VerifyingKey::<Sha512>::new(key.clone()).verify(message, &sig),
    };
    result.map_err(|_| SignatureError::Invalid)
}
