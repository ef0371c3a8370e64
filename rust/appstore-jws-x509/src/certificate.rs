// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Owned view of an X.509 certificate.
//!
//! Only the fields chain validation and OCSP need are extracted; the raw DER
//! is kept so callers can hash or compare certificates byte-for-byte.

use appstore_jws_validation::{KeyError, PublicKey, SignatureAlgorithm, SignatureError};
use thiserror::Error;
use x509_parser::prelude::*;

const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate_parse_failed: {0}")]
    Parse(String),

    #[error("certificate_trailing_data")]
    TrailingData,

    #[error("certificate_key_unsupported: {0}")]
    Key(#[from] KeyError),

    #[error("certificate_outside_validity: {subject}")]
    OutsideValidity { subject: String },
}

#[derive(Debug, Clone)]
pub struct ParsedCertificate {
    pub der: Vec<u8>,
    /// DER-encoded subject `Name`.
    pub subject_raw: Vec<u8>,
    /// DER-encoded issuer `Name`.
    pub issuer_raw: Vec<u8>,
    pub subject: String,
    /// Content octets of the serial number INTEGER.
    pub serial: Vec<u8>,
    pub spki_der: Vec<u8>,
    /// The `subjectPublicKey` BIT STRING contents.
    pub public_key_bits: Vec<u8>,
    pub tbs_der: Vec<u8>,
    pub signature_oid: String,
    pub signature: Vec<u8>,
    pub not_before: i64,
    pub not_after: i64,
    pub is_ca: bool,
    pub extension_oids: Vec<String>,
    /// First OCSP access location from Authority Information Access.
    pub ocsp_url: Option<String>,
    pub ocsp_signing: bool,
}

impl ParsedCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (rem, cert) =
            parse_x509_certificate(der).map_err(|e| CertificateError::Parse(e.to_string()))?;
        if !rem.is_empty() {
            return Err(CertificateError::TrailingData);
        }

        let mut is_ca = false;
        let mut ocsp_signing = false;
        let mut ocsp_url = None;
        let mut extension_oids = Vec::new();

        for ext in cert.extensions() {
            extension_oids.push(ext.oid.to_id_string());
            match ext.parsed_extension() {
                ParsedExtension::BasicConstraints(bc) => is_ca = bc.ca,
                ParsedExtension::ExtendedKeyUsage(eku) => ocsp_signing = eku.ocsp_signing,
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    ocsp_url = aia
                        .accessdescs
                        .iter()
                        .filter(|d| d.access_method.to_id_string() == OID_AD_OCSP)
                        .find_map(|d| match &d.access_location {
                            GeneralName::URI(uri) => Some(uri.to_string()),
                            _ => None,
                        });
                }
                _ => {}
            }
        }

        Ok(Self {
            der: der.to_vec(),
            subject_raw: cert.subject().as_raw().to_vec(),
            issuer_raw: cert.issuer().as_raw().to_vec(),
            subject: cert.subject().to_string(),
            serial: cert.raw_serial().to_vec(),
            spki_der: cert.tbs_certificate.subject_pki.raw.to_vec(),
            public_key_bits: cert.tbs_certificate.subject_pki.subject_public_key.data.to_vec(),
            tbs_der: cert.tbs_certificate.as_ref().to_vec(),
            signature_oid: cert.signature_algorithm.algorithm.to_id_string(),
            signature: cert.signature_value.data.to_vec(),
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            is_ca,
            extension_oids,
            ocsp_url,
            ocsp_signing,
        })
    }

    pub fn public_key(&self) -> Result<PublicKey, CertificateError> {
        Ok(PublicKey::from_spki_der(&self.spki_der)?)
    }

    pub fn has_extension(&self, oid: &str) -> bool {
        self.extension_oids.iter().any(|o| o == oid)
    }

    /// Check this certificate's signature under `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<(), SignatureError> {
        let algorithm = SignatureAlgorithm::from_oid(&self.signature_oid)?;
        issuer_key.verify_signature(algorithm, &self.tbs_der, &self.signature)
    }

    /// Issuer name matches `issuer`'s subject and the signature verifies.
    pub fn is_issued_by(&self, issuer: &ParsedCertificate) -> bool {
        if self.issuer_raw != issuer.subject_raw {
            return false;
        }
        match issuer.public_key() {
            Ok(key) => self.verify_signed_by(&key).is_ok(),
            Err(_) => false,
        }
    }

    pub fn check_validity_at(&self, at: std::time::SystemTime) -> Result<(), CertificateError> {
        if crate::clock::within_window(self.not_before, self.not_after, at) {
            Ok(())
        } else {
            Err(CertificateError::OutsideValidity {
                subject: self.subject.clone(),
            })
        }
    }
}
