// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use der::asn1::{Int, OctetString};
use der::{AnyRef, Decode, Encode, Header, Length, Tag};
use sha2::{Digest, Sha256};
use x509_cert::certificate::Version;
use x509_cert::spki::AlgorithmIdentifierOwned;

use super::asn1::{CertId, OcspRequest, Request, TbsRequest, ID_SHA256};
use crate::certificate::ParsedCertificate;

impl CertId {
    /// SHA-256 `CertID` for `subject` as issued by `issuer`.
    pub fn for_certificate(
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
    ) -> der::Result<Self> {
        Ok(CertId {
            hash_algorithm: AlgorithmIdentifierOwned {
                oid: ID_SHA256,
                parameters: Some(AnyRef::NULL.into()),
            },
            issuer_name_hash: OctetString::new(Sha256::digest(&issuer.subject_raw).to_vec())?,
            issuer_key_hash: OctetString::new(Sha256::digest(&issuer.public_key_bits).to_vec())?,
            serial_number: serial_from_content(&subject.serial)?,
        })
    }

    /// Same certificate under the same hash algorithm.
    ///
    /// Algorithm parameters are ignored: responders disagree on whether
    /// SHA-2 identifiers carry an explicit NULL.
    pub fn identifies_same_certificate(&self, other: &CertId) -> bool {
        self.hash_algorithm.oid == other.hash_algorithm.oid
            && self.issuer_name_hash == other.issuer_name_hash
            && self.issuer_key_hash == other.issuer_key_hash
            && self.serial_number == other.serial_number
    }
}

/// Unsigned single-certificate request without nonce.
pub fn encode_request(cert_id: &CertId) -> der::Result<Vec<u8>> {
    OcspRequest {
        tbs_request: TbsRequest {
            version: Version::V1,
            requestor_name: None,
            request_list: vec![Request {
                req_cert: cert_id.clone(),
                single_request_extensions: None,
            }],
            request_extensions: None,
        },
        optional_signature: None,
    }
    .to_der()
}

// The serial is kept as the certificate's own INTEGER content octets so the
// request echoes it exactly.
fn serial_from_content(content: &[u8]) -> der::Result<Int> {
    let mut tlv = Header::new(Tag::Integer, Length::try_from(content.len())?)?.to_der()?;
    tlv.extend_from_slice(content);
    Int::from_der(&tlv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_keeps_content_octets() {
        let serial = serial_from_content(&[0x00, 0x9a, 0x01]).unwrap();
        assert_eq!(serial.as_bytes(), &[0x00, 0x9a, 0x01]);
    }

    #[test]
    fn request_round_trips() {
        let id = CertId {
            hash_algorithm: AlgorithmIdentifierOwned {
                oid: ID_SHA256,
                parameters: None,
            },
            issuer_name_hash: OctetString::new(vec![1; 32]).unwrap(),
            issuer_key_hash: OctetString::new(vec![2; 32]).unwrap(),
            serial_number: serial_from_content(&[0x05]).unwrap(),
        };
        let der = encode_request(&id).unwrap();
        let decoded = OcspRequest::from_der(&der).unwrap();
        assert_eq!(decoded.tbs_request.request_list.len(), 1);
        assert!(decoded.tbs_request.request_list[0].req_cert.identifies_same_certificate(&id));
    }
}
