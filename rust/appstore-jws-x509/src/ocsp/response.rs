// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use der::{Decode, Encode};
use sha1::{Digest, Sha1};

use super::asn1::{BasicOcspResponse, OcspResponse, OcspResponseStatus, ResponderId, ResponseData, ID_PKIX_OCSP_BASIC};
use super::OcspError;
use crate::certificate::ParsedCertificate;

/// A successful basic OCSP response, decoded but not yet trusted.
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    pub basic: BasicOcspResponse,
    pub data: ResponseData,
    /// Exact `ResponseData` encoding covered by the signature.
    pub tbs_der: Vec<u8>,
    pub certs: Vec<ParsedCertificate>,
}

impl DecodedResponse {
    pub fn from_der(bytes: &[u8]) -> Result<Self, OcspError> {
        let response = OcspResponse::from_der(bytes).map_err(OcspError::Malformed)?;
        if response.response_status != OcspResponseStatus::Successful {
            return Err(OcspError::UnsuccessfulStatus(response.response_status));
        }

        let response_bytes = response.response_bytes.ok_or(OcspError::MissingResponseBytes)?;
        if response_bytes.response_type != ID_PKIX_OCSP_BASIC {
            return Err(OcspError::UnsupportedResponseType(
                response_bytes.response_type.to_string(),
            ));
        }

        let basic = BasicOcspResponse::from_der(response_bytes.response.as_bytes())
            .map_err(OcspError::Malformed)?;
        let tbs_der = basic.tbs_response_data.to_der().map_err(OcspError::Malformed)?;
        let data = ResponseData::from_der(&tbs_der).map_err(OcspError::Malformed)?;

        let certs = match &basic.certs {
            Some(certs) => certs
                .iter()
                .map(|any| {
                    let der = any.to_der().map_err(OcspError::Malformed)?;
                    ParsedCertificate::from_der(&der).map_err(OcspError::EmbeddedCertificate)
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            basic,
            data,
            tbs_der,
            certs,
        })
    }

    /// Find the responder certificate among `issuer` and the embedded certificates.
    pub fn find_signer<'a>(
        &'a self,
        issuer: &'a ParsedCertificate,
    ) -> Result<&'a ParsedCertificate, OcspError> {
        let mut candidates = std::iter::once(issuer).chain(self.certs.iter());

        let found = match &self.data.responder_id {
            ResponderId::ByKey(hash) => candidates
                .find(|c| &Sha1::digest(&c.public_key_bits)[..] == hash.as_bytes()),
            ResponderId::ByName(name) => {
                let name_der = name.to_der().map_err(OcspError::Malformed)?;
                candidates.find(|c| c.subject_raw == name_der)
            }
        };

        found.ok_or(OcspError::ResponderNotFound)
    }
}
