// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OCSP revocation checking (RFC 6960).
//!
//! One check covers one (subject, issuer) link:
//! - locate the responder from the subject's Authority Information Access
//! - POST a SHA-256 `CertID` request
//! - identify and trust the response signer, then verify its signature
//! - require a fresh `good` entry for the subject
//!
//! There is no soft-fail: anything short of a verified `good` entry is an error.

pub mod asn1;
pub mod request;
pub mod response;

use std::fmt;
use std::sync::Arc;

use appstore_jws_validation::{SignatureAlgorithm, SignatureError};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::certificate::{CertificateError, ParsedCertificate};
use crate::chain::FailureKind;
use crate::clock::{unix_seconds, Clock, MAX_SKEW};
use crate::transport::{OcspTransport, TransportError, OCSP_REQUEST_CONTENT_TYPE};

use self::asn1::{CertId, CertStatus, CrlReason, OcspResponseStatus};
use self::request::encode_request;
use self::response::DecodedResponse;

#[derive(Debug, Error)]
pub enum OcspError {
    #[error("ocsp_url_missing")]
    MissingResponderUrl,

    #[error("ocsp_url_invalid: {0}")]
    InvalidResponderUrl(String),

    #[error("ocsp_request_encode_failed: {0}")]
    Encode(#[source] der::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("ocsp_response_malformed: {0}")]
    Malformed(#[source] der::Error),

    #[error("ocsp_response_status: {0:?}")]
    UnsuccessfulStatus(OcspResponseStatus),

    #[error("ocsp_response_bytes_missing")]
    MissingResponseBytes,

    #[error("ocsp_response_type_unsupported: {0}")]
    UnsupportedResponseType(String),

    #[error("ocsp_embedded_certificate_invalid: {0}")]
    EmbeddedCertificate(#[source] CertificateError),

    #[error("ocsp_responder_not_found")]
    ResponderNotFound,

    #[error("ocsp_responder_not_issued_by_issuer")]
    UntrustedResponder,

    #[error("ocsp_responder_missing_ocsp_signing_eku")]
    ResponderNotOcspSigner,

    #[error("ocsp_responder_invalid: {0}")]
    ResponderCertificate(#[source] CertificateError),

    #[error("ocsp_signature_invalid: {0}")]
    Signature(#[source] SignatureError),

    #[error("ocsp_certificate_revoked: {0:?}")]
    Revoked(Option<CrlReason>),

    #[error("ocsp_certificate_status_unknown")]
    UnknownStatus,

    #[error("ocsp_response_not_yet_valid")]
    NotYetValid,

    #[error("ocsp_response_stale")]
    Stale,

    #[error("ocsp_no_matching_response")]
    NoMatchingResponse,
}

impl OcspError {
    pub fn kind(&self) -> FailureKind {
        match self {
            OcspError::MissingResponderUrl
            | OcspError::InvalidResponderUrl(_)
            | OcspError::EmbeddedCertificate(_)
            | OcspError::ResponderNotFound
            | OcspError::UntrustedResponder
            | OcspError::ResponderNotOcspSigner
            | OcspError::ResponderCertificate(_) => FailureKind::InvalidCertificate,
            _ => FailureKind::ChainVerification,
        }
    }
}

/// Performs OCSP checks through a pluggable transport.
#[derive(Clone)]
pub struct OcspChecker {
    transport: Arc<dyn OcspTransport>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for OcspChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcspChecker").field("clock", &self.clock).finish_non_exhaustive()
    }
}

impl OcspChecker {
    pub fn new(transport: Arc<dyn OcspTransport>, clock: Arc<dyn Clock>) -> Self {
        Self { transport, clock }
    }

    /// Check that `subject` (issued by `issuer`) is not revoked.
    pub async fn check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
    ) -> Result<(), OcspError> {
        let url = responder_url(subject)?;
        let cert_id = CertId::for_certificate(subject, issuer).map_err(OcspError::Encode)?;
        let request = encode_request(&cert_id).map_err(OcspError::Encode)?;

        debug!(
            responder = %url,
            subject = %subject.subject,
            serial = %hex::encode(&subject.serial),
            "sending OCSP request"
        );
        let body = self
            .transport
            .post(url.as_str(), OCSP_REQUEST_CONTENT_TYPE, request)
            .await?;

        let response = DecodedResponse::from_der(&body)?;
        let signer = response.find_signer(issuer)?;
        self.trust_signer(signer, issuer)?;

        let algorithm = SignatureAlgorithm::from_oid(&response.basic.signature_algorithm.oid.to_string())
            .map_err(OcspError::Signature)?;
        let signature = response
            .basic
            .signature
            .as_bytes()
            .ok_or_else(|| {
                OcspError::Signature(SignatureError::Malformed("signature has unused bits".to_string()))
            })?;
        signer
            .public_key()
            .map_err(OcspError::ResponderCertificate)?
            .verify_signature(algorithm, &response.tbs_der, signature)
            .map_err(OcspError::Signature)?;

        self.check_status(&response, &cert_id)
    }

    fn trust_signer(
        &self,
        signer: &ParsedCertificate,
        issuer: &ParsedCertificate,
    ) -> Result<(), OcspError> {
        if signer.subject_raw == issuer.subject_raw && signer.public_key_bits == issuer.public_key_bits {
            return Ok(());
        }

        let issuer_key = issuer.public_key().map_err(OcspError::ResponderCertificate)?;
        if signer.verify_signed_by(&issuer_key).is_err() {
            return Err(OcspError::UntrustedResponder);
        }
        if !signer.ocsp_signing {
            return Err(OcspError::ResponderNotOcspSigner);
        }
        signer
            .check_validity_at(self.clock.now())
            .map_err(OcspError::ResponderCertificate)
    }

    fn check_status(&self, response: &DecodedResponse, cert_id: &CertId) -> Result<(), OcspError> {
        let single = response
            .data
            .responses
            .iter()
            .find(|r| r.cert_id.identifies_same_certificate(cert_id))
            .ok_or(OcspError::NoMatchingResponse)?;

        match &single.cert_status {
            CertStatus::Good(_) => {}
            CertStatus::Revoked(info) => return Err(OcspError::Revoked(info.revocation_reason)),
            CertStatus::Unknown(_) => return Err(OcspError::UnknownStatus),
        }

        let now = unix_seconds(self.clock.now());
        let skew = MAX_SKEW.as_secs() as i64;

        let this_update = single.this_update.to_unix_duration().as_secs() as i64;
        if this_update > now + skew {
            return Err(OcspError::NotYetValid);
        }

        let next_update = single.next_update.ok_or(OcspError::Stale)?;
        if (next_update.to_unix_duration().as_secs() as i64) < now - skew {
            return Err(OcspError::Stale);
        }

        Ok(())
    }
}

fn responder_url(cert: &ParsedCertificate) -> Result<Url, OcspError> {
    let raw = cert.ocsp_url.as_deref().ok_or(OcspError::MissingResponderUrl)?;
    let url = Url::parse(raw).map_err(|e| OcspError::InvalidResponderUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(OcspError::InvalidResponderUrl(format!("unsupported scheme {other}"))),
    }
}
