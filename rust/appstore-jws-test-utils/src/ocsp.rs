// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process OCSP responder.
//!
//! Decodes the DER request it receives and answers with a signed
//! `BasicOCSPResponse` for the requested `CertID`, shaped by the
//! [`ResponderScenario`] registered for the URL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use appstore_jws_x509::ocsp::asn1::{
    BasicOcspResponse, CertStatus, CrlReason, OcspRequest, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, RevokedInfo, SingleResponse, ID_PKIX_OCSP_BASIC,
};
use appstore_jws_x509::{Clock, OcspTransport, TransportError, OCSP_REQUEST_CONTENT_TYPE};
use async_trait::async_trait;
use der::asn1::{BitString, GeneralizedTime, Int, Null, OctetString};
use der::{Any, Decode as _, Encode as _};
use parking_lot::Mutex;
use sha1::{Digest as _, Sha1};
use x509_cert::certificate::Version;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::pki::{Issued, TestPki, TestSigner, INTERMEDIATE_OCSP_URL, ROOT_OCSP_URL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockCertStatus {
    Good,
    Revoked,
    Unknown,
}

/// What the responder answers for one URL.
#[derive(Clone, Debug)]
pub struct ResponderScenario {
    pub status: MockCertStatus,
    /// `thisUpdate` relative to the clock, in seconds.
    pub this_update_offset: i64,
    /// `nextUpdate` relative to the clock, in seconds; `None` omits it.
    pub next_update_offset: Option<i64>,
    pub by_name: bool,
    pub corrupt_signature: bool,
    pub wrong_serial: bool,
    pub response_status: OcspResponseStatus,
    /// Fail at the HTTP level with this status.
    pub http_status: Option<u16>,
    /// Sign with a delegated responder and embed its certificate.
    pub delegate: Option<(Vec<u8>, TestSigner)>,
}

impl Default for ResponderScenario {
    fn default() -> Self {
        Self {
            status: MockCertStatus::Good,
            this_update_offset: -3600,
            next_update_offset: Some(3600),
            by_name: false,
            corrupt_signature: false,
            wrong_serial: false,
            response_status: OcspResponseStatus::Successful,
            http_status: None,
            delegate: None,
        }
    }
}

impl ResponderScenario {
    pub fn status(status: MockCertStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn delegated_to(responder: &Issued) -> Self {
        Self {
            delegate: Some((responder.der.clone(), responder.signer.clone())),
            ..Self::default()
        }
    }
}

struct Endpoint {
    issuer_der: Vec<u8>,
    signer: TestSigner,
    scenario: ResponderScenario,
}

pub struct MockOcspResponder {
    clock: Arc<dyn Clock>,
    endpoints: Mutex<HashMap<String, Endpoint>>,
    requests: Mutex<Vec<String>>,
}

impl MockOcspResponder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            endpoints: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Responder answering for both links of `pki` with `good`.
    pub fn for_pki(pki: &TestPki, clock: Arc<dyn Clock>) -> Self {
        let responder = Self::new(clock);
        responder.register(INTERMEDIATE_OCSP_URL, &pki.intermediate);
        responder.register(ROOT_OCSP_URL, &pki.root);
        responder
    }

    pub fn register(&self, url: &str, issuer: &Issued) {
        self.endpoints.lock().insert(
            url.to_string(),
            Endpoint {
                issuer_der: issuer.der.clone(),
                signer: issuer.signer.clone(),
                scenario: ResponderScenario::default(),
            },
        );
    }

    pub fn set_scenario(&self, url: &str, scenario: ResponderScenario) {
        let mut endpoints = self.endpoints.lock();
        let endpoint = endpoints.get_mut(url).expect("url not registered");
        endpoint.scenario = scenario;
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn respond(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let endpoints = self.endpoints.lock();
        let endpoint = endpoints.get(url).ok_or_else(|| TransportError::Status {
            url: url.to_string(),
            status: 404,
        })?;

        if let Some(status) = endpoint.scenario.http_status {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }

        let request = OcspRequest::from_der(body).map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: format!("mock responder could not decode request: {e}"),
        })?;
        let cert_id = request.tbs_request.request_list[0].req_cert.clone();

        Ok(build_response(endpoint, cert_id, self.clock.now()))
    }
}

#[async_trait]
impl OcspTransport for MockOcspResponder {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().push(url.to_string());
        assert_eq!(content_type, OCSP_REQUEST_CONTENT_TYPE);
        self.respond(url, &body)
    }
}

fn build_response(
    endpoint: &Endpoint,
    mut cert_id: appstore_jws_x509::ocsp::asn1::CertId,
    now: SystemTime,
) -> Vec<u8> {
    let scenario = &endpoint.scenario;
    if scenario.response_status != OcspResponseStatus::Successful {
        return OcspResponse {
            response_status: scenario.response_status,
            response_bytes: None,
        }
        .to_der()
        .unwrap();
    }

    if scenario.wrong_serial {
        cert_id.serial_number = Int::new(&[0x7f, 0x7e, 0x7d]).unwrap();
    }

    let (signer_der, signer) = match &scenario.delegate {
        Some((der, signer)) => (der.as_slice(), signer),
        None => (endpoint.issuer_der.as_slice(), &endpoint.signer),
    };
    let (_, signer_cert) = x509_parser::parse_x509_certificate(signer_der).unwrap();

    let responder_id = if scenario.by_name {
        ResponderId::ByName(Name::from_der(signer_cert.subject().as_raw()).unwrap())
    } else {
        let key_bits = &signer_cert.tbs_certificate.subject_pki.subject_public_key.data;
        ResponderId::ByKey(OctetString::new(Sha1::digest(key_bits).to_vec()).unwrap())
    };

    let now_secs = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    let at = |offset: i64| {
        GeneralizedTime::from_unix_duration(Duration::from_secs((now_secs + offset) as u64)).unwrap()
    };

    let cert_status = match scenario.status {
        MockCertStatus::Good => CertStatus::Good(Null),
        MockCertStatus::Revoked => CertStatus::Revoked(RevokedInfo {
            revocation_time: at(-86_400),
            revocation_reason: Some(CrlReason::KeyCompromise),
        }),
        MockCertStatus::Unknown => CertStatus::Unknown(Null),
    };

    let data = ResponseData {
        version: Version::V1,
        responder_id,
        produced_at: at(0),
        responses: vec![SingleResponse {
            cert_id,
            cert_status,
            this_update: at(scenario.this_update_offset),
            next_update: scenario.next_update_offset.map(at),
            single_extensions: None,
        }],
        response_extensions: None,
    };
    let tbs = data.to_der().unwrap();

    let signed_bytes = if scenario.corrupt_signature {
        [tbs.as_slice(), b"tampered"].concat()
    } else {
        tbs.clone()
    };
    let (algorithm, signature) = signer.sign_x509(&signed_bytes);

    let basic = BasicOcspResponse {
        tbs_response_data: Any::from_der(&tbs).unwrap(),
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: algorithm,
            parameters: None,
        },
        signature: BitString::from_bytes(&signature).unwrap(),
        certs: scenario
            .delegate
            .as_ref()
            .map(|(der, _)| vec![Any::from_der(der).unwrap()]),
    };

    OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: ID_PKIX_OCSP_BASIC,
            response: OctetString::new(basic.to_der().unwrap()).unwrap(),
        }),
    }
    .to_der()
    .unwrap()
}
