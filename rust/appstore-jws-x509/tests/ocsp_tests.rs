// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Revocation checks against the in-process responder.

use std::sync::Arc;

use appstore_jws_test_utils::pki::{INTERMEDIATE_OCSP_URL, ROOT_OCSP_URL};
use appstore_jws_test_utils::{
    MockCertStatus, MockClock, MockOcspResponder, PkiBuilder, ResponderScenario, TestPki,
};
use appstore_jws_x509::ocsp::asn1::OcspResponseStatus;
use appstore_jws_x509::{
    ChainError, ChainVerifier, FailureKind, OcspChecker, OcspError, ParsedCertificate,
};

// 2025-06-01T00:00:00Z
const NOW_MILLIS: u64 = 1_748_736_000_000;

struct Fixture {
    pki: TestPki,
    clock: Arc<MockClock>,
    responder: Arc<MockOcspResponder>,
}

impl Fixture {
    fn new(pki: TestPki) -> Self {
        let clock = Arc::new(MockClock::at_millis(NOW_MILLIS));
        let responder = Arc::new(MockOcspResponder::for_pki(&pki, clock.clone()));
        Self { pki, clock, responder }
    }

    fn checker(&self) -> OcspChecker {
        OcspChecker::new(self.responder.clone(), self.clock.clone())
    }

    async fn check_leaf(&self) -> Result<(), OcspError> {
        self.checker()
            .check(&parsed(&self.pki.leaf.der), &parsed(&self.pki.intermediate.der))
            .await
    }

    async fn verify_chain(&self) -> Result<(), ChainError> {
        let verifier = ChainVerifier::new(vec![parsed(&self.pki.root.der)]).with_revocation(self.checker());
        verifier
            .verify(&parsed(&self.pki.leaf.der), &parsed(&self.pki.intermediate.der), self.now())
            .await
            .map(|_| ())
    }

    fn now(&self) -> std::time::SystemTime {
        appstore_jws_x509::Clock::now(self.clock.as_ref())
    }

    fn leaf_scenario(&self, scenario: ResponderScenario) {
        self.responder.set_scenario(INTERMEDIATE_OCSP_URL, scenario);
    }
}

fn parsed(der: &[u8]) -> ParsedCertificate {
    ParsedCertificate::from_der(der).unwrap()
}

#[tokio::test]
async fn good_status_for_both_links_accepts_chain() {
    let f = Fixture::new(TestPki::generate());
    f.verify_chain().await.unwrap();

    let mut urls = f.responder.requested_urls();
    urls.sort();
    assert_eq!(urls, vec![INTERMEDIATE_OCSP_URL.to_string(), ROOT_OCSP_URL.to_string()]);
}

#[tokio::test]
async fn revoked_leaf_fails_chain() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario::status(MockCertStatus::Revoked));

    let err = f.verify_chain().await.unwrap_err();
    assert!(matches!(err, ChainError::Revocation(OcspError::Revoked(_))));
    assert_eq!(err.kind(), FailureKind::ChainVerification);
}

#[tokio::test]
async fn revoked_intermediate_fails_chain() {
    let f = Fixture::new(TestPki::generate());
    f.responder
        .set_scenario(ROOT_OCSP_URL, ResponderScenario::status(MockCertStatus::Revoked));

    assert!(matches!(
        f.verify_chain().await,
        Err(ChainError::Revocation(OcspError::Revoked(_)))
    ));
}

#[tokio::test]
async fn unknown_status_is_not_good_enough() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario::status(MockCertStatus::Unknown));
    assert!(matches!(f.check_leaf().await, Err(OcspError::UnknownStatus)));
}

#[tokio::test]
async fn next_update_in_the_past_is_stale() {
    let f = Fixture::new(TestPki::generate());

    f.leaf_scenario(ResponderScenario {
        next_update_offset: Some(-30),
        ..Default::default()
    });
    f.check_leaf().await.unwrap();

    f.leaf_scenario(ResponderScenario {
        next_update_offset: Some(-120),
        ..Default::default()
    });
    assert!(matches!(f.check_leaf().await, Err(OcspError::Stale)));

    f.leaf_scenario(ResponderScenario {
        next_update_offset: None,
        ..Default::default()
    });
    assert!(matches!(f.check_leaf().await, Err(OcspError::Stale)));
}

#[tokio::test]
async fn this_update_in_the_future_is_rejected() {
    let f = Fixture::new(TestPki::generate());

    f.leaf_scenario(ResponderScenario {
        this_update_offset: 30,
        ..Default::default()
    });
    f.check_leaf().await.unwrap();

    f.leaf_scenario(ResponderScenario {
        this_update_offset: 120,
        ..Default::default()
    });
    assert!(matches!(f.check_leaf().await, Err(OcspError::NotYetValid)));
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        corrupt_signature: true,
        ..Default::default()
    });

    let err = f.verify_chain().await.unwrap_err();
    assert!(matches!(err, ChainError::Revocation(OcspError::Signature(_))));
    assert_eq!(err.kind(), FailureKind::ChainVerification);
}

#[tokio::test]
async fn response_for_another_certificate_is_rejected() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        wrong_serial: true,
        ..Default::default()
    });
    assert!(matches!(f.check_leaf().await, Err(OcspError::NoMatchingResponse)));
}

#[tokio::test]
async fn responder_identified_by_key_hash() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        by_name: false,
        ..Default::default()
    });
    f.check_leaf().await.unwrap();
    assert_eq!(f.responder.request_count(), 1);
}

#[tokio::test]
async fn responder_identified_by_name() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        by_name: true,
        ..Default::default()
    });
    f.check_leaf().await.unwrap();
}

#[tokio::test]
async fn delegated_responder_with_ocsp_signing_is_trusted() {
    let f = Fixture::new(TestPki::generate());
    let responder = f
        .pki
        .issue_responder(&f.pki.intermediate, true, ((2024, 1, 1), (2026, 1, 1)));
    f.leaf_scenario(ResponderScenario::delegated_to(&responder));

    f.check_leaf().await.unwrap();
}

#[tokio::test]
async fn delegated_responder_without_ocsp_signing_is_invalid() {
    let f = Fixture::new(TestPki::generate());
    let responder = f
        .pki
        .issue_responder(&f.pki.intermediate, false, ((2024, 1, 1), (2026, 1, 1)));
    f.leaf_scenario(ResponderScenario::delegated_to(&responder));

    let err = f.check_leaf().await.unwrap_err();
    assert!(matches!(err, OcspError::ResponderNotOcspSigner));
    assert_eq!(err.kind(), FailureKind::InvalidCertificate);
}

#[tokio::test]
async fn expired_delegated_responder_is_invalid() {
    let f = Fixture::new(TestPki::generate());
    let responder = f
        .pki
        .issue_responder(&f.pki.intermediate, true, ((2023, 1, 1), (2024, 1, 1)));
    f.leaf_scenario(ResponderScenario::delegated_to(&responder));

    let err = f.check_leaf().await.unwrap_err();
    assert!(matches!(err, OcspError::ResponderCertificate(_)));
    assert_eq!(err.kind(), FailureKind::InvalidCertificate);
}

#[tokio::test]
async fn responder_from_another_issuer_is_untrusted() {
    let f = Fixture::new(TestPki::generate());
    let other = TestPki::generate();
    let responder = other.issue_responder(&other.intermediate, true, ((2024, 1, 1), (2026, 1, 1)));
    f.leaf_scenario(ResponderScenario::delegated_to(&responder));

    let err = f.check_leaf().await.unwrap_err();
    assert!(matches!(err, OcspError::UntrustedResponder));
    assert_eq!(err.kind(), FailureKind::InvalidCertificate);
}

#[tokio::test]
async fn unsuccessful_response_status_is_rejected() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        response_status: OcspResponseStatus::TryLater,
        ..Default::default()
    });
    assert!(matches!(
        f.check_leaf().await,
        Err(OcspError::UnsuccessfulStatus(OcspResponseStatus::TryLater))
    ));
}

#[tokio::test]
async fn transport_failure_fails_the_check() {
    let f = Fixture::new(TestPki::generate());
    f.leaf_scenario(ResponderScenario {
        http_status: Some(503),
        ..Default::default()
    });

    let err = f.verify_chain().await.unwrap_err();
    assert!(matches!(err, ChainError::Revocation(OcspError::Transport(_))));
    assert_eq!(err.kind(), FailureKind::ChainVerification);
}

#[tokio::test]
async fn certificate_without_ocsp_url_is_invalid() {
    let f = Fixture::new(PkiBuilder::default().leaf_ocsp_url(None).build());

    let err = f.verify_chain().await.unwrap_err();
    assert!(matches!(err, ChainError::Revocation(OcspError::MissingResponderUrl)));
    assert_eq!(err.kind(), FailureKind::InvalidCertificate);
}

#[tokio::test]
async fn non_http_ocsp_url_is_invalid() {
    let f = Fixture::new(PkiBuilder::default().leaf_ocsp_url(Some("ldap://ocsp.test/x")).build());
    assert!(matches!(f.check_leaf().await, Err(OcspError::InvalidResponderUrl(_))));
    assert_eq!(f.responder.request_count(), 0);
}
