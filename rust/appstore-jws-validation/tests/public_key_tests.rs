// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use appstore_jws_validation::{
    DigestAlgorithm, JwsAlgorithm, KeyError, KeyType, PublicKey, SignatureAlgorithm,
    SignatureError,
};
use p256::pkcs8::DecodePrivateKey as _;
use signature::hazmat::PrehashSigner;
use signature::{SignatureEncoding as _, Signer as _};
use x509_parser::prelude::*;

struct CertParts {
    spki: Vec<u8>,
    tbs: Vec<u8>,
    sig_oid: String,
    sig: Vec<u8>,
}

fn parts(der: &[u8]) -> CertParts {
    let (_, cert) = parse_x509_certificate(der).unwrap();
    CertParts {
        spki: cert.tbs_certificate.subject_pki.raw.to_vec(),
        tbs: cert.tbs_certificate.as_ref().to_vec(),
        sig_oid: cert.signature_algorithm.algorithm.to_id_string(),
        sig: cert.signature_value.data.to_vec(),
    }
}

fn self_signed(alg: &'static rcgen::SignatureAlgorithm) -> (rcgen::KeyPair, Vec<u8>) {
    let key = rcgen::KeyPair::generate_for(alg).unwrap();
    let params = rcgen::CertificateParams::new(vec!["key.test".to_string()]).unwrap();
    let cert = params.self_signed(&key).unwrap();
    (key, cert.der().to_vec())
}

#[test]
fn detects_key_types() {
    let (_, p256_der) = self_signed(&rcgen::PKCS_ECDSA_P256_SHA256);
    let (_, p384_der) = self_signed(&rcgen::PKCS_ECDSA_P384_SHA384);

    assert_eq!(PublicKey::from_spki_der(&parts(&p256_der).spki).unwrap().key_type(), KeyType::EcP256);
    assert_eq!(PublicKey::from_spki_der(&parts(&p384_der).spki).unwrap().key_type(), KeyType::EcP384);
}

#[test]
fn rejects_garbage_spki() {
    assert_eq!(PublicKey::from_spki_der(&[0x30, 0x03, 0x02, 0x01, 0x01]), Err(KeyError::UnsupportedKey));
}

#[test]
fn verifies_self_signed_certificate_signatures() {
    for alg in [&rcgen::PKCS_ECDSA_P256_SHA256, &rcgen::PKCS_ECDSA_P384_SHA384] {
        let (_, der) = self_signed(alg);
        let p = parts(&der);
        let key = PublicKey::from_spki_der(&p.spki).unwrap();
        let sig_alg = SignatureAlgorithm::from_oid(&p.sig_oid).unwrap();
        key.verify_signature(sig_alg, &p.tbs, &p.sig).unwrap();
    }
}

#[test]
fn tampered_tbs_fails_verification() {
    let (_, der) = self_signed(&rcgen::PKCS_ECDSA_P256_SHA256);
    let mut p = parts(&der);
    let key = PublicKey::from_spki_der(&p.spki).unwrap();
    let last = p.tbs.len() - 1;
    p.tbs[last] ^= 0x01;

    let sig_alg = SignatureAlgorithm::from_oid(&p.sig_oid).unwrap();
    assert_eq!(key.verify_signature(sig_alg, &p.tbs, &p.sig), Err(SignatureError::Invalid));
}

#[test]
fn digest_follows_algorithm_not_curve() {
    let (kp, der) = self_signed(&rcgen::PKCS_ECDSA_P256_SHA256);
    let signer = p256::ecdsa::SigningKey::from_pkcs8_der(&kp.serialize_der()).unwrap();
    let key = PublicKey::from_spki_der(&parts(&der).spki).unwrap();

    let message = b"ocsp response data";
    let sig: p256::ecdsa::Signature = signer
        .sign_prehash(&DigestAlgorithm::Sha384.digest(message))
        .unwrap();
    let der_sig = sig.to_der();

    key.verify_signature(SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha384), message, der_sig.as_bytes())
        .unwrap();
    assert_eq!(
        key.verify_signature(SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256), message, der_sig.as_bytes()),
        Err(SignatureError::Invalid)
    );
}

#[test]
fn unknown_signature_oid_is_unsupported() {
    assert!(matches!(
        SignatureAlgorithm::from_oid("1.2.840.113549.1.1.5"),
        Err(SignatureError::UnsupportedAlgorithm(_))
    ));
}

#[test]
fn es256_round_trip_and_tamper() {
    let (kp, der) = self_signed(&rcgen::PKCS_ECDSA_P256_SHA256);
    let signer = p256::ecdsa::SigningKey::from_pkcs8_der(&kp.serialize_der()).unwrap();
    let key = PublicKey::from_spki_der(&parts(&der).spki).unwrap();

    let input = b"eyJhbGciOiJFUzI1NiJ9.e30";
    let sig: p256::ecdsa::Signature = signer.sign(input);
    let raw = sig.to_bytes();

    key.verify_jws(JwsAlgorithm::ES256, input, &raw).unwrap();
    assert_eq!(key.verify_jws(JwsAlgorithm::ES256, b"eyJhbGciOiJFUzI1NiJ9.e31", &raw), Err(SignatureError::Invalid));
    assert!(matches!(
        key.verify_jws(JwsAlgorithm::ES256, input, sig.to_der().as_bytes()),
        Err(SignatureError::Malformed(_))
    ));
}

#[test]
fn jws_algorithm_must_match_key_type() {
    let (_, der) = self_signed(&rcgen::PKCS_ECDSA_P384_SHA384);
    let key = PublicKey::from_spki_der(&parts(&der).spki).unwrap();

    assert!(matches!(
        key.verify_jws(JwsAlgorithm::ES256, b"a.b", &[0u8; 64]),
        Err(SignatureError::KeyMismatch { key_type: KeyType::EcP384, .. })
    ));
}

#[test]
fn jws_algorithm_names() {
    assert_eq!("ES256".parse::<JwsAlgorithm>().unwrap(), JwsAlgorithm::ES256);
    assert_eq!("RS256".parse::<JwsAlgorithm>().unwrap().to_string(), "RS256");
    assert!("none".parse::<JwsAlgorithm>().is_err());
    assert!("HS256".parse::<JwsAlgorithm>().is_err());
}

#[test]
fn rs256_verifies() {
    use rsa::pkcs8::EncodePublicKey as _;

    let private = rsa::RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 1024).unwrap();
    let spki = private.to_public_key().to_public_key_der().unwrap();
    let key = PublicKey::from_spki_der(spki.as_bytes()).unwrap();
    assert_eq!(key.key_type(), KeyType::Rsa);

    let signer = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(private);
    let input = b"header.payload";
    let sig = signer.sign(input).to_vec();

    key.verify_jws(JwsAlgorithm::RS256, input, &sig).unwrap();
    assert_eq!(key.verify_jws(JwsAlgorithm::RS256, b"header.other", &sig), Err(SignatureError::Invalid));
}
