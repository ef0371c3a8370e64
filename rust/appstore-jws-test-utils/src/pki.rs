// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use der::asn1::{Ia5String, ObjectIdentifier};
use der::Encode as _;
use p256::ecdsa::signature::Signer as _;
use p256::pkcs8::DecodePrivateKey as _;
use rcgen::{
    BasicConstraints, CertificateParams, CustomExtension, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{AccessDescription, AuthorityInfoAccessSyntax};

/// OCSP URL placed in the leaf's AIA (answered with the intermediate's key).
pub const INTERMEDIATE_OCSP_URL: &str = "http://ocsp.test/intermediate";
/// OCSP URL placed in the intermediate's AIA (answered with the root's key).
pub const ROOT_OCSP_URL: &str = "http://ocsp.test/root";

const LEAF_MARKER: &[u64] = &[1, 2, 840, 113635, 100, 6, 11, 1];
const INTERMEDIATE_MARKER: &[u64] = &[1, 2, 840, 113635, 100, 6, 2, 1];
const AUTHORITY_INFO_ACCESS: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 1];

const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

pub type Ymd = (i32, u8, u8);

/// Private key of a generated certificate, usable outside rcgen.
#[derive(Clone, Debug)]
pub enum TestSigner {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

impl TestSigner {
    fn from_key_pair(key: &KeyPair) -> Self {
        let pkcs8 = key.serialize_der();
        if key.algorithm() == &rcgen::PKCS_ECDSA_P384_SHA384 {
            TestSigner::P384(p384::ecdsa::SigningKey::from_pkcs8_der(&pkcs8).expect("p384 pkcs8"))
        } else {
            TestSigner::P256(p256::ecdsa::SigningKey::from_pkcs8_der(&pkcs8).expect("p256 pkcs8"))
        }
    }

    /// DER ECDSA signature and its X.509 algorithm OID.
    pub fn sign_x509(&self, message: &[u8]) -> (ObjectIdentifier, Vec<u8>) {
        match self {
            TestSigner::P256(k) => {
                let sig: p256::ecdsa::Signature = k.sign(message);
                (ECDSA_WITH_SHA256, sig.to_der().as_bytes().to_vec())
            }
            TestSigner::P384(k) => {
                let sig: p384::ecdsa::Signature = k.sign(message);
                (ECDSA_WITH_SHA384, sig.to_der().as_bytes().to_vec())
            }
        }
    }

    /// Fixed-width `r || s` JWS signature.
    pub fn sign_jws(&self, message: &[u8]) -> Vec<u8> {
        match self {
            TestSigner::P256(k) => {
                let sig: p256::ecdsa::Signature = k.sign(message);
                sig.to_bytes().to_vec()
            }
            TestSigner::P384(k) => {
                let sig: p384::ecdsa::Signature = k.sign(message);
                sig.to_bytes().to_vec()
            }
        }
    }

    pub fn jws_algorithm(&self) -> &'static str {
        match self {
            TestSigner::P256(_) => "ES256",
            TestSigner::P384(_) => "ES384",
        }
    }
}

/// A generated certificate with its key.
pub struct Issued {
    pub der: Vec<u8>,
    pub signer: TestSigner,
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl Issued {
    pub fn key_pair(&self) -> &KeyPair {
        &self.key
    }
}

#[derive(Clone, Debug)]
struct CertSpec {
    common_name: String,
    not_before: Ymd,
    not_after: Ymd,
    is_ca: Option<bool>,
    marker: Option<&'static [u64]>,
    ocsp_url: Option<String>,
    ocsp_signing: bool,
}

impl CertSpec {
    fn params(&self) -> CertificateParams {
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, self.common_name.as_str());
        dn.push(DnType::OrganizationName, "Test App Store");
        params.distinguished_name = dn;

        params.not_before = rcgen::date_time_ymd(self.not_before.0, self.not_before.1, self.not_before.2);
        params.not_after = rcgen::date_time_ymd(self.not_after.0, self.not_after.1, self.not_after.2);

        match self.is_ca {
            Some(true) => {
                params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
                params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
            }
            Some(false) => {
                params.is_ca = IsCa::ExplicitNoCa;
                params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
            }
            None => params.is_ca = IsCa::NoCa,
        }

        if self.ocsp_signing {
            params.extended_key_usages = vec![ExtendedKeyUsagePurpose::OcspSigning];
        }

        if let Some(oid) = self.marker {
            // The marker value is never inspected; ASN.1 NULL.
            params
                .custom_extensions
                .push(CustomExtension::from_oid_content(oid, vec![0x05, 0x00]));
        }

        if let Some(url) = &self.ocsp_url {
            params
                .custom_extensions
                .push(CustomExtension::from_oid_content(AUTHORITY_INFO_ACCESS, aia_extension(url)));
        }

        params
    }
}

fn aia_extension(url: &str) -> Vec<u8> {
    AuthorityInfoAccessSyntax(vec![AccessDescription {
        access_method: ID_AD_OCSP,
        access_location: GeneralName::UniformResourceIdentifier(Ia5String::new(url).expect("ia5 url")),
    }])
    .to_der()
    .expect("aia der")
}

fn issue(spec: &CertSpec, alg: &'static rcgen::SignatureAlgorithm, issuer: Option<&Issued>) -> Issued {
    let key = KeyPair::generate_for(alg).expect("key generation");
    let params = spec.params();
    let cert = match issuer {
        Some(issuer) => params.signed_by(&key, &issuer.cert, &issuer.key),
        None => params.self_signed(&key),
    }
    .expect("certificate generation");

    Issued {
        der: cert.der().to_vec(),
        signer: TestSigner::from_key_pair(&key),
        key,
        cert,
    }
}

/// Root, intermediate and leaf shaped like the App Store signing chain.
pub struct TestPki {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
    leaf_spec: CertSpec,
}

impl TestPki {
    pub fn generate() -> Self {
        PkiBuilder::default().build()
    }

    /// `x5c` order: leaf, intermediate.
    pub fn x5c(&self) -> Vec<Vec<u8>> {
        vec![self.leaf.der.clone(), self.intermediate.der.clone()]
    }

    /// Another leaf from the same intermediate, otherwise identical to `leaf`.
    pub fn issue_leaf(&self, common_name: &str) -> Issued {
        let spec = CertSpec {
            common_name: common_name.to_string(),
            ..self.leaf_spec.clone()
        };
        issue(&spec, &rcgen::PKCS_ECDSA_P256_SHA256, Some(&self.intermediate))
    }

    /// Delegated OCSP responder certificate issued by `issuer`.
    pub fn issue_responder(&self, issuer: &Issued, ocsp_signing: bool, validity: (Ymd, Ymd)) -> Issued {
        let spec = CertSpec {
            common_name: "Test OCSP Responder".to_string(),
            not_before: validity.0,
            not_after: validity.1,
            is_ca: Some(false),
            marker: None,
            ocsp_url: None,
            ocsp_signing,
        };
        issue(&spec, &rcgen::PKCS_ECDSA_P256_SHA256, Some(issuer))
    }
}

/// Knobs for generating deliberately broken chains.
#[derive(Clone, Debug)]
pub struct PkiBuilder {
    pub root_validity: (Ymd, Ymd),
    pub intermediate_validity: (Ymd, Ymd),
    pub leaf_validity: (Ymd, Ymd),
    pub leaf_marker: bool,
    pub intermediate_marker: bool,
    pub intermediate_is_ca: bool,
    pub leaf_ocsp_url: Option<String>,
    pub intermediate_ocsp_url: Option<String>,
}

impl Default for PkiBuilder {
    fn default() -> Self {
        Self {
            root_validity: ((2020, 1, 1), (2045, 1, 1)),
            intermediate_validity: ((2020, 1, 1), (2040, 1, 1)),
            leaf_validity: ((2023, 1, 1), (2035, 1, 1)),
            leaf_marker: true,
            intermediate_marker: true,
            intermediate_is_ca: true,
            leaf_ocsp_url: Some(INTERMEDIATE_OCSP_URL.to_string()),
            intermediate_ocsp_url: Some(ROOT_OCSP_URL.to_string()),
        }
    }
}

impl PkiBuilder {
    pub fn leaf_validity(mut self, not_before: Ymd, not_after: Ymd) -> Self {
        self.leaf_validity = (not_before, not_after);
        self
    }

    pub fn intermediate_validity(mut self, not_before: Ymd, not_after: Ymd) -> Self {
        self.intermediate_validity = (not_before, not_after);
        self
    }

    pub fn root_validity(mut self, not_before: Ymd, not_after: Ymd) -> Self {
        self.root_validity = (not_before, not_after);
        self
    }

    pub fn without_leaf_marker(mut self) -> Self {
        self.leaf_marker = false;
        self
    }

    pub fn without_intermediate_marker(mut self) -> Self {
        self.intermediate_marker = false;
        self
    }

    pub fn intermediate_not_ca(mut self) -> Self {
        self.intermediate_is_ca = false;
        self
    }

    pub fn leaf_ocsp_url(mut self, url: Option<&str>) -> Self {
        self.leaf_ocsp_url = url.map(str::to_string);
        self
    }

    pub fn build(self) -> TestPki {
        let root = issue(
            &CertSpec {
                common_name: "Test Root CA".to_string(),
                not_before: self.root_validity.0,
                not_after: self.root_validity.1,
                is_ca: Some(true),
                marker: None,
                ocsp_url: None,
                ocsp_signing: false,
            },
            &rcgen::PKCS_ECDSA_P384_SHA384,
            None,
        );

        let intermediate = issue(
            &CertSpec {
                common_name: "Test Worldwide Developer Relations CA".to_string(),
                not_before: self.intermediate_validity.0,
                not_after: self.intermediate_validity.1,
                is_ca: Some(self.intermediate_is_ca),
                marker: self.intermediate_marker.then_some(INTERMEDIATE_MARKER),
                ocsp_url: self.intermediate_ocsp_url.clone(),
                ocsp_signing: false,
            },
            &rcgen::PKCS_ECDSA_P384_SHA384,
            Some(&root),
        );

        let leaf_spec = CertSpec {
            common_name: "Test Store Signing".to_string(),
            not_before: self.leaf_validity.0,
            not_after: self.leaf_validity.1,
            is_ca: Some(false),
            marker: self.leaf_marker.then_some(LEAF_MARKER),
            ocsp_url: self.leaf_ocsp_url.clone(),
            ocsp_signing: false,
        };
        let leaf = issue(&leaf_spec, &rcgen::PKCS_ECDSA_P256_SHA256, Some(&intermediate));

        TestPki {
            root,
            intermediate,
            leaf,
            leaf_spec,
        }
    }
}
