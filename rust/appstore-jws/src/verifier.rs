// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use appstore_jws_common::{parse_compact_jws, ParsedJws};
use appstore_jws_validation::{JwsAlgorithm, PublicKey};
use appstore_jws_x509::{
    ChainVerifier, Clock, FailureKind, OcspChecker, OcspTransport, ParsedCertificate, SystemClock,
    UreqOcspTransport,
};
use tracing::{debug, warn};

use crate::environment::Environment;
use crate::error::{ConfigError, VerificationError, VerificationStatus};
use crate::models::{
    AppTransaction, DecodedRealtimeRequestBody, JwsRenewalInfoDecodedPayload,
    JwsTransactionDecodedPayload, ResponseBodyV2DecodedPayload,
};
use crate::options::SignedDataVerifierOptions;
use crate::payload::SignedPayload;
use crate::trust_cache::{ChainCacheKey, TrustCache};

/// How tokens are checked, fixed at construction from the environment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerificationMode {
    /// Full chain and signature verification.
    Networked,
    /// Xcode and local StoreKit testing data is unsigned; only the payload
    /// and identity checks apply.
    LocalUnsigned,
}

impl VerificationMode {
    pub fn for_environment(environment: &Environment) -> Self {
        if environment.is_local() {
            VerificationMode::LocalUnsigned
        } else {
            VerificationMode::Networked
        }
    }
}

/// Verifies App Store signed data for one app and environment.
///
/// The verifier owns its trust cache. It is `Send + Sync`; share it behind an
/// `Arc` to verify concurrently.
pub struct SignedDataVerifier {
    roots: Vec<ParsedCertificate>,
    transport: Arc<dyn OcspTransport>,
    clock: Arc<dyn Clock>,
    chain: ChainVerifier,
    trust_cache: TrustCache,
    mode: VerificationMode,
    enable_online_checks: bool,
    environment: Environment,
    bundle_id: String,
    app_apple_id: Option<i64>,
}

impl fmt::Debug for SignedDataVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedDataVerifier")
            .field("mode", &self.mode)
            .field("enable_online_checks", &self.enable_online_checks)
            .field("environment", &self.environment)
            .field("bundle_id", &self.bundle_id)
            .field("app_apple_id", &self.app_apple_id)
            .field("trusted_roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl SignedDataVerifier {
    pub fn new(options: SignedDataVerifierOptions) -> Result<Self, ConfigError> {
        if options.environment == Environment::Production && options.app_apple_id.is_none() {
            return Err(ConfigError::MissingAppAppleId);
        }

        let roots = options
            .root_certificates
            .iter()
            .enumerate()
            .map(|(index, der)| {
                ParsedCertificate::from_der(der)
                    .map_err(|source| ConfigError::InvalidRootCertificate { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let transport: Arc<dyn OcspTransport> = Arc::new(UreqOcspTransport::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let chain = build_chain_verifier(
            &roots,
            options.enable_online_checks,
            transport.clone(),
            clock.clone(),
        );

        Ok(Self {
            roots,
            transport,
            clock,
            chain,
            trust_cache: TrustCache::new(),
            mode: VerificationMode::for_environment(&options.environment),
            enable_online_checks: options.enable_online_checks,
            environment: options.environment,
            bundle_id: options.bundle_id,
            app_apple_id: options.app_apple_id,
        })
    }

    /// Replace the HTTP transport used for OCSP.
    pub fn with_ocsp_transport(mut self, transport: Arc<dyn OcspTransport>) -> Self {
        self.transport = transport;
        self.rebuild_chain_verifier();
        self
    }

    /// Replace the source of "now" for validity, OCSP freshness and caching.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild_chain_verifier();
        self
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn trust_cache(&self) -> &TrustCache {
        &self.trust_cache
    }

    fn rebuild_chain_verifier(&mut self) {
        self.chain = build_chain_verifier(
            &self.roots,
            self.enable_online_checks,
            self.transport.clone(),
            self.clock.clone(),
        );
    }

    /// Verify a signed transaction (`signedTransactionInfo`).
    pub async fn verify_and_decode_transaction(
        &self,
        token: &str,
    ) -> Result<JwsTransactionDecodedPayload, VerificationError> {
        let payload: JwsTransactionDecodedPayload = self.verify_jws(token).await?;
        if payload.bundle_id.as_deref() != Some(self.bundle_id.as_str()) {
            return Err(VerificationError::new(VerificationStatus::InvalidAppIdentifier));
        }
        self.check_environment(payload.environment.as_ref())?;
        Ok(payload)
    }

    /// Verify subscription renewal info (`signedRenewalInfo`).
    pub async fn verify_and_decode_renewal_info(
        &self,
        token: &str,
    ) -> Result<JwsRenewalInfoDecodedPayload, VerificationError> {
        let payload: JwsRenewalInfoDecodedPayload = self.verify_jws(token).await?;
        self.check_environment(payload.environment.as_ref())?;
        Ok(payload)
    }

    /// Verify an App Store Server Notification V2 `signedPayload`.
    pub async fn verify_and_decode_notification(
        &self,
        token: &str,
    ) -> Result<ResponseBodyV2DecodedPayload, VerificationError> {
        let payload: ResponseBodyV2DecodedPayload = self.verify_jws(token).await?;
        let identity = payload.identity();
        self.check_app_identity(identity.bundle_id.as_deref(), identity.app_apple_id)?;
        self.check_environment(identity.environment.as_ref())?;
        Ok(payload)
    }

    /// Verify a signed app transaction.
    pub async fn verify_and_decode_app_transaction(
        &self,
        token: &str,
    ) -> Result<AppTransaction, VerificationError> {
        let payload: AppTransaction = self.verify_jws(token).await?;
        self.check_app_identity(payload.bundle_id.as_deref(), payload.app_apple_id)?;
        self.check_environment(payload.receipt_type.as_ref())?;
        Ok(payload)
    }

    /// Verify a Retention Messaging realtime request body.
    pub async fn verify_and_decode_realtime_request(
        &self,
        token: &str,
    ) -> Result<DecodedRealtimeRequestBody, VerificationError> {
        let payload: DecodedRealtimeRequestBody = self.verify_jws(token).await?;
        if self.environment == Environment::Production
            && self.app_apple_id != Some(payload.app_apple_id)
        {
            return Err(VerificationError::new(VerificationStatus::InvalidAppIdentifier));
        }
        self.check_environment(Some(&payload.environment))?;
        Ok(payload)
    }

    fn check_app_identity(
        &self,
        bundle_id: Option<&str>,
        app_apple_id: Option<i64>,
    ) -> Result<(), VerificationError> {
        let bundle_matches = bundle_id == Some(self.bundle_id.as_str());
        let app_matches =
            self.environment != Environment::Production || app_apple_id == self.app_apple_id;
        if bundle_matches && app_matches {
            Ok(())
        } else {
            Err(VerificationError::new(VerificationStatus::InvalidAppIdentifier))
        }
    }

    fn check_environment(&self, environment: Option<&Environment>) -> Result<(), VerificationError> {
        if environment == Some(&self.environment) {
            Ok(())
        } else {
            Err(VerificationError::new(VerificationStatus::InvalidEnvironment))
        }
    }

    /// Decode, shape-check and (outside local testing) cryptographically
    /// verify `token` as a `T`.
    async fn verify_jws<T: SignedPayload>(&self, token: &str) -> Result<T, VerificationError> {
        let jws = parse_compact_jws(token)
            .map_err(|e| VerificationError::with_cause(VerificationStatus::StructuralFailure, e))?;
        let payload = T::from_json(jws.payload.clone())
            .map_err(|e| VerificationError::with_cause(VerificationStatus::StructuralFailure, e))?;

        if self.mode == VerificationMode::LocalUnsigned {
            debug!(kind = ?T::KIND, environment = %self.environment, "skipping signature verification for local testing data");
            return Ok(payload);
        }

        let chain = jws
            .x5c_der()
            .map_err(|e| VerificationError::with_cause(VerificationStatus::InvalidCertificate, e))?;
        let [leaf_der, intermediate_der] = chain.as_slice() else {
            return Err(VerificationError::new(VerificationStatus::InvalidChainLength));
        };

        let now = self.clock.now();
        let effective_date = if self.enable_online_checks {
            now
        } else {
            payload
                .signed_at(now)
                .ok_or_else(|| VerificationError::new(VerificationStatus::StructuralFailure))?
        };

        let public_key = self
            .verify_chain(leaf_der, intermediate_der, effective_date, now)
            .await?;

        verify_signature(&jws, &public_key)?;
        debug!(kind = ?T::KIND, "signed data verified");
        Ok(payload)
    }

    async fn verify_chain(
        &self,
        leaf_der: &[u8],
        intermediate_der: &[u8],
        effective_date: SystemTime,
        now: SystemTime,
    ) -> Result<PublicKey, VerificationError> {
        let key = self
            .enable_online_checks
            .then(|| ChainCacheKey::new(leaf_der, intermediate_der));
        if let Some(key) = &key {
            if let Some(public_key) = self.trust_cache.get(key, now) {
                debug!("certificate chain served from trust cache");
                return Ok(public_key);
            }
            debug!("certificate chain not cached");
        }

        let leaf = ParsedCertificate::from_der(leaf_der)
            .map_err(|e| VerificationError::with_cause(VerificationStatus::InvalidCertificate, e))?;
        let intermediate = ParsedCertificate::from_der(intermediate_der)
            .map_err(|e| VerificationError::with_cause(VerificationStatus::InvalidCertificate, e))?;

        let public_key = self
            .chain
            .verify(&leaf, &intermediate, effective_date)
            .await
            .map_err(|e| {
                warn!(error = %e, "certificate chain rejected");
                let status = match e.kind() {
                    FailureKind::InvalidCertificate => VerificationStatus::InvalidCertificate,
                    FailureKind::ChainVerification => VerificationStatus::ChainVerificationFailure,
                };
                VerificationError::with_cause(status, e)
            })?;

        if let Some(key) = key {
            self.trust_cache.put(key, public_key.clone(), now);
        }
        Ok(public_key)
    }
}

fn build_chain_verifier(
    roots: &[ParsedCertificate],
    enable_online_checks: bool,
    transport: Arc<dyn OcspTransport>,
    clock: Arc<dyn Clock>,
) -> ChainVerifier {
    let verifier = ChainVerifier::new(roots.to_vec());
    if enable_online_checks {
        verifier.with_revocation(OcspChecker::new(transport, clock))
    } else {
        verifier
    }
}

fn verify_signature(jws: &ParsedJws, public_key: &PublicKey) -> Result<(), VerificationError> {
    let algorithm: JwsAlgorithm = jws
        .algorithm()
        .ok_or_else(|| VerificationError::new(VerificationStatus::OuterSignatureFailure))?
        .parse()
        .map_err(|e| VerificationError::with_cause(VerificationStatus::OuterSignatureFailure, e))?;
    public_key
        .verify_jws(algorithm, jws.signing_input.as_bytes(), &jws.signature)
        .map_err(|e| VerificationError::with_cause(VerificationStatus::OuterSignatureFailure, e))
}
