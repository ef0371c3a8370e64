// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verify and decode App Store signed data.
//!
//! [`SignedDataVerifier`] is the entry point. Each `verify_and_decode_*`
//! method decodes one payload kind, establishes trust in the embedded
//! certificate chain, checks the token signature and finally matches the
//! payload against the configured app identity and environment.
//!
//! lib.rs only publishes; implementation lives in private modules.

mod environment;
mod error;
mod models;
mod options;
mod payload;
mod trust_cache;
mod verifier;

pub use environment::Environment;
pub use error::{ConfigError, VerificationError, VerificationStatus};
pub use models::{
    AppData, AppTransaction, DecodedRealtimeRequestBody, ExternalPurchaseToken,
    JwsRenewalInfoDecodedPayload, JwsTransactionDecodedPayload, NotificationData,
    NotificationIdentity, ResponseBodyV2DecodedPayload, Summary,
};
pub use options::SignedDataVerifierOptions;
pub use payload::{PayloadKind, SignedPayload};
pub use trust_cache::{ChainCacheKey, TrustCache, CACHE_TIME_LIMIT, MAXIMUM_CACHE_SIZE};
pub use verifier::{SignedDataVerifier, VerificationMode};

pub use appstore_jws_x509::{Clock, OcspTransport, SystemClock, TransportError, UreqOcspTransport};
