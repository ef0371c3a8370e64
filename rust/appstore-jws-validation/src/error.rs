// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::public_key::KeyType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unsupported or malformed SubjectPublicKeyInfo")]
    UnsupportedKey,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("algorithm {algorithm} cannot be used with a {key_type:?} key")]
    KeyMismatch {
        algorithm: String,
        key_type: KeyType,
    },

    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("signature verification failed")]
    Invalid,
}
