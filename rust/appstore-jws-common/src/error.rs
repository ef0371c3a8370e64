// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// A token could not be split or decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("{segment} segment is not valid base64url: {source}")]
    Base64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{segment} segment is not valid JSON: {source}")]
    Json {
        segment: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("header is not a JSON object")]
    HeaderNotObject,
}

/// The `x5c` header member is present but unusable.
#[derive(Debug, Error)]
pub enum X5cError {
    #[error("x5c is not an array")]
    NotAnArray,

    #[error("x5c[{0}] is not a string")]
    NotAString(usize),

    #[error("x5c[{index}] is not valid base64: {source}")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },
}
