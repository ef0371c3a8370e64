// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::Value;

use crate::error::{DecodeError, X5cError};
use crate::header::JwsHeader;

/// base64url engine for JWS segments: never emits padding, accepts it on input.
pub const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An untrusted, decoded compact JWS.
#[derive(Debug, Clone)]
pub struct ParsedJws {
    pub header: JwsHeader,
    pub payload: Value,
    /// `base64url(header) "." base64url(payload)` exactly as received.
    pub signing_input: String,
    pub signature: Vec<u8>,
}

impl ParsedJws {
    pub fn algorithm(&self) -> Option<&str> {
        self.header.algorithm()
    }

    pub fn x5c_der(&self) -> Result<Vec<Vec<u8>>, X5cError> {
        self.header.x5c_der()
    }
}

/// Split and decode a compact JWS (`header.payload.signature`).
///
/// The payload is returned as generic JSON; checking its shape is left to the
/// caller so that each payload kind can apply its own schema.
pub fn parse_compact_jws(token: &str) -> Result<ParsedJws, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        return Err(DecodeError::SegmentCount(segments.len()));
    };

    let header_bytes = decode_segment("header", header_b64)?;
    let header = match parse_json("header", &header_bytes)? {
        Value::Object(members) => JwsHeader::from_members(members),
        _ => return Err(DecodeError::HeaderNotObject),
    };

    let payload_bytes = decode_segment("payload", payload_b64)?;
    let payload = parse_json("payload", &payload_bytes)?;

    let signature = decode_segment("signature", signature_b64)?;

    Ok(ParsedJws {
        header,
        payload,
        signing_input: format!("{header_b64}.{payload_b64}"),
        signature,
    })
}

fn decode_segment(segment: &'static str, text: &str) -> Result<Vec<u8>, DecodeError> {
    BASE64_URL
        .decode(text)
        .map_err(|source| DecodeError::Base64 { segment, source })
}

fn parse_json(segment: &'static str, bytes: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(bytes).map_err(|source| DecodeError::Json { segment, source })
}
