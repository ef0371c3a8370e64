// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::{json, Value};

use crate::pki::TestSigner;

/// JOSE header carrying `chain` as `x5c`.
pub fn x5c_header(alg: &str, chain: &[Vec<u8>]) -> Value {
    let x5c: Vec<String> = chain.iter().map(|der| STANDARD.encode(der)).collect();
    json!({ "alg": alg, "x5c": x5c })
}

/// Compact JWS signed by `signer`.
pub fn sign_token(header: &Value, payload: &Value, signer: &TestSigner) -> String {
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header json")),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).expect("payload json")),
    );
    let signature = signer.sign_jws(signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
}

/// Token in the shape the local testing environments produce: no chain and a
/// signature that nothing could verify.
pub fn unsigned_token(payload: &Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256"}"#),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).expect("payload json")),
        URL_SAFE_NO_PAD.encode(b"unsigned"),
    )
}
