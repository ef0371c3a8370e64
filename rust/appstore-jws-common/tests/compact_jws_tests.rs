// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use appstore_jws_common::{parse_compact_jws, DecodeError, X5cError, BASE64_URL};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

fn segment(value: &serde_json::Value) -> String {
    BASE64_URL.encode(serde_json::to_vec(value).unwrap())
}

fn token(header: &serde_json::Value, payload: &serde_json::Value, signature: &[u8]) -> String {
    format!("{}.{}.{}", segment(header), segment(payload), BASE64_URL.encode(signature))
}

#[test]
fn parses_header_payload_and_signature() {
    let header = json!({"alg": "ES256", "x5c": []});
    let payload = json!({"bundleId": "com.example", "signedDate": 1698148900000u64});
    let jws = token(&header, &payload, b"sig");

    let parsed = parse_compact_jws(&jws).unwrap();
    assert_eq!(parsed.algorithm(), Some("ES256"));
    assert_eq!(parsed.payload, payload);
    assert_eq!(parsed.signature, b"sig");

    let (input, _) = jws.rsplit_once('.').unwrap();
    assert_eq!(parsed.signing_input, input);
}

#[test]
fn rejects_wrong_segment_counts() {
    for bad in ["", "abc", "a.b", "a.b.c.d"] {
        match parse_compact_jws(bad) {
            Err(DecodeError::SegmentCount(_)) => {}
            other => panic!("unexpected result for {bad:?}: {other:?}"),
        }
    }
}

#[test]
fn rejects_bad_base64_in_payload() {
    let jws = format!("{}.!!!.", segment(&json!({})));
    assert!(matches!(
        parse_compact_jws(&jws),
        Err(DecodeError::Base64 { segment: "payload", .. })
    ));
}

#[test]
fn rejects_non_json_header() {
    let jws = format!("{}.{}.", BASE64_URL.encode("not json"), segment(&json!({})));
    assert!(matches!(
        parse_compact_jws(&jws),
        Err(DecodeError::Json { segment: "header", .. })
    ));
}

#[test]
fn rejects_header_that_is_not_an_object() {
    let jws = token(&json!(["ES256"]), &json!({}), b"");
    assert!(matches!(parse_compact_jws(&jws), Err(DecodeError::HeaderNotObject)));
}

#[test]
fn accepts_padded_segments() {
    let header = STANDARD.encode(serde_json::to_vec(&json!({"alg": "RS256", "kid": "a"})).unwrap());
    let padded = header.replace('+', "-").replace('/', "_");
    assert!(padded.ends_with('='));
    let jws = format!("{padded}.{}.", segment(&json!({"a": 1})));
    let parsed = parse_compact_jws(&jws).unwrap();
    assert_eq!(parsed.payload, json!({"a": 1}));
    assert!(parsed.signature.is_empty());
}

#[test]
fn x5c_entries_decode_with_standard_alphabet() {
    let header = json!({"x5c": [STANDARD.encode([0x30, 0x82, 0xff]), STANDARD.encode([1u8])]});
    let parsed = parse_compact_jws(&token(&header, &json!({}), b"")).unwrap();
    assert_eq!(parsed.x5c_der().unwrap(), vec![vec![0x30, 0x82, 0xff], vec![1]]);
}

#[test]
fn missing_x5c_is_an_empty_chain() {
    let parsed = parse_compact_jws(&token(&json!({"alg": "ES256"}), &json!({}), b"")).unwrap();
    assert!(parsed.x5c_der().unwrap().is_empty());
}

#[test]
fn malformed_x5c_is_reported() {
    let parsed = parse_compact_jws(&token(&json!({"x5c": "abc"}), &json!({}), b"")).unwrap();
    assert!(matches!(parsed.x5c_der(), Err(X5cError::NotAnArray)));

    let parsed = parse_compact_jws(&token(&json!({"x5c": ["AAAA", 5]}), &json!({}), b"")).unwrap();
    assert!(matches!(parsed.x5c_der(), Err(X5cError::NotAString(1))));

    let parsed = parse_compact_jws(&token(&json!({"x5c": ["%%%"]}), &json!({}), b"")).unwrap();
    assert!(matches!(parsed.x5c_der(), Err(X5cError::Base64 { index: 0, .. })));
}
