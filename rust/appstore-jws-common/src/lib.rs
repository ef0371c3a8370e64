// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoding of compact-serialized JWS tokens.
//!
//! Nothing in this crate trusts the token: it only splits, base64-decodes and
//! JSON-parses the segments so later stages can decide whether to trust them.

pub mod compact_jws;
pub mod error;
pub mod header;

pub use compact_jws::{parse_compact_jws, ParsedJws, BASE64_URL};
pub use error::{DecodeError, X5cError};
pub use header::JwsHeader;
