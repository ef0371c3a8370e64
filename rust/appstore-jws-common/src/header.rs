// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::X5cError;

/// JOSE header member carrying the certificate chain, leaf first.
pub const X5C: &str = "x5c";

/// JOSE header member naming the signature algorithm.
pub const ALG: &str = "alg";

/// Decoded JOSE header.
///
/// Kept as a raw JSON object: members are interpreted lazily so that a bad
/// `x5c` can be reported separately from a bad header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JwsHeader {
    members: Map<String, Value>,
}

impl JwsHeader {
    pub fn from_members(members: Map<String, Value>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &Map<String, Value> {
        &self.members
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// The `alg` member, if it is a string.
    pub fn algorithm(&self) -> Option<&str> {
        self.members.get(ALG).and_then(Value::as_str)
    }

    /// Decode the `x5c` member into DER certificates.
    ///
    /// A missing member yields an empty chain; entries use the standard
    /// (padded) base64 alphabet as required for `x5c`.
    pub fn x5c_der(&self) -> Result<Vec<Vec<u8>>, X5cError> {
        let entries = match self.members.get(X5C) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(X5cError::NotAnArray),
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let text = entry.as_str().ok_or(X5cError::NotAString(index))?;
                STANDARD
                    .decode(text)
                    .map_err(|source| X5cError::Base64 { index, source })
            })
            .collect()
    }
}
