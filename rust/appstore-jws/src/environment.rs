// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::{Deserialize, Serialize};

/// App Store environment.
///
/// Unrecognised wire values are kept in [`Environment::Other`] so a payload
/// from a newer server still decodes and simply fails the environment match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Sandbox,
    Production,
    Xcode,
    LocalTesting,
    Other(String),
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Sandbox => "Sandbox",
            Environment::Production => "Production",
            Environment::Xcode => "Xcode",
            Environment::LocalTesting => "LocalTesting",
            Environment::Other(s) => s,
        }
    }

    /// Data from these environments is not signed by the App Store.
    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Xcode | Environment::LocalTesting)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Sandbox" => Environment::Sandbox,
            "Production" => Environment::Production,
            "Xcode" => Environment::Xcode,
            "LocalTesting" => Environment::LocalTesting,
            _ => Environment::Other(s),
        }
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Environment::from(s.to_string())
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
