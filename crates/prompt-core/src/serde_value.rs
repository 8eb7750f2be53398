use serde::{Deserialize, Serialize};

use crate::token::{ReferenceToken, Token};

const DEFAULT_SCHEMA: &str = "manos-prompt";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Versioned JSON wrapper for a prompt's token array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ReferenceToken>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl PromptValue {
    pub fn new(tokens: Vec<Token>, mode: Option<ReferenceToken>) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            mode,
            tokens,
        }
    }

    pub fn into_parts(self) -> (Vec<Token>, Option<ReferenceToken>) {
        (self.tokens, self.mode)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
