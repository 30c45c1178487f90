//! Provider identifiers.

use claims_core::config::normalize_name;

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Anthropic,
    Bedrock,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_name(s).as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "bedrock" | "aws-bedrock" => Some(Self::Bedrock),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Bedrock => "bedrock",
        }
    }
}
