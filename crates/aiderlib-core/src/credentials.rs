//! Provider credential snapshots.
//!
//! The bridge never reads the process environment directly during
//! validation; callers hand it an `AmbientCredentials` snapshot instead.
//! `AmbientCredentials::from_env()` is the one documented fallback that
//! touches ambient state, and it is taken once, up front.

use std::env;

/// Credential variable consumed by aider for OpenAI-compatible endpoints.
/// This is also the variable overridden in the child environment when the
/// caller supplies both `api_base` and `api_key`.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Credential variable consumed by aider for Anthropic models.
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Credential variable consumed by aider for OpenRouter models.
pub const OPENROUTER_API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Snapshot of the provider credential variables.
#[derive(Debug, Clone, Default)]
pub struct AmbientCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
}

impl AmbientCredentials {
    /// Snapshot the provider variables from the process environment.
    ///
    /// Empty values are treated as absent.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: read_var(OPENAI_API_KEY_VAR),
            anthropic_api_key: read_var(ANTHROPIC_API_KEY_VAR),
            openrouter_api_key: read_var(OPENROUTER_API_KEY_VAR),
        }
    }

    /// True if any provider credential is present.
    ///
    /// Used by the CLI to warn when a request without `api_base` has no
    /// credential for any supported backend.
    pub fn has_any(&self) -> bool {
        self.openai_api_key.is_some()
            || self.anthropic_api_key.is_some()
            || self.openrouter_api_key.is_some()
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_none() {
        assert!(!AmbientCredentials::default().has_any());
    }

    #[test]
    fn test_has_any_with_single_key() {
        let creds = AmbientCredentials {
            anthropic_api_key: Some("sk-ant-test".to_string()),
            ..AmbientCredentials::default()
        };
        assert!(creds.has_any());
    }
}
