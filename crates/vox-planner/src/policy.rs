//! The routing policy: the rulebook sent ahead of every utterance.
//!
//! Policies are plain text documents. Each one is fingerprinted with
//! SHA-256 so a logged plan can be tied to the exact rules that produced it.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use vox_config::PlannerConfig;

const BUILTIN_POLICY: &str = include_str!("../policy/router.md");

#[derive(Debug, Clone, PartialEq)]
pub enum PolicySource {
    BuiltIn,
    File(PathBuf),
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySource::BuiltIn => write!(f, "built-in"),
            PolicySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    text: String,
    fingerprint: String,
    source: PolicySource,
}

impl RoutingPolicy {
    pub fn builtin() -> Self {
        Self::from_text(BUILTIN_POLICY, PolicySource::BuiltIn)
    }

    pub fn from_text(text: impl Into<String>, source: PolicySource) -> Self {
        let text = text.into();
        let fingerprint = fingerprint(&text);
        Self {
            text,
            fingerprint,
            source,
        }
    }

    /// Load a replacement policy document
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
        if text.trim().is_empty() {
            anyhow::bail!("Policy file is empty: {}", path.display());
        }
        Ok(Self::from_text(text, PolicySource::File(path.to_path_buf())))
    }

    /// The configured policy file, or the built-in policy
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        match config.policy_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hex SHA-256 of the policy text
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// First 12 hex digits, for log lines
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..12]
    }

    pub fn source(&self) -> &PolicySource {
        &self.source
    }

    pub fn build_prompt(&self, utterance: &str) -> String {
        format!("{}\nUser: {}\nOutput:", self.text, utterance)
    }
}

fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
