//! Comparison configuration.
//!
//! The options are an explicit value handed to every comparison entry
//! point; nothing is read from process-wide state.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::TypeKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "'{0}' is not a qualifier kind; only pointer, typedef, volatile, const and restrict can be ignored"
    )]
    NotAQualifier(TypeKind),
}

/// Options threaded through the structural equality engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Qualifier kinds treated as transparent: the comparison looks through
    /// them to the type they wrap.
    #[serde(default)]
    pub ignore_qualifiers: BTreeSet<TypeKind>,
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `const` as transparent (the classic `--ignore-const` switch).
    pub fn ignore_const(mut self) -> Self {
        self.ignore_qualifiers.insert(TypeKind::Const);
        self
    }

    pub fn ignoring(mut self, kind: TypeKind) -> Result<Self, ConfigError> {
        if !kind.is_qualifier() {
            return Err(ConfigError::NotAQualifier(kind));
        }
        self.ignore_qualifiers.insert(kind);
        Ok(self)
    }

    pub fn is_ignored(&self, kind: TypeKind) -> bool {
        self.ignore_qualifiers.contains(&kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.ignore_qualifiers.iter().find(|k| !k.is_qualifier()) {
            Some(kind) => Err(ConfigError::NotAQualifier(*kind)),
            None => Ok(()),
        }
    }
}

/// On-disk diff configuration (JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Optional description / notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Qualifier kinds to look through when comparing.
    #[serde(default)]
    pub ignore_qualifiers: BTreeSet<TypeKind>,
}

impl DiffConfig {
    pub fn compare_options(&self) -> Result<CompareOptions, ConfigError> {
        let options = CompareOptions { ignore_qualifiers: self.ignore_qualifiers.clone() };
        options.validate()?;
        Ok(options)
    }
}

/// Load a diff config JSON file from disk.
pub fn load_diff_config(path: &Path) -> Result<DiffConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read diff config at {}", path.display()))?;
    let config: DiffConfig =
        serde_json::from_str(&json).context("Failed to parse diff config JSON")?;
    config.compare_options().context("Invalid diff config")?;
    Ok(config)
}
