//! Per-run configuration consumed by the compiler core.
//!
//! The schema mirrors the hook / plugin / output sections of the external
//! configuration loader; a serde-backed JSON loader is provided for tooling
//! and tests, the YAML front end stays out of scope.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CompilerError, Result};

/// The user's intent for a hook description; refined into the structural
/// [`crate::bir::HookKind`] by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    #[default]
    Function,
    Method,
}

/// One user-configured hook request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDescription {
    /// Fully qualified name of the function or class method to hook,
    /// including namespaces (e.g. `ID3D12GraphicsCommandList::Close`).
    /// `*` wildcards may be used to generate multiple hooks at once.
    pub name: String,

    /// The type of hook.
    #[serde(rename = "type", default)]
    pub kind: HookType,

    /// Identifier of the hook; needs to be a valid C/C++ enum value. By
    /// default the qualified name with `::` replaced by `_`.
    #[serde(default)]
    pub identifier: String,

    /// C/C++ input files which need to be included to obtain the
    /// declaration of this hook (e.g. `d3d12.h`).
    #[serde(default)]
    pub input: Vec<String>,

    /// Module (DLL) to obtain the address of the function; only required
    /// for function hooks.
    #[serde(default)]
    pub module: String,
}

/// Plugin metadata for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Name of the generated plugin.
    pub name: String,

    /// C++ namespace the generated code lives in; the lowercased plugin
    /// name when empty.
    #[serde(default)]
    pub namespace: String,
}

/// Full configuration for one compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Individual hook descriptions, in registration order. Order matters:
    /// a symbol matching several patterns is assigned to the first one.
    #[serde(default)]
    pub descriptions: Vec<HookDescription>,

    pub plugin: PluginConfig,

    /// Directories searched for the configured input headers.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Directory the generated header/source pair is written to.
    pub output_dir: PathBuf,
}

impl Configuration {
    /// Load and validate a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation; the deeper semantic checks (e.g. a module
    /// being required for a matched free function) happen during
    /// extraction where the declaration kind is known.
    pub fn validate(&self) -> Result<()> {
        for desc in &self.descriptions {
            if desc.name.is_empty() {
                return Err(CompilerError::InvalidDescription {
                    desc: desc.identifier.clone(),
                    reason: "name pattern must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The distinct input file names across all descriptions, in
    /// first-mention order.
    pub fn input_files(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut files = Vec::new();
        for desc in &self.descriptions {
            for input in &desc.input {
                if seen.insert(input.as_str()) {
                    files.push(input.as_str());
                }
            }
        }
        files
    }
}
