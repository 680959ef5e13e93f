//! Compilation driver.
//!
//! Resolves the configured input headers, parses them, extracts the BIR and
//! emits the generated plugin pair. One [`Compiler`] run is fully
//! self-contained; no state is shared across runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::codegen::{self, GeneratedPlugin};
use crate::config::Configuration;
use crate::error::CompilerError;
use crate::extractor::DeclarationExtractor;
use crate::frontend::cpp;

pub struct Compiler {
    config: Configuration,
}

impl Compiler {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Load a configuration from a JSON file.
    pub fn from_config_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
        let config = Configuration::from_json(&text)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?;
        Ok(Self::new(config))
    }

    /// Run one full compilation: parse, extract, generate, emit.
    ///
    /// Nothing is written unless every stage succeeds; the emitted pair is
    /// returned for inspection.
    pub fn run(&self) -> anyhow::Result<GeneratedPlugin> {
        let sources = self.load_inputs()?;
        debug!("parsing {} input header(s)", sources.len());

        let tu = cpp::parse_translation_unit(&sources).context("Failed to parse input headers")?;

        let bir = DeclarationExtractor::new(&self.config.descriptions)
            .extract(&tu)
            .context("Failed to extract hooks")?;

        let generated = codegen::generate(&self.config.plugin, &bir)
            .context("Failed to generate plugin code")?;
        generated
            .write_to(&self.config.output_dir)
            .with_context(|| {
                format!(
                    "Failed to write outputs to {}",
                    self.config.output_dir.display()
                )
            })?;

        info!(
            "generated plugin '{}' with {} hook(s)",
            self.config.plugin.name,
            bir.len()
        );
        Ok(generated)
    }

    /// Read every configured input header, searching the include directories
    /// in order.
    fn load_inputs(&self) -> Result<Vec<(String, String)>, CompilerError> {
        let mut sources = Vec::new();
        for input in self.config.input_files() {
            let path = self
                .resolve_input(input)
                .ok_or_else(|| CompilerError::InputNotFound(input.to_string()))?;
            let content = fs::read_to_string(&path)?;
            sources.push((input.to_string(), content));
        }
        Ok(sources)
    }

    fn resolve_input(&self, input: &str) -> Option<PathBuf> {
        self.config
            .include_dirs
            .iter()
            .map(|dir| dir.join(input))
            .find(|candidate| candidate.is_file())
    }
}
