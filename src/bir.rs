//! Bifrost Intermediate Representation.
//!
//! The BIR is the contract between declaration extraction and code
//! generation: an ordered collection of [`Hook`] records, one per intercepted
//! native symbol, created once per compilation run and immutable once the
//! extractor finishes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{CompilerError, Result};

/// Kind of hook.
///
/// Only two kinds are structurally distinguishable from an AST: non-member
/// functions and virtual class methods. Non-virtual methods are hooked by
/// address like free functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    FreeFunction,
    VirtualMethod,
}

/// One function or method parameter, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter argument.
    pub name: String,
    /// Full CV-qualified type text.
    #[serde(rename = "type")]
    pub ty: String,
}

/// Description of an individual hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub kind: HookKind,
    /// Unique identifier of this hook (valid as a C++ enum value).
    pub identifier: String,
    /// Return type of the method/function.
    pub return_type: String,
    /// Module (DLL) to load to obtain this function.
    pub module: String,
    /// Input headers required for the declaration.
    pub includes: Vec<String>,
    /// Symbol name used to resolve the function address; free functions
    /// only, methods have no standalone symbol name.
    pub function_symbol_name: Option<String>,
    /// Type of the `this` pointer; virtual-method hooks only.
    pub this_type: Option<String>,
    /// Parameters in the native declaration's order. This order drives both
    /// the generated signatures and positional argument macros.
    pub parameters: Vec<Parameter>,
}

/// Ordered collection of hooks produced by one extraction run.
#[derive(Debug, Default)]
pub struct Bir {
    hooks: Vec<Hook>,
    identifiers: HashSet<String>,
}

impl Bir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook, rejecting identifier collisions instead of silently
    /// overwriting.
    pub fn push(&mut self, hook: Hook) -> Result<()> {
        if !self.identifiers.insert(hook.identifier.clone()) {
            return Err(CompilerError::DuplicateIdentifier(hook.identifier));
        }
        self.hooks.push(hook);
        Ok(())
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
