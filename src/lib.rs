// bfc - hook-generating C++ source-to-source compiler
//
// Pipeline: configuration -> frontend (tree-sitter declaration tree) ->
// extractor (BIR) -> codegen (plugin header/source pair).

pub mod bir;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod extractor;
pub mod frontend;
pub mod matcher;
pub mod preprocessor;
pub mod utils;

pub use bir::{Bir, Hook, HookKind};
pub use compiler::Compiler;
pub use config::{Configuration, HookDescription, HookType, PluginConfig};
pub use error::{CompilerError, Result};
