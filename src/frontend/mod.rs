//! Declaration tree consumed by the extractor.
//!
//! This is the contract with the parsing frontend: a tree of cursors, each
//! carrying a closed, tagged declaration kind decided once when the tree is
//! built. The extractor matches on [`DeclKind`] exhaustively, so adding a
//! new declaration kind is a compile-time-checked change.
//!
//! [`cpp`] provides a tree-sitter based adapter that builds this tree from
//! C/C++ header text.

pub mod cpp;

use serde::{Deserialize, Serialize};

/// Position of a declaration, used for diagnostics and for the structural
/// identity of visited cursors — never for matching logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One parameter of a function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    /// Full CV-qualified type text as written in the source.
    pub ty: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Class,
    Struct,
}

/// Signature data carried by function and method declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub return_type: String,
    pub parameters: Vec<ParameterDecl>,
    /// Declared inside a class or struct.
    pub is_method: bool,
    pub is_virtual: bool,
}

/// Closed set of declaration kinds the extractor distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Namespace,
    Record(RecordKind),
    Function(FunctionSignature),
    /// Anything else; treated as a transparent container so nested
    /// declarations (e.g. inside `extern "C"` blocks) are still reached.
    Other,
}

impl DeclKind {
    /// Short stable tag for visited-set keys.
    pub fn tag(&self) -> &'static str {
        match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Record(RecordKind::Class) => "class",
            DeclKind::Record(RecordKind::Struct) => "struct",
            DeclKind::Function(_) => "function",
            DeclKind::Other => "other",
        }
    }
}

/// One cursor of the declaration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub kind: DeclKind,
    pub name: String,
    pub location: SourceLocation,
    pub children: Vec<Decl>,
}

impl Decl {
    /// Structural identity of this cursor.
    ///
    /// The frontend may present the same underlying declaration through
    /// several paths (or as distinct wrapper objects), so identity is
    /// location + kind + name rather than reference identity.
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.location.file,
            self.location.line,
            self.location.column,
            self.kind.tag(),
            self.name
        )
    }
}

/// Root of a parsed header set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_key_distinguishes_kind_and_name() {
        let loc = SourceLocation {
            file: "foo.h".to_string(),
            line: 3,
            column: 0,
        };
        let ns = Decl {
            kind: DeclKind::Namespace,
            name: "ns".to_string(),
            location: loc.clone(),
            children: Vec::new(),
        };
        let class = Decl {
            kind: DeclKind::Record(RecordKind::Class),
            name: "ns".to_string(),
            location: loc,
            children: Vec::new(),
        };
        assert_ne!(ns.key(), class.key());
        assert_eq!(ns.key(), "foo.h:3:0:namespace:ns");
    }
}
