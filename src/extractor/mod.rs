//! Declaration-tree traversal and hook extraction.
//!
//! Walks the frontend's declaration tree, builds fully qualified names from
//! the namespace/class nesting, matches them against the configured hook
//! descriptions and produces the BIR. Configuration errors (a free-function
//! hook without a module, identifier collisions) abort the walk immediately;
//! unmatched patterns are collected over the whole traversal and reported
//! together.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::bir::{Bir, Hook, HookKind, Parameter};
use crate::config::HookDescription;
use crate::error::{CompilerError, Result};
use crate::frontend::{Decl, DeclKind, FunctionSignature, TranslationUnit};
use crate::matcher::WildcardMatcher;
use crate::utils::identifier::make_valid_identifier;

/// Per-description matching state for one extraction run.
struct HookMatchState {
    desc: HookDescription,
    matcher: WildcardMatcher,
    num_matches: u32,
}

impl HookMatchState {
    fn new(desc: HookDescription) -> Self {
        let matcher = WildcardMatcher::new(&desc.name);
        Self {
            desc,
            matcher,
            num_matches: 0,
        }
    }

    /// Does the provided qualified name match this description?
    fn matches(&mut self, name: &str) -> bool {
        let is_match = self.matcher.is_match(name);
        if is_match {
            self.num_matches += 1;
        }
        is_match
    }
}

/// Namespace and class qualifier stacks carried during the walk.
#[derive(Default)]
struct TraversalContext {
    namespaces: Vec<String>,
    classes: Vec<String>,
}

impl TraversalContext {
    /// The enclosing scope, `::`-joined, empty segments omitted.
    fn scope(&self) -> String {
        self.namespaces
            .iter()
            .chain(self.classes.iter())
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Fully qualified name of a declaration in the current scope.
    fn qualified_name(&self, name: &str) -> String {
        let scope = self.scope();
        if scope.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", scope, name)
        }
    }
}

/// Turns a declaration tree plus hook descriptions into a [`Bir`].
pub struct DeclarationExtractor {
    descriptions: Vec<HookMatchState>,
    relevant_inputs: HashSet<String>,
    visited: HashSet<String>,
    bir: Bir,
}

impl DeclarationExtractor {
    pub fn new(descriptions: &[HookDescription]) -> Self {
        let mut relevant_inputs = HashSet::new();
        for desc in descriptions {
            for input in &desc.input {
                relevant_inputs.insert(input.clone());
            }
        }
        Self {
            descriptions: descriptions
                .iter()
                .cloned()
                .map(HookMatchState::new)
                .collect(),
            relevant_inputs,
            visited: HashSet::new(),
            bir: Bir::new(),
        }
    }

    /// Visit all declarations of the translation unit and produce the BIR.
    ///
    /// Every description must match at least once; the unmatched ones are
    /// reported together in a single [`CompilerError::Extraction`].
    pub fn extract(mut self, tu: &TranslationUnit) -> Result<Bir> {
        for decl in &tu.decls {
            // Only consider declarations from one of the configured input
            // files; transitively included headers are skipped entirely.
            let file_name = Path::new(&decl.location.file)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.relevant_inputs.contains(&file_name) {
                let mut ctx = TraversalContext::default();
                self.visit(decl, &mut ctx)?;
            }
        }

        // Check we hooked all requested functions/methods.
        let unmatched: Vec<CompilerError> = self
            .descriptions
            .iter()
            .filter(|state| state.num_matches == 0)
            .map(|state| CompilerError::DescriptionNotFound(state.desc.name.clone()))
            .collect();
        if !unmatched.is_empty() {
            return Err(CompilerError::Extraction(unmatched));
        }

        debug!("extracted {} hooks", self.bir.len());
        Ok(self.bir)
    }

    fn visit(&mut self, decl: &Decl, ctx: &mut TraversalContext) -> Result<()> {
        // The tree may be cyclic or present the same declaration through
        // several paths; each cursor is processed at most once.
        if !self.visited.insert(decl.key()) {
            return Ok(());
        }

        match &decl.kind {
            DeclKind::Namespace => {
                ctx.namespaces.push(decl.name.clone());
                self.visit_children(decl, ctx)?;
                ctx.namespaces.pop();
            }
            DeclKind::Record(_) => {
                ctx.classes.push(decl.name.clone());
                self.visit_children(decl, ctx)?;
                ctx.classes.pop();
            }
            DeclKind::Function(sig) => {
                self.visit_function(decl, sig, ctx)?;
            }
            DeclKind::Other => {
                self.visit_children(decl, ctx)?;
            }
        }
        Ok(())
    }

    fn visit_children(&mut self, decl: &Decl, ctx: &mut TraversalContext) -> Result<()> {
        for child in &decl.children {
            self.visit(child, ctx)?;
        }
        Ok(())
    }

    fn visit_function(
        &mut self,
        decl: &Decl,
        sig: &FunctionSignature,
        ctx: &TraversalContext,
    ) -> Result<()> {
        let qualified = ctx.qualified_name(&decl.name);

        // Every description sees the match (its counter increments), but
        // only the first one registered emits a hook.
        let mut winner: Option<usize> = None;
        for (index, state) in self.descriptions.iter_mut().enumerate() {
            if state.matches(&qualified) && winner.is_none() {
                winner = Some(index);
            }
        }
        let Some(index) = winner else {
            return Ok(());
        };

        debug!(
            "hooking '{}' at {} via pattern '{}'",
            qualified, decl.location, self.descriptions[index].desc.name
        );
        let hook = build_hook(&self.descriptions[index].desc, sig, ctx, &qualified)?;
        self.bir.push(hook)
    }
}

/// Synthesize the BIR record for one matched declaration.
fn build_hook(
    desc: &HookDescription,
    sig: &FunctionSignature,
    ctx: &TraversalContext,
    qualified: &str,
) -> Result<Hook> {
    let identifier = make_valid_identifier(&if desc.identifier.is_empty() {
        qualified.replace("::", "_")
    } else {
        desc.identifier.clone()
    });

    let (kind, this_type, function_symbol_name) = if sig.is_method {
        let kind = if sig.is_virtual {
            HookKind::VirtualMethod
        } else {
            HookKind::FreeFunction
        };
        (kind, Some(ctx.scope()), None)
    } else {
        // A free function is resolved by symbol name out of its module, so
        // the module is required right here, not at generation time.
        if desc.module.is_empty() {
            return Err(CompilerError::MissingModule {
                desc: desc.name.clone(),
                name: qualified.to_string(),
            });
        }
        (HookKind::FreeFunction, None, Some(qualified.to_string()))
    };

    Ok(Hook {
        kind,
        identifier,
        return_type: sig.return_type.clone(),
        module: desc.module.clone(),
        includes: desc.input.clone(),
        function_symbol_name,
        this_type,
        parameters: sig
            .parameters
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                ty: p.ty.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HookType;
    use crate::frontend::{ParameterDecl, RecordKind, SourceLocation};

    fn loc(line: u32) -> SourceLocation {
        SourceLocation {
            file: "foo.h".to_string(),
            line,
            column: 0,
        }
    }

    fn function(name: &str, line: u32, is_method: bool, is_virtual: bool) -> Decl {
        Decl {
            kind: DeclKind::Function(FunctionSignature {
                return_type: "void".to_string(),
                parameters: vec![ParameterDecl {
                    name: "x".to_string(),
                    ty: "int".to_string(),
                }],
                is_method,
                is_virtual,
            }),
            name: name.to_string(),
            location: loc(line),
            children: Vec::new(),
        }
    }

    fn namespace(name: &str, line: u32, children: Vec<Decl>) -> Decl {
        Decl {
            kind: DeclKind::Namespace,
            name: name.to_string(),
            location: loc(line),
            children,
        }
    }

    fn class(name: &str, line: u32, children: Vec<Decl>) -> Decl {
        Decl {
            kind: DeclKind::Record(RecordKind::Class),
            name: name.to_string(),
            location: loc(line),
            children,
        }
    }

    fn desc(name: &str, kind: HookType, module: &str) -> HookDescription {
        HookDescription {
            name: name.to_string(),
            kind,
            identifier: String::new(),
            input: vec!["foo.h".to_string()],
            module: module.to_string(),
        }
    }

    fn sample_tu() -> TranslationUnit {
        TranslationUnit {
            decls: vec![namespace(
                "ns",
                1,
                vec![class("Foo", 2, vec![function("Bar", 3, true, true)])],
            )],
        }
    }

    #[test]
    fn virtual_method_becomes_virtual_method_hook() {
        let bir = DeclarationExtractor::new(&[desc("ns::Foo::Bar", HookType::Method, "")])
            .extract(&sample_tu())
            .unwrap();

        assert_eq!(bir.len(), 1);
        let hook = &bir.hooks()[0];
        assert_eq!(hook.kind, HookKind::VirtualMethod);
        assert_eq!(hook.identifier, "ns_Foo_Bar");
        assert_eq!(hook.this_type.as_deref(), Some("ns::Foo"));
        assert_eq!(hook.function_symbol_name, None);
        assert_eq!(hook.parameters.len(), 1);
        assert_eq!(hook.parameters[0].name, "x");
        assert_eq!(hook.parameters[0].ty, "int");
    }

    #[test]
    fn free_function_requires_module() {
        let tu = TranslationUnit {
            decls: vec![function("CreateWidget", 1, false, false)],
        };
        let err = DeclarationExtractor::new(&[desc("CreateWidget", HookType::Function, "")])
            .extract(&tu)
            .unwrap_err();
        assert!(matches!(err, CompilerError::MissingModule { .. }));
    }

    #[test]
    fn free_function_hook_carries_symbol_name() {
        let tu = TranslationUnit {
            decls: vec![namespace("ns", 1, vec![function("Create", 2, false, false)])],
        };
        let bir = DeclarationExtractor::new(&[desc("ns::Create", HookType::Function, "w.dll")])
            .extract(&tu)
            .unwrap();
        let hook = &bir.hooks()[0];
        assert_eq!(hook.kind, HookKind::FreeFunction);
        assert_eq!(hook.function_symbol_name.as_deref(), Some("ns::Create"));
        assert_eq!(hook.module, "w.dll");
    }

    #[test]
    fn non_virtual_method_is_hooked_by_address() {
        let tu = TranslationUnit {
            decls: vec![class("Foo", 1, vec![function("Bar", 2, true, false)])],
        };
        let bir = DeclarationExtractor::new(&[desc("Foo::Bar", HookType::Method, "")])
            .extract(&tu)
            .unwrap();
        let hook = &bir.hooks()[0];
        assert_eq!(hook.kind, HookKind::FreeFunction);
        assert_eq!(hook.function_symbol_name, None);
        assert_eq!(hook.this_type.as_deref(), Some("Foo"));
    }

    #[test]
    fn first_registered_pattern_wins_but_both_counters_see_the_match() {
        let tu = sample_tu();
        let descs = vec![
            desc("ns::Foo::*", HookType::Method, ""),
            desc("*::Bar", HookType::Method, ""),
        ];
        // Both patterns match ns::Foo::Bar; only one hook is emitted and no
        // "not found" error is raised for the second pattern.
        let bir = DeclarationExtractor::new(&descs).extract(&tu).unwrap();
        assert_eq!(bir.len(), 1);
        assert_eq!(bir.hooks()[0].identifier, "ns_Foo_Bar");
    }

    #[test]
    fn unmatched_descriptions_are_all_reported() {
        let descs = vec![
            desc("ns::Foo::Bar", HookType::Method, ""),
            desc("ns::Nope", HookType::Function, "m.dll"),
            desc("AlsoMissing", HookType::Function, "m.dll"),
        ];
        let err = DeclarationExtractor::new(&descs)
            .extract(&sample_tu())
            .unwrap_err();
        match err {
            CompilerError::Extraction(errors) => {
                assert_eq!(errors.len(), 2);
                let msg = errors.iter().map(|e| e.to_string()).collect::<String>();
                assert!(msg.contains("ns::Nope"));
                assert!(msg.contains("AlsoMissing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn declarations_from_unconfigured_files_are_skipped() {
        let mut tu = sample_tu();
        tu.decls[0].location.file = "unrelated.h".to_string();
        let err = DeclarationExtractor::new(&[desc("ns::Foo::Bar", HookType::Method, "")])
            .extract(&tu)
            .unwrap_err();
        assert!(matches!(err, CompilerError::Extraction(_)));
    }

    #[test]
    fn aliased_cursors_are_processed_once() {
        let repeated = function("Bar", 3, true, true);
        let tu = TranslationUnit {
            decls: vec![namespace(
                "ns",
                1,
                vec![class("Foo", 2, vec![repeated.clone(), repeated])],
            )],
        };
        let bir = DeclarationExtractor::new(&[desc("ns::Foo::Bar", HookType::Method, "")])
            .extract(&tu)
            .unwrap();
        assert_eq!(bir.len(), 1);
    }

    #[test]
    fn explicit_identifier_override_is_sanitized() {
        let mut d = desc("ns::Foo::Bar", HookType::Method, "");
        d.identifier = "my hook!".to_string();
        let bir = DeclarationExtractor::new(&[d]).extract(&sample_tu()).unwrap();
        assert_eq!(bir.hooks()[0].identifier, "my_hook_");
    }
}
