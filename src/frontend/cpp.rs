//! tree-sitter based C/C++ frontend.
//!
//! Parses header text and lowers the syntax tree into the frontend's
//! declaration tree. Only the declaration kinds the extractor cares about
//! are materialized; unknown containers (linkage specifications, template
//! declarations, preprocessor conditionals) become transparent [`DeclKind::Other`]
//! cursors so nested declarations are still reached.

use tree_sitter::{Node, Parser};

use super::{
    Decl, DeclKind, FunctionSignature, ParameterDecl, RecordKind, SourceLocation, TranslationUnit,
};
use crate::error::{CompilerError, Result};

/// Parse a set of `(file name, content)` pairs into one translation unit.
pub fn parse_translation_unit(sources: &[(String, String)]) -> Result<TranslationUnit> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_cpp::LANGUAGE.into())
        .map_err(|e| CompilerError::Frontend(format!("failed to load C++ grammar: {e}")))?;

    let mut decls = Vec::new();
    for (file, content) in sources {
        let tree = parser
            .parse(content.as_str(), None)
            .ok_or_else(|| CompilerError::Frontend(format!("failed to parse '{file}'")))?;
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if let Some(decl) = convert(child, content, file, false) {
                decls.push(decl);
            }
        }
    }
    Ok(TranslationUnit { decls })
}

/// Lower one syntax node. `in_record` is true inside a class or struct body,
/// where function declarations are methods.
fn convert(node: Node, source: &str, file: &str, in_record: bool) -> Option<Decl> {
    match node.kind() {
        "namespace_definition" => {
            // Anonymous namespaces keep an empty name; the extractor omits
            // empty segments when building qualified names.
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or_default();
            let children = node
                .child_by_field_name("body")
                .map(|body| convert_children(body, source, file, false))
                .unwrap_or_default();
            Some(Decl {
                kind: DeclKind::Namespace,
                name,
                location: location_of(node, file),
                children,
            })
        }
        "class_specifier" | "struct_specifier" => {
            let record = if node.kind() == "class_specifier" {
                RecordKind::Class
            } else {
                RecordKind::Struct
            };
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))?;
            let children = node
                .child_by_field_name("body")
                .map(|body| convert_children(body, source, file, true))
                .unwrap_or_default();
            Some(Decl {
                kind: DeclKind::Record(record),
                name,
                location: location_of(node, file),
                children,
            })
        }
        "function_definition" | "declaration" | "field_declaration" => {
            let declarator = find_function_declarator(node)?;
            let name_node = function_name_node(declarator)?;
            Some(Decl {
                kind: DeclKind::Function(FunctionSignature {
                    return_type: extract_return_type(node, source),
                    parameters: extract_parameters(declarator, source),
                    is_method: in_record,
                    is_virtual: has_virtual_specifier(node),
                }),
                name: node_text(name_node, source),
                location: location_of(node, file),
                children: Vec::new(),
            })
        }
        "linkage_specification" | "template_declaration" | "preproc_if" | "preproc_ifdef" => {
            // `extern "C" { ... }` wraps its declarations in a body node;
            // a braceless `extern "C"` carries the declaration directly.
            let children = match node.child_by_field_name("body") {
                Some(body) if body.kind() == "declaration_list" => {
                    convert_children(body, source, file, in_record)
                }
                Some(body) => convert(body, source, file, in_record).into_iter().collect(),
                None => convert_children(node, source, file, in_record),
            };
            Some(Decl {
                kind: DeclKind::Other,
                name: String::new(),
                location: location_of(node, file),
                children,
            })
        }
        _ => None,
    }
}

fn convert_children(node: Node, source: &str, file: &str, in_record: bool) -> Vec<Decl> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter_map(|child| convert(child, source, file, in_record))
        .collect()
}

fn node_text(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

fn location_of(node: Node, file: &str) -> SourceLocation {
    let pos = node.start_position();
    SourceLocation {
        file: file.to_string(),
        line: pos.row as u32 + 1,
        column: pos.column as u32,
    }
}

/// Find the `function_declarator` of a declaration, descending through
/// pointer and reference declarators (`int* foo()`, `T& bar()`).
fn find_function_declarator(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declarator" => return Some(child),
            "pointer_declarator" | "reference_declarator" => {
                if let Some(declarator) = find_function_declarator(child) {
                    return Some(declarator);
                }
            }
            _ => {}
        }
    }
    None
}

/// The node carrying the declared name inside a `function_declarator`.
fn function_name_node(declarator: Node) -> Option<Node> {
    let candidate = declarator.child_by_field_name("declarator")?;
    match candidate.kind() {
        "operator_name" | "destructor_name" | "field_identifier" | "identifier"
        | "qualified_identifier" => Some(candidate),
        _ => None,
    }
}

/// Base type text of a declaration: the `type` field plus any
/// `type_qualifier` siblings (`const`, `volatile`), in source order.
fn base_type_text(node: Node, source: &str) -> String {
    let type_node = node.child_by_field_name("type");
    let mut parts: Vec<String> = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let is_type = type_node.is_some_and(|t| t.id() == child.id());
        if is_type || child.kind() == "type_qualifier" {
            parts.push(node_text(child, source));
        }
    }
    parts.join(" ")
}

/// Pointer/reference decoration between a declaration and its innermost
/// declarator (`char**`, `T&`).
fn declarator_decoration(node: Node) -> String {
    let mut decoration = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "pointer_declarator" => {
                decoration.push('*');
                decoration.push_str(&declarator_decoration(child));
            }
            "reference_declarator" => {
                decoration.push('&');
                decoration.push_str(&declarator_decoration(child));
            }
            _ => {}
        }
    }
    decoration
}

/// Return type as written: base type plus pointer/reference decoration.
fn extract_return_type(node: Node, source: &str) -> String {
    let mut ty = base_type_text(node, source);
    ty.push_str(&declarator_decoration(node));
    ty
}

fn has_virtual_specifier(node: Node) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "virtual" {
            return true;
        }
    }
    false
}

fn extract_parameters(declarator: Node, source: &str) -> Vec<ParameterDecl> {
    let Some(list) = declarator.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.children(&mut cursor)
        .filter(|c| {
            c.kind() == "parameter_declaration" || c.kind() == "optional_parameter_declaration"
        })
        .filter_map(|param| {
            let mut ty = base_type_text(param, source);
            if ty.is_empty() {
                return None;
            }
            let mut name = String::new();
            if let Some(decl) = param.child_by_field_name("declarator") {
                let (decoration, identifier) = unwrap_declarator(decl, source);
                ty.push_str(&decoration);
                name = identifier;
            }
            Some(ParameterDecl { name, ty })
        })
        .collect()
}

/// Peel pointer/reference declarators off a parameter declarator, returning
/// the accumulated `*`/`&` decoration and the declared identifier (empty for
/// unnamed parameters).
fn unwrap_declarator(node: Node, source: &str) -> (String, String) {
    match node.kind() {
        "identifier" => (String::new(), node_text(node, source)),
        "pointer_declarator" | "reference_declarator" => {
            let decoration = if node.kind() == "pointer_declarator" {
                "*"
            } else {
                "&"
            };
            let inner = node
                .child_by_field_name("declarator")
                .or_else(|| node.named_child(0));
            match inner {
                Some(inner) => {
                    let (rest, name) = unwrap_declarator(inner, source);
                    (format!("{decoration}{rest}"), name)
                }
                None => (decoration.to_string(), String::new()),
            }
        }
        _ => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> TranslationUnit {
        parse_translation_unit(&[("sample.h".to_string(), content.to_string())]).unwrap()
    }

    fn find<'a>(decls: &'a [Decl], name: &str) -> &'a Decl {
        decls
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("no declaration named '{name}'"))
    }

    #[test]
    fn namespaces_classes_and_methods_nest() {
        let tu = parse(
            r#"
            namespace ns {
            class Foo {
             public:
              virtual int Bar(int x);
              void Plain();
            };
            }
            "#,
        );
        let ns = find(&tu.decls, "ns");
        assert_eq!(ns.kind, DeclKind::Namespace);
        let class = find(&ns.children, "Foo");
        assert!(matches!(class.kind, DeclKind::Record(RecordKind::Class)));

        let bar = find(&class.children, "Bar");
        let DeclKind::Function(sig) = &bar.kind else {
            panic!("Bar is not a function");
        };
        assert!(sig.is_method);
        assert!(sig.is_virtual);
        assert_eq!(sig.return_type, "int");
        assert_eq!(sig.parameters.len(), 1);
        assert_eq!(sig.parameters[0].name, "x");
        assert_eq!(sig.parameters[0].ty, "int");

        let plain = find(&class.children, "Plain");
        let DeclKind::Function(sig) = &plain.kind else {
            panic!("Plain is not a function");
        };
        assert!(sig.is_method);
        assert!(!sig.is_virtual);
    }

    #[test]
    fn free_function_with_pointer_types() {
        let tu = parse("const char* Describe(unsigned int* count, Widget& w);\n");
        let func = find(&tu.decls, "Describe");
        let DeclKind::Function(sig) = &func.kind else {
            panic!("not a function");
        };
        assert!(!sig.is_method);
        assert_eq!(sig.return_type, "const char*");
        assert_eq!(sig.parameters[0].ty, "unsigned int*");
        assert_eq!(sig.parameters[0].name, "count");
        assert_eq!(sig.parameters[1].ty, "Widget&");
        assert_eq!(sig.parameters[1].name, "w");
    }

    #[test]
    fn extern_c_block_is_transparent() {
        let tu = parse("extern \"C\" {\nvoid CreateWidget(int id);\n}\n");
        let block = &tu.decls[0];
        assert_eq!(block.kind, DeclKind::Other);
        let func = find(&block.children, "CreateWidget");
        assert!(matches!(func.kind, DeclKind::Function(_)));
    }

    #[test]
    fn anonymous_namespace_has_empty_name() {
        let tu = parse("namespace {\nvoid Hidden();\n}\n");
        let ns = &tu.decls[0];
        assert_eq!(ns.kind, DeclKind::Namespace);
        assert_eq!(ns.name, "");
        assert_eq!(ns.children[0].name, "Hidden");
    }

    #[test]
    fn locations_are_one_based_lines() {
        let tu = parse("\n\nvoid Third();\n");
        let func = find(&tu.decls, "Third");
        assert_eq!(func.location.line, 3);
        assert_eq!(func.location.column, 0);
        assert_eq!(func.location.file, "sample.h");
    }

    #[test]
    fn variable_declarations_are_ignored() {
        let tu = parse("int counter;\nvoid Real();\n");
        assert_eq!(tu.decls.len(), 1);
        assert_eq!(tu.decls[0].name, "Real");
    }
}
