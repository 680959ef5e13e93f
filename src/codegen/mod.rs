//! Plugin code generation from the BIR.
//!
//! Builds the macro dictionary for a run, splices the runtime support
//! fragments into the header template, expands the structural namespace
//! markers through the preprocessor and emits the final header/source pair.
//! The header is always rewritten; the source skeleton is written only when
//! absent so user edits to the generated glue survive regeneration.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::bir::Bir;
use crate::config::PluginConfig;
use crate::error::{CompilerError, Result};
use crate::preprocessor::{expand_macros, MacroTable};
use crate::utils::identifier::make_valid_identifier;

const HEADER_TEMPLATE: &str = include_str!("../../templates/plugin_main.h");
const SOURCE_TEMPLATE: &str = include_str!("../../templates/plugin_main.cpp");
const RUNTIME_FRAGMENT: &str = include_str!("../../templates/plugin.h");
const FWD_FRAGMENT: &str = include_str!("../../templates/plugin_fwd.h");

/// Include directives in the templates that are replaced by the verbatim
/// fragment contents, so the generated header is self-contained.
const RUNTIME_INCLUDE: &str = "#include \"bifrost/api/plugin.h\"";
const FWD_INCLUDE: &str = "#include \"bifrost/template/plugin_fwd.h\"";

/// The only `#define` directives parsed out of the templates themselves.
const EXPANDED_MACROS: &[&str] = &["BIFROST_NAMESPACE_BEGIN", "BIFROST_NAMESPACE_END"];

/// Every key the templates may reference; verified before expansion.
const REQUIRED_MACROS: &[&str] = &[
    "BIFROST_PLUGIN_H_FILE",
    "BIFROST_PLUGIN_CPP_FILE",
    "BIFROST_PLUGIN_NAME",
    "BIFROST_PLUGIN_BASE",
    "BIFROST_PLUGIN_INCLUDE",
    "BIFROST_NAMESPACE",
    "BIFROST_PLUGIN_IDENTIFIER",
    "BIFROST_PLUGIN_IDENTIFIER_TO_STRING",
    "BIFROST_PLUGIN_STRING_TO_IDENTIFIER",
    "BIFROST_PLUGIN_IDENTIFIER_TO_FUNCTION_NAME",
    "BIFROST_PLUGIN_MODULE",
    "BIFROST_PLUGIN_MODULE_TO_STRING",
    "BIFROST_PLUGIN_IDENTIFIER_TO_MODULE",
    "BIFROST_PLUGIN_DSL_DEF",
    "BIFROST_PLUGIN_INCLUDES",
];

/// Expanded header/source pair plus their target file names.
#[derive(Debug, Clone)]
pub struct GeneratedPlugin {
    pub header_file: String,
    pub source_file: String,
    pub header: String,
    pub source: String,
}

impl GeneratedPlugin {
    /// Write the pair to `output_dir`.
    ///
    /// The header is always rewritten. The source file is the user-editable
    /// half and is only written when it does not exist yet.
    pub fn write_to(&self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir)?;

        let header_path = output_dir.join(&self.header_file);
        fs::write(&header_path, &self.header)?;
        debug!("wrote plugin header to {}", header_path.display());

        let source_path = output_dir.join(&self.source_file);
        if !source_path.exists() {
            fs::write(&source_path, &self.source)?;
            debug!("wrote plugin source to {}", source_path.display());
        }
        Ok(())
    }
}

/// Generate the plugin header and source for one run.
pub fn generate(plugin: &PluginConfig, bir: &Bir) -> Result<GeneratedPlugin> {
    let macros = create_macros(plugin, bir);
    for key in REQUIRED_MACROS {
        if macros.get(key).is_none() {
            return Err(CompilerError::MissingTemplateMacro(key.to_string()));
        }
    }

    let header = splice_includes(&(preamble(false) + HEADER_TEMPLATE));
    let source = preamble(true) + SOURCE_TEMPLATE;

    let header = expand_macros(&header, EXPANDED_MACROS, &macros);
    let source = expand_macros(&source, EXPANDED_MACROS, &macros);

    let required = |key: &str| -> Result<String> {
        macros
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| CompilerError::MissingTemplateMacro(key.to_string()))
    };
    Ok(GeneratedPlugin {
        header_file: required("BIFROST_PLUGIN_H_FILE")?,
        source_file: required("BIFROST_PLUGIN_CPP_FILE")?,
        header,
        source,
    })
}

/// Build the macro dictionary for one run, in a fixed key order.
fn create_macros(plugin: &PluginConfig, bir: &Bir) -> MacroTable {
    let plugin_name = make_valid_identifier(&plugin.name);
    let plugin_namespace = make_valid_identifier(&if plugin.namespace.is_empty() {
        plugin_name.to_lowercase()
    } else {
        plugin.namespace.clone()
    });
    let header_file = format!("{plugin_name}.h");
    let source_file = format!("{plugin_name}.cpp");

    let mut identifiers: Vec<String> = Vec::new();
    let mut string_to_identifier: Vec<String> = Vec::new();
    let mut identifier_to_function_name: Vec<String> = Vec::new();
    let mut identifier_to_module: Vec<String> = Vec::new();

    let mut includes: Vec<String> = Vec::new();
    let mut seen_includes = HashSet::new();

    // Each distinct module string gets one generated identifier, assigned
    // the first time it is seen.
    let mut modules: Vec<String> = Vec::new();
    let mut module_to_string: Vec<String> = Vec::new();
    let mut module_ids: HashMap<String, String> = HashMap::new();

    let mut dsl_defines: Vec<String> = Vec::new();

    for hook in bir.hooks() {
        identifiers.push(hook.identifier.clone());
        string_to_identifier.push(format!(
            "{{\"{0}\", Plugin::Identifier::{0}}}",
            hook.identifier
        ));
        identifier_to_function_name.push(match &hook.function_symbol_name {
            Some(symbol) => format!("\"{symbol}\""),
            None => "\"\"".to_string(),
        });

        for include in &hook.includes {
            let directive = format!("#include <{include}>");
            if seen_includes.insert(directive.clone()) {
                includes.push(directive);
            }
        }

        let module_id = match module_ids.get(&hook.module) {
            Some(id) => id.clone(),
            None => {
                let id = make_valid_identifier(&hook.module);
                module_ids.insert(hook.module.clone(), id.clone());
                modules.push(id.clone());
                module_to_string.push(hook.module.clone());
                id
            }
        };
        identifier_to_module.push(format!("Module::{module_id}"));

        // Per-hook DSL defines, addressed by namespace + identifier.
        let postfix = format!("{}__{}", plugin_namespace, hook.identifier);
        let arg_types = hook
            .parameters
            .iter()
            .map(|p| p.ty.clone())
            .collect::<Vec<_>>()
            .join(", ");
        let arg_decls = hook
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let arg_names = hook
            .parameters
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
            .join(", ");

        dsl_defines.push(format!("\n// {}", hook.identifier));
        dsl_defines.push(format!(
            "#define _bf_func_decl_ret_{postfix} {}",
            hook.return_type
        ));
        dsl_defines.push(format!("#define _bf_func_decl_args_{postfix} {arg_decls}"));
        dsl_defines.push(format!(
            "#define _bf_func_{postfix} (({} (*)({arg_types}))::{1}::Plugin::Get().GetHook<::{1}::Plugin::Identifier::{2}>()->GetOriginal())",
            hook.return_type, plugin_namespace, hook.identifier
        ));
        dsl_defines.push(format!("#define _bf_args_{postfix} {arg_names}"));
        for (i, parameter) in hook.parameters.iter().enumerate() {
            dsl_defines.push(format!(
                "#define _bf_arg_{}_{postfix} {}",
                i + 1,
                parameter.name
            ));
        }
    }

    [
        ("BIFROST_PLUGIN_H_FILE", header_file.clone()),
        ("BIFROST_PLUGIN_CPP_FILE", source_file),
        ("BIFROST_PLUGIN_NAME", plugin_name),
        ("BIFROST_PLUGIN_BASE", format!("::{plugin_namespace}::Plugin")),
        (
            "BIFROST_PLUGIN_INCLUDE",
            format!("#include \"{header_file}\""),
        ),
        ("BIFROST_NAMESPACE", plugin_namespace),
        (
            "BIFROST_PLUGIN_IDENTIFIER",
            identifiers.join(",") + ",",
        ),
        (
            "BIFROST_PLUGIN_IDENTIFIER_TO_STRING",
            format!("\"{}\",", identifiers.join("\",\"")),
        ),
        (
            "BIFROST_PLUGIN_STRING_TO_IDENTIFIER",
            string_to_identifier.join(","),
        ),
        (
            "BIFROST_PLUGIN_IDENTIFIER_TO_FUNCTION_NAME",
            identifier_to_function_name.join(",") + ",",
        ),
        ("BIFROST_PLUGIN_MODULE", modules.join(",") + ","),
        (
            "BIFROST_PLUGIN_MODULE_TO_STRING",
            format!("L\"{}\",", module_to_string.join("\",L\"")),
        ),
        (
            "BIFROST_PLUGIN_IDENTIFIER_TO_MODULE",
            identifier_to_module.join(",") + ",",
        ),
        ("BIFROST_PLUGIN_DSL_DEF", dsl_defines.join("\n")),
        ("BIFROST_PLUGIN_INCLUDES", includes.join("\n")),
    ]
    .into_iter()
    .collect()
}

/// Replace the two fixed include directives by the verbatim fragment
/// contents, stripping each fragment's own `#pragma once`.
fn splice_includes(content: &str) -> String {
    content
        .replace(RUNTIME_INCLUDE, strip_pragma_once(RUNTIME_FRAGMENT))
        .replace(FWD_INCLUDE, strip_pragma_once(FWD_FRAGMENT))
}

fn strip_pragma_once(fragment: &str) -> &str {
    match fragment.find("#pragma once") {
        Some(index) => &fragment[index + "#pragma once".len()..],
        None => fragment,
    }
}

fn preamble(editable: bool) -> String {
    let mut preamble = String::from("//\n");
    if !editable {
        preamble.push_str("// ================================================================\n");
        preamble.push_str("//           WARNING --- DO NOT EDIT THIS FILE --- WARNING\n");
        preamble.push_str("// ================================================================\n");
        preamble.push_str("//\n");
    }
    preamble.push_str(&format!(
        "// Generated by bfc ({})\n//\n",
        env!("CARGO_PKG_VERSION")
    ));
    preamble
}
