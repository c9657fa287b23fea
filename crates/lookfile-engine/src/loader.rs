//! Turning a rule file and its load options into the tables to resolve against
//!
//! Order of application:
//!
//! 1. the secondary document is deep-merged into the primary
//! 2. each section not skipped is read, and its inline override merged on top
//! 3. the active layer (after its own inline override) is folded in
//!
//! When the primary file cannot be loaded, the inline overrides alone form
//! the rules.

use crate::config::LoadOptions;
use crate::document::{Layer, RuleDocument, deep_merge, layers_from_json};
use crate::error::{LoadError, Result};
use lookfile_core::merge::{merge_attribute_overrides_into, merge_shader_assignments};
use lookfile_core::table::{AssignmentTable, AttributeTable};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The tables a rule file resolves to once every option is applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRules {
    pub attributes: AttributeTable,
    pub shaders: AssignmentTable,
    pub displacements: AssignmentTable,
    /// Namespace shader names are first looked up in
    pub namespace: Option<String>,
}

/// Load a rule file, falling back to the inline overrides if it is unreadable
///
/// Only malformed inline overrides are errors.
pub fn load_rules(path: &Path, options: &LoadOptions) -> Result<LoadedRules> {
    let secondary = options.secondary_file.as_deref().map(Path::new);

    match read_document(path, secondary) {
        Ok(document) => {
            tracing::info!("Loaded rules from {}", path.display());
            rules_from_document(document, options)
        }
        Err(e) => {
            tracing::warn!("{}; using inline overrides only", e);
            rules_from_overrides(options)
        }
    }
}

/// Read and parse a rule file, deep-merging an optional secondary file
///
/// A secondary file that cannot be read is ignored.
pub fn read_document(path: &Path, secondary: Option<&Path>) -> Result<RuleDocument> {
    let mut root = read_json(path)?;

    if let Some(secondary) = secondary {
        match read_json(secondary) {
            Ok(extra) => {
                tracing::debug!("Merging secondary rules from {}", secondary.display());
                deep_merge(&mut root, extra);
            }
            Err(e) => tracing::warn!("Ignoring secondary rule file: {}", e),
        }
    }

    RuleDocument::from_value(&root)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Apply load options to a parsed document
pub fn rules_from_document(document: RuleDocument, options: &LoadOptions) -> Result<LoadedRules> {
    let RuleDocument {
        shaders,
        displacements,
        attributes,
        mut layers,
        namespace,
    } = document;

    let mut rules = LoadedRules {
        namespace: options
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .or(namespace),
        ..Default::default()
    };

    if !options.skip_shaders {
        rules.shaders = with_assignment_override(shaders, options.shaders_override.as_deref())?;
    }
    if !options.skip_attributes {
        rules.attributes = attributes;
        if let Some(overrides) = parse_inline(options.attributes_override.as_deref(), AttributeTable::from_json)? {
            merge_attribute_overrides_into(&mut rules.attributes, &overrides);
        }
    }
    if !options.skip_displacements {
        rules.displacements =
            with_assignment_override(displacements, options.displacements_override.as_deref())?;
    }

    if let Some(name) = options.active_layer() {
        let mut layer = layers.shift_remove(name);

        if let Some(overrides) = inline_layer(name, options)? {
            layer
                .get_or_insert_with(Layer::default)
                .merge_override(&overrides, options);
        }

        if let Some(layer) = layer {
            tracing::debug!("Applying layer {}", name);
            layer.fold_into(
                &mut rules.shaders,
                &mut rules.displacements,
                &mut rules.attributes,
                options,
            );
        }
    }

    Ok(rules)
}

/// Build rules from the inline overrides alone
///
/// The active layer's remove flags decide which inline sections are kept,
/// then the layer is folded in as usual.
pub fn rules_from_overrides(options: &LoadOptions) -> Result<LoadedRules> {
    let layer = match options.active_layer() {
        Some(name) => inline_layer(name, options)?,
        None => None,
    };
    let skip_shaders = layer.as_ref().map_or(options.skip_shaders, |l| l.removes_shaders(options));
    let skip_displacements = layer
        .as_ref()
        .map_or(options.skip_displacements, |l| l.removes_displacements(options));
    let skip_attributes = layer
        .as_ref()
        .map_or(options.skip_attributes, |l| l.removes_properties(options));

    let mut rules = LoadedRules {
        namespace: options.namespace.clone().filter(|ns| !ns.is_empty()),
        ..Default::default()
    };

    if !skip_shaders {
        rules.shaders = parse_inline(options.shaders_override.as_deref(), AssignmentTable::from_json)?
            .unwrap_or_default();
    }
    if !skip_attributes {
        rules.attributes = parse_inline(options.attributes_override.as_deref(), AttributeTable::from_json)?
            .unwrap_or_default();
    }
    if !skip_displacements {
        rules.displacements =
            parse_inline(options.displacements_override.as_deref(), AssignmentTable::from_json)?
                .unwrap_or_default();
    }

    if let Some(layer) = layer {
        layer.fold_into(
            &mut rules.shaders,
            &mut rules.displacements,
            &mut rules.attributes,
            options,
        );
    }

    Ok(rules)
}

fn with_assignment_override(base: AssignmentTable, overrides: Option<&str>) -> Result<AssignmentTable> {
    match parse_inline(overrides, AssignmentTable::from_json)? {
        Some(overrides) if !overrides.is_empty() => Ok(merge_shader_assignments(&base, &overrides)),
        _ => Ok(base),
    }
}

/// The named layer from the `layers_override` option
fn inline_layer(name: &str, options: &LoadOptions) -> Result<Option<Layer>> {
    let layers = parse_inline(options.layers_override.as_deref(), |json| Ok(json.clone()))?;
    match layers {
        Some(json) => Ok(layers_from_json(&json)?.shift_remove(name)),
        None => Ok(None),
    }
}

/// Parse an inline JSON option; absent or blank text is `None`
fn parse_inline<T>(
    text: Option<&str>,
    parse: impl FnOnce(&Value) -> lookfile_core::Result<T>,
) -> Result<Option<T>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let json: Value = serde_json::from_str(text)?;
    Ok(Some(parse(&json)?))
}
