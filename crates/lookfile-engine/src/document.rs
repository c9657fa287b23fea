//! Rule documents
//!
//! A rule document is the JSON file a look is exported to:
//!
//! ```json
//! {
//!     "namespace": "lookdev",
//!     "shaders": { "wood": ["/root/set/tree"] },
//!     "displacement": { "bark_disp": ["/root/set/tree/trunk"] },
//!     "attributes": { "/root/set": { "opaque": false } },
//!     "layers": {
//!         "beauty": {
//!             "removeShaders": false,
//!             "shaders": { "gold": ["/root/set/tree"] },
//!             "properties": { "hero": { "matte": true } }
//!         }
//!     }
//! }
//! ```
//!
//! Every section is optional.

use crate::config::LoadOptions;
use crate::error::{LoadError, Result};
use indexmap::IndexMap;
use lookfile_core::merge::{merge_attribute_overrides_into, merge_shader_assignments};
use lookfile_core::table::{AssignmentTable, AttributeTable};
use serde_json::Value;

/// A parsed rule document, before any option is applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDocument {
    pub shaders: AssignmentTable,
    pub displacements: AssignmentTable,
    pub attributes: AttributeTable,
    pub layers: IndexMap<String, Layer>,
    pub namespace: Option<String>,
}

impl RuleDocument {
    /// Parse a document from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        Self::from_value(&root)
    }

    /// Read the sections of an already parsed document
    pub fn from_value(root: &Value) -> Result<Self> {
        if !root.is_object() {
            return Err(LoadError::shape("<root>", "an object"));
        }

        let namespace = match root.get("namespace") {
            None | Some(Value::Null) => None,
            Some(Value::String(ns)) if ns.is_empty() => None,
            Some(Value::String(ns)) => Some(ns.clone()),
            Some(_) => return Err(LoadError::shape("namespace", "a string")),
        };

        Ok(Self {
            shaders: assignments(root, "shaders")?,
            displacements: assignments(root, "displacement")?,
            attributes: attributes(root, "attributes")?,
            layers: match section(root, "layers")? {
                Some(layers) => layers_from_json(layers)?,
                None => IndexMap::new(),
            },
            namespace,
        })
    }
}

/// Per-layer replacements for the document's sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub shaders: AssignmentTable,
    pub displacements: AssignmentTable,
    pub properties: AttributeTable,
    /// Replace rather than merge shaders; unset falls back to `skip_shaders`
    pub remove_shaders: Option<bool>,
    pub remove_displacements: Option<bool>,
    pub remove_properties: Option<bool>,
}

impl Layer {
    pub fn from_json(name: &str, json: &Value) -> Result<Self> {
        if !json.is_object() {
            return Err(LoadError::shape(format!("layers.{}", name), "an object"));
        }

        Ok(Self {
            shaders: assignments(json, "shaders")?,
            displacements: assignments(json, "displacements")?,
            properties: attributes(json, "properties")?,
            remove_shaders: flag(json, name, "removeShaders")?,
            remove_displacements: flag(json, name, "removeDisplacements")?,
            remove_properties: flag(json, name, "removeProperties")?,
        })
    }

    /// Fold an override of this same layer onto it
    ///
    /// The override's flags win, falling back to the skip options, never to
    /// this layer's own flags. Non-empty override sections merge in.
    pub fn merge_override(&mut self, overrides: &Layer, options: &LoadOptions) {
        self.remove_shaders = Some(overrides.remove_shaders.unwrap_or(options.skip_shaders));
        self.remove_displacements = Some(
            overrides
                .remove_displacements
                .unwrap_or(options.skip_displacements),
        );
        self.remove_properties = Some(overrides.remove_properties.unwrap_or(options.skip_attributes));

        if !overrides.shaders.is_empty() {
            self.shaders = merge_shader_assignments(&self.shaders, &overrides.shaders);
        }
        if !overrides.displacements.is_empty() {
            self.displacements = merge_shader_assignments(&self.displacements, &overrides.displacements);
        }
        if !overrides.properties.is_empty() {
            merge_attribute_overrides_into(&mut self.properties, &overrides.properties);
        }
    }

    pub fn removes_shaders(&self, options: &LoadOptions) -> bool {
        self.remove_shaders.unwrap_or(options.skip_shaders)
    }

    pub fn removes_displacements(&self, options: &LoadOptions) -> bool {
        self.remove_displacements.unwrap_or(options.skip_displacements)
    }

    pub fn removes_properties(&self, options: &LoadOptions) -> bool {
        self.remove_properties.unwrap_or(options.skip_attributes)
    }

    /// Fold this layer onto resolved sections
    ///
    /// Each non-empty section replaces its target when the matching remove
    /// flag is set, and merges into it otherwise.
    pub fn fold_into(
        &self,
        shaders: &mut AssignmentTable,
        displacements: &mut AssignmentTable,
        attributes: &mut AttributeTable,
        options: &LoadOptions,
    ) {
        if !self.shaders.is_empty() {
            *shaders = if self.removes_shaders(options) {
                self.shaders.clone()
            } else {
                merge_shader_assignments(shaders, &self.shaders)
            };
        }

        if !self.displacements.is_empty() {
            *displacements = if self.removes_displacements(options) {
                self.displacements.clone()
            } else {
                merge_shader_assignments(displacements, &self.displacements)
            };
        }

        if !self.properties.is_empty() {
            if self.removes_properties(options) {
                *attributes = self.properties.clone();
            } else {
                merge_attribute_overrides_into(attributes, &self.properties);
            }
        }
    }
}

/// Parse `{ "<layer>": { ... } }`
pub fn layers_from_json(json: &Value) -> Result<IndexMap<String, Layer>> {
    let root = json
        .as_object()
        .ok_or_else(|| LoadError::shape("layers", "an object"))?;

    root.iter()
        .map(|(name, layer)| Ok((name.clone(), Layer::from_json(name, layer)?)))
        .collect()
}

/// Merge `source` into `target`, recursing where both sides are objects
///
/// Anything else in `source` replaces the target value outright.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

fn section<'a>(root: &'a Value, name: &str) -> Result<Option<&'a Value>> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) if value.is_object() => Ok(Some(value)),
        Some(_) => Err(LoadError::shape(name, "an object")),
    }
}

fn assignments(root: &Value, name: &str) -> Result<AssignmentTable> {
    match section(root, name)? {
        Some(json) => Ok(AssignmentTable::from_json(json)?),
        None => Ok(AssignmentTable::default()),
    }
}

fn attributes(root: &Value, name: &str) -> Result<AttributeTable> {
    match section(root, name)? {
        Some(json) => Ok(AttributeTable::from_json(json)?),
        None => Ok(AttributeTable::default()),
    }
}

fn flag(json: &Value, layer: &str, name: &str) -> Result<Option<bool>> {
    match json.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(LoadError::shape(format!("layers.{}.{}", layer, name), "a boolean")),
    }
}
