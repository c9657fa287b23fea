//! Load and cache configuration
//!
//! Mirrors the parameters a host sets on the object that owns a rule file.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// How a rule file is read and which overrides are folded onto it
#[allow(clippy::struct_excessive_bools)] // Config structs naturally have many bool fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    // Section switches
    /// Ignore shader assignments entirely
    pub skip_shaders: bool,
    /// Ignore attribute overrides entirely
    pub skip_attributes: bool,
    /// Ignore displacement assignments entirely
    pub skip_displacements: bool,
    /// Ignore the document's layers
    pub skip_layers: bool,

    // Layers
    /// Name of the active layer, if any
    pub layer: Option<String>,
    /// JSON `{ "<layer>": { ... } }` merged into the document's layers
    pub layers_override: Option<String>,

    // Inline overrides
    /// JSON `{ "<shader>": ["<path>", ...] }`
    pub shaders_override: Option<String>,
    /// JSON `{ "<displacement>": ["<path>", ...] }`
    pub displacements_override: Option<String>,
    /// JSON `{ "<selector>": { "<attr>": value } }`
    pub attributes_override: Option<String>,

    // Sources
    /// Document deep-merged into the primary before sections are read
    pub secondary_file: Option<String>,
    /// Shader namespace; takes priority over the document's own
    pub namespace: Option<String>,
}

impl LoadOptions {
    /// The active layer, unless layers are skipped
    pub fn active_layer(&self) -> Option<&str> {
        if self.skip_layers {
            return None;
        }
        self.layer.as_deref().filter(|l| !l.is_empty())
    }

    /// Hash of every option that changes the loaded content
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Rule cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of loaded rule sets kept at once
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}
