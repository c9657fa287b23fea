//! Lookfile Engine - Rule loading and per-object lookups for a scene
//!
//! The engine is a thin orchestration layer over lookfile-core: it reads rule
//! documents, applies load options, caches the result per file, binds shader
//! names to host handles and answers per-object questions during traversal.
//!
//! ## Example
//!
//! ```ignore
//! use lookfile_engine::{LoadOptions, Lookfile, ObjectIdentity};
//!
//! let look = Lookfile::open("look.json", &LoadOptions::default(), "", |name| {
//!     host.find_shader(name)
//! })?;
//!
//! let object = ObjectIdentity::new("/root/set/tree", ["hero"]);
//! if look.should_emit(&object, false) {
//!     if let Some(shader) = look.shader_for(&object) {
//!         host.assign(&object, shader);
//!     }
//!     look.apply_attributes(&object, &mut host.node(&object));
//! }
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod loader;

#[cfg(feature = "file-watcher")]
pub mod watch;

mod error;

use anyhow::{Context, Result, anyhow};
use lookfile_core::apply::{ApplyOptions, ApplyReport, ParameterSink, apply_bag};
use lookfile_core::resolve::{self, resolve};
use lookfile_core::table::{AttributeTable, RuleTable};
use lookfile_core::value::ValueBag;
use lookfile_core::visibility;
use std::path::Path;

// Re-export commonly used types from lookfile-core
pub use lookfile_core::apply::{ParamKind, RayFlagMode, SkipReason, VisibilitySplit};
pub use lookfile_core::resolve::{ObjectIdentity, Resolution};

// Re-export our own types
pub use cache::{RuleCache, SourceKey};
pub use config::{CacheConfig, LoadOptions};
pub use document::{Layer, RuleDocument};
pub use error::LoadError;
pub use loader::{LoadedRules, load_rules};

#[cfg(feature = "file-watcher")]
pub use watch::{CacheWatcher, WatchEvent};

/// Cache of loaded rule sets keyed by file and options
pub type LookCache = RuleCache<SourceKey, LoadedRules>;

/// Resolved look for one scene root
///
/// Holds the attribute table and the shader and displacement tables bound
/// to host handles of type `H`. Every lookup is read-only, so one `Lookfile`
/// can be shared across traversal threads.
#[derive(Debug, Clone)]
pub struct Lookfile<H> {
    attributes: AttributeTable,
    shaders: RuleTable<H>,
    displacements: RuleTable<H>,
    apply_options: ApplyOptions,
}

impl<H: Clone> Lookfile<H> {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Load a rule file and bind its shader names through `lookup`
    ///
    /// `name_prefix` is the host name of the object owning the rules; its
    /// namespace is the last place shader names are looked up.
    pub fn open<F>(path: impl AsRef<Path>, options: &LoadOptions, name_prefix: &str, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<H>,
    {
        let path = path.as_ref();
        let rules = load_rules(path, options)
            .with_context(|| format!("Failed to load rules for {}", path.display()))?;
        Ok(Self::from_rules(&rules, name_prefix, lookup))
    }

    /// Like [`Lookfile::open`], sharing the parsed rules through `cache`
    pub fn open_cached<F>(
        cache: &LookCache,
        path: impl AsRef<Path>,
        options: &LoadOptions,
        name_prefix: &str,
        lookup: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Option<H>,
    {
        let path = path.as_ref();
        let key = SourceKey::new(path, options);
        let rules = cache
            .get_or_load(&key, || load_rules(path, options))
            .ok_or_else(|| anyhow!("No rules available for {}", path.display()))?;
        Ok(Self::from_rules(&rules, name_prefix, lookup))
    }

    /// Bind already loaded rules
    pub fn from_rules<F>(rules: &LoadedRules, name_prefix: &str, mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<H>,
    {
        let namespace = rules.namespace.as_deref();

        Self {
            attributes: rules.attributes.clone(),
            shaders: rules.shaders.bind(namespace, name_prefix, &mut lookup),
            displacements: rules.displacements.bind(namespace, name_prefix, &mut lookup),
            apply_options: ApplyOptions::default(),
        }
    }

    /// Set how attributes are applied
    #[must_use]
    pub fn with_apply_options(mut self, options: ApplyOptions) -> Self {
        self.apply_options = options;
        self
    }
}

impl<H> Lookfile<H> {
    // ========================================================================
    // Lookups
    // ========================================================================

    /// Shader handle bound to the object's winning shader rule
    pub fn shader_for(&self, identity: &ObjectIdentity) -> Option<&H> {
        resolve(identity, &self.shaders).value()
    }

    /// Displacement handle bound to the object's winning displacement rule
    pub fn displacement_for(&self, identity: &ObjectIdentity) -> Option<&H> {
        resolve(identity, &self.displacements).value()
    }

    /// Attribute overrides of the object's winning attribute rule
    pub fn attributes_for(&self, identity: &ObjectIdentity) -> Option<&ValueBag> {
        resolve(identity, &self.attributes).value()
    }

    /// Apply the object's attribute overrides to `sink`
    ///
    /// Objects without a matching rule get an empty report.
    pub fn apply_attributes<S: ParameterSink + ?Sized>(&self, identity: &ObjectIdentity, sink: &mut S) -> ApplyReport {
        match self.attributes_for(identity) {
            Some(bag) => apply_bag(sink, bag, &self.apply_options),
            None => ApplyReport::default(),
        }
    }

    /// Attribute overrides for many objects at once, in input order
    pub fn resolve_all(&self, identities: &[ObjectIdentity]) -> Vec<Option<&ValueBag>> {
        resolve::resolve_all(identities, &self.attributes)
            .into_iter()
            .map(|resolution| resolution.value())
            .collect()
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Whether the object should be emitted at all
    ///
    /// An object hidden in the scene is only emitted when a path rule
    /// containing it sets `forceVisible`. A visible one is dropped when
    /// tagged display-only or when a containing path rule's `visibility`
    /// masks out every ray type.
    pub fn should_emit(&self, identity: &ObjectIdentity, authored_hidden: bool) -> bool {
        if authored_hidden {
            return visibility::forced_visibility(identity, &self.attributes) == Some(true);
        }
        if visibility::is_display_only(identity.tags.as_slice()) {
            return false;
        }
        if visibility::hidden_by_override(identity, &self.attributes) {
            tracing::debug!("Object {} is invisible", identity.path);
            return false;
        }
        true
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    pub fn shaders(&self) -> &RuleTable<H> {
        &self.shaders
    }

    pub fn displacements(&self) -> &RuleTable<H> {
        &self.displacements
    }

    pub fn apply_options(&self) -> &ApplyOptions {
        &self.apply_options
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lookfile_core::table::AssignmentTable;
    use serde_json::json;

    fn rules() -> LoadedRules {
        LoadedRules {
            attributes: AttributeTable::from_json(&json!({
                "/root/set": {"opaque": false},
                "/root/set/hidden": {"visibility": 0},
                "/root/set/proxy": {"forceVisible": true},
            }))
            .unwrap(),
            shaders: AssignmentTable::from_json(&json!({
                "wood": ["/root/set"],
                "missing": ["/root/set/rock"],
            }))
            .unwrap(),
            displacements: AssignmentTable::from_json(&json!({"bark": ["/root/set/tree"]})).unwrap(),
            namespace: Some("look".into()),
        }
    }

    fn lookup(name: &str) -> Option<&'static str> {
        match name {
            "look:wood" => Some("look:wood"),
            "bark" => Some("bark"),
            _ => None,
        }
    }

    #[test]
    fn test_lookups() {
        let look = Lookfile::from_rules(&rules(), "", lookup);
        let tree = ObjectIdentity::from_path("/root/set/tree");

        assert_eq!(look.shader_for(&tree), Some(&"look:wood"));
        assert_eq!(look.displacement_for(&tree), Some(&"bark"));
        assert!(look.attributes_for(&tree).is_some());

        // Unbound shader names leave their paths unassigned
        assert_eq!(look.shaders().len(), 1);
        assert!(look.shader_for(&ObjectIdentity::from_path("/elsewhere")).is_none());
    }

    #[test]
    fn test_should_emit() {
        let look = Lookfile::from_rules(&rules(), "", lookup);

        assert!(look.should_emit(&ObjectIdentity::from_path("/root/set/tree"), false));
        assert!(!look.should_emit(&ObjectIdentity::from_path("/root/set/hidden/a"), false));
        assert!(!look.should_emit(&ObjectIdentity::new("/root/set/tree", ["DISPLAY"]), false));
        assert!(look.should_emit(&ObjectIdentity::from_path("/root/set/proxy"), true));
        assert!(!look.should_emit(&ObjectIdentity::from_path("/root/set/tree"), true));
    }

    #[test]
    fn test_should_emit_uses_ancestor_rules() {
        let rules = LoadedRules {
            attributes: AttributeTable::from_json(&json!({
                "/root/proxy": {"forceVisible": true},
                "/root/proxy/box": {"opaque": false},
                "/root/set": {"visibility": 0},
                "/root/set/tree": {"opaque": true},
            }))
            .unwrap(),
            ..Default::default()
        };
        let look = Lookfile::from_rules(&rules, "", lookup);

        assert!(look.should_emit(&ObjectIdentity::from_path("/root/proxy/box"), true));
        assert!(!look.should_emit(&ObjectIdentity::from_path("/root/set/tree/x"), false));
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let look = Lookfile::from_rules(&rules(), "", lookup);
        let objects = [
            ObjectIdentity::from_path("/root/set/a"),
            ObjectIdentity::from_path("/nowhere"),
            ObjectIdentity::from_path("/root/set/hidden"),
        ];
        let bags = look.resolve_all(&objects);
        assert!(bags[0].unwrap().contains_key("opaque"));
        assert!(bags[1].is_none());
        assert!(bags[2].unwrap().contains_key("visibility"));
    }
}
