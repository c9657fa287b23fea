//! # Lookfile Core
//!
//! Decides, for every object in a scene graph, which shader and which
//! attribute overrides apply to it.
//!
//! Rules are authored as JSON tables keyed by selector:
//!
//! - a **path** selector (contains `/`) matches the object and its descendants
//! - a **pattern** selector (`*`, `?`, `[...]`) is a wildcard searched in the path
//! - a **tag** selector matches objects carrying that tag
//!
//! ## Quick Start
//!
//! ```rust
//! use lookfile_core::prelude::*;
//! use serde_json::json;
//!
//! let table = AttributeTable::from_json(&json!({
//!     "/root/set": {"opaque": false},
//!     "/root/set/tree": {"opaque": true},
//!     "hero": {"matte": true},
//! }))?;
//!
//! let tree = ObjectIdentity::new("/root/set/tree/leaves", ["hero"]);
//! let bag = resolve(&tree, &table).value().cloned().unwrap_or_default();
//! assert_eq!(bag["opaque"], Value::Bool(true));
//! # Ok::<(), lookfile_core::Error>(())
//! ```
//!
//! ## Precedence
//!
//! Exactly one rule wins per object. The longest matching path or pattern
//! selector wins; a tag rule only wins when no path or pattern matches.
//!
//! ## Threading
//!
//! Tables are immutable once built. Matching, resolution and application
//! take no locks and do no I/O, so one table can serve many traversal
//! threads.

pub mod apply;
pub mod merge;
pub mod path;
pub mod pattern;
pub mod resolve;
pub mod selector;
pub mod table;
pub mod value;
pub mod visibility;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Matching
    pub use crate::path::{path_contains, tokenize_path};
    pub use crate::pattern::{WildcardPattern, matches_wildcard};
    pub use crate::selector::{Selector, SelectorKind};

    // Tables
    pub use crate::table::{AssignmentTable, AttributeTable, Rule, RuleTable};
    pub use crate::value::{Value, ValueBag};

    // Resolution
    pub use crate::resolve::{ObjectIdentity, Resolution, resolve, resolve_all};

    // Merging
    pub use crate::merge::{merge_attribute_overrides, merge_shader_assignments};

    // Application
    pub use crate::apply::{
        ApplyOptions, ApplyReport, ParamKind, ParameterSink, RayFlagMode, RayType, SkipReason,
        VisibilitySplit, apply_bag, apply_value, reconcile_visibility,
    };

    // Error handling
    pub use crate::{Error, Result};
}
