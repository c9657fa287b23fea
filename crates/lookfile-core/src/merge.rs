//! Folding override tables onto base tables
//!
//! Both merges run at table construction time, before any resolution.

use crate::table::{AssignmentTable, AttributeTable};
use crate::value::ValueBag;
use std::collections::HashSet;

/// Overlay attribute overrides onto a base attribute table
///
/// For each selector in `overrides`, its attributes overwrite the base's
/// same-named attributes one by one. Attributes the override does not name
/// keep their base values, and selectors absent from `overrides` are kept
/// unchanged. New selectors are appended in override order.
pub fn merge_attribute_overrides(base: &AttributeTable, overrides: &AttributeTable) -> AttributeTable {
    let mut merged = base.clone();
    merge_attribute_overrides_into(&mut merged, overrides);
    merged
}

/// In-place form of [`merge_attribute_overrides`]
pub fn merge_attribute_overrides_into(target: &mut AttributeTable, overrides: &AttributeTable) {
    for rule in overrides.iter() {
        let selector = rule.selector.as_str();
        if let Some(bag) = target.get_mut(selector) {
            for (name, value) in &rule.value {
                bag.insert(name.clone(), value.clone());
            }
        } else {
            let bag: ValueBag = rule.value.clone();
            // The selector already classified once, so this cannot fail
            if let Err(e) = target.insert(selector, bag) {
                tracing::debug!("Skipping override for '{}': {}", selector, e);
            }
        }
    }
}

/// Overlay shader (or displacement) reassignments onto base assignments
///
/// Any path named by any override is removed from every base list so it
/// ends up assigned exactly once, under the override's name. A name present
/// in both keeps the override's paths first, then its remaining base paths.
/// Merging with an empty override returns the base unchanged.
pub fn merge_shader_assignments(base: &AssignmentTable, overrides: &AssignmentTable) -> AssignmentTable {
    let reassigned: HashSet<&str> = overrides
        .iter()
        .flat_map(|(_, paths)| paths.iter().map(String::as_str))
        .collect();

    let mut merged = AssignmentTable::new();
    for (name, paths) in base.iter() {
        let kept = paths.iter().filter(|p| !reassigned.contains(p.as_str()));
        let replacement = overrides.paths(name).unwrap_or_default();
        merged.assign(name, replacement.iter().chain(kept).cloned());
    }

    for (name, paths) in overrides.iter() {
        if base.paths(name).is_none() {
            merged.assign(name, paths.iter().cloned());
        }
    }

    merged
}
