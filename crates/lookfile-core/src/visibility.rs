//! Object visibility decided by attribute rules
//!
//! These answer whether an object should be emitted at all, before any
//! attribute is applied to it. They look at every path rule containing the
//! object, not only the rule that wins resolution.

use crate::apply::{RAY_UNDEFINED, VISIBILITY};
use crate::resolve::ObjectIdentity;
use crate::selector::SelectorKind;
use crate::table::AttributeTable;
use crate::value::Value;

/// Attribute that forces hidden objects to be emitted anyway
pub const FORCE_VISIBLE: &str = "forceVisible";

/// Tag marking viewport-only objects that are never rendered
pub const DISPLAY_TAG: &str = "DISPLAY";

/// Values of `attribute` on every path rule containing the object, in table order
///
/// Unlike [`resolve`](crate::resolve::resolve), an ancestor rule still
/// counts when a deeper rule wins for the object's other attributes.
fn path_rule_values<'t>(
    identity: &ObjectIdentity,
    table: &'t AttributeTable,
    attribute: &'t str,
) -> impl Iterator<Item = &'t Value> {
    table
        .iter()
        .filter(|rule| rule.selector.kind() == SelectorKind::Path)
        .filter(move |rule| rule.selector.matches(&identity.path, &identity.tags))
        .filter_map(move |rule| rule.value.get(attribute))
}

/// `forceVisible` from the first path rule containing the object that sets it
pub fn forced_visibility(identity: &ObjectIdentity, table: &AttributeTable) -> Option<bool> {
    path_rule_values(identity, table, FORCE_VISIBLE)
        .next()
        .and_then(Value::as_bool)
}

/// Whether any path rule containing the object masks out every ray type
pub fn hidden_by_override(identity: &ObjectIdentity, table: &AttributeTable) -> bool {
    path_rule_values(identity, table, VISIBILITY)
        .filter_map(Value::as_i64)
        .any(|mask| mask <= i64::from(RAY_UNDEFINED))
}

/// Whether the tags mark a display-only object
pub fn is_display_only<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter().any(|t| t.as_ref() == DISPLAY_TAG)
}
