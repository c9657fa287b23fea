//! Rule resolution
//!
//! Resolution walks a [`RuleTable`] in insertion order and picks exactly one
//! winning rule for an object:
//!
//! - path and pattern selectors compete on selector length; the longest
//!   wins and equal lengths go to the later rule
//! - tag selectors only count while no path or pattern has matched, and
//!   any later path or pattern match replaces a tag winner
//!
//! The winner's value replaces, never merges with, earlier candidates.

use crate::selector::SelectorKind;
use crate::table::{Rule, RuleTable};
use rayon::prelude::*;

/// The object being resolved: its full scene-graph path and tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentity {
    pub path: String,
    pub tags: Vec<String>,
}

impl ObjectIdentity {
    pub fn new<I, S>(path: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Identity with no tags
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Outcome of resolving one object against a table
///
/// Borrows the winning rule from the table; it never owns it.
#[derive(Debug)]
pub enum Resolution<'t, T> {
    NoMatch,
    /// Won by a tag selector
    Tag(&'t Rule<T>),
    /// Won by a path or pattern selector
    Path(&'t Rule<T>),
}

impl<'t, T> Resolution<'t, T> {
    pub fn rule(&self) -> Option<&'t Rule<T>> {
        match self {
            Self::NoMatch => None,
            Self::Tag(rule) | Self::Path(rule) => Some(rule),
        }
    }

    pub fn value(&self) -> Option<&'t T> {
        self.rule().map(|r| &r.value)
    }

    pub fn selector(&self) -> Option<&'t str> {
        self.rule().map(|r| r.selector.as_str())
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

impl<T> Clone for Resolution<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resolution<'_, T> {}

/// Precedence state while walking a table
#[derive(Debug)]
pub enum ResolveState<'t, T> {
    NoneFound,
    TagFound(&'t Rule<T>),
    PathFound(&'t Rule<T>),
}

impl<T> Clone for ResolveState<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResolveState<'_, T> {}

impl<'t, T> ResolveState<'t, T> {
    /// Feed one matching rule through the precedence rules
    pub fn advance(self, rule: &'t Rule<T>) -> Self {
        match (self, rule.selector.kind()) {
            (Self::PathFound(current), kind) if kind.is_structural() => {
                if rule.selector.len() >= current.selector.len() {
                    Self::PathFound(rule)
                } else {
                    self
                }
            }
            (Self::PathFound(_), _) => self,
            (Self::NoneFound | Self::TagFound(_), SelectorKind::Tag) => Self::TagFound(rule),
            (Self::NoneFound | Self::TagFound(_), _) => Self::PathFound(rule),
        }
    }

    pub fn finish(self) -> Resolution<'t, T> {
        match self {
            Self::NoneFound => Resolution::NoMatch,
            Self::TagFound(rule) => Resolution::Tag(rule),
            Self::PathFound(rule) => Resolution::Path(rule),
        }
    }
}

/// Pick the winning rule of `table` for `identity`
pub fn resolve<'t, T>(identity: &ObjectIdentity, table: &'t RuleTable<T>) -> Resolution<'t, T> {
    let mut state = ResolveState::NoneFound;

    for rule in table.iter() {
        // Tags are not even tested once a structural match is in hand
        if rule.selector.kind() == SelectorKind::Tag && matches!(state, ResolveState::PathFound(_)) {
            continue;
        }
        if rule.selector.matches(&identity.path, &identity.tags) {
            state = state.advance(rule);
        }
    }

    let resolution = state.finish();
    if let Some(selector) = resolution.selector() {
        tracing::debug!("{} resolved by '{}'", identity.path, selector);
    }
    resolution
}

/// Resolve many objects against one table in parallel
///
/// The table is only read, so traversal workers can share it freely; the
/// results come back in input order.
pub fn resolve_all<'t, T>(identities: &[ObjectIdentity], table: &'t RuleTable<T>) -> Vec<Resolution<'t, T>>
where
    T: Sync,
{
    identities.par_iter().map(|identity| resolve(identity, table)).collect()
}
