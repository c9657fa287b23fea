//! Rule tables
//!
//! A [`RuleTable`] is an insertion-ordered selector to value mapping. Attribute
//! tables carry a [`ValueBag`] per selector; shader and displacement tables
//! carry whatever handle type the host binds names to. Tables are built once
//! per scene root and only read during traversal.

use crate::selector::Selector;
use crate::value::{ValueBag, bag_from_json};
use crate::{Error, Result};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// A selector paired with the value it assigns
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub selector: Selector,
    pub value: T,
}

/// Insertion-ordered mapping from selector to value
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: IndexMap<String, Rule<T>>,
}

/// Rule table of per-attribute overrides
pub type AttributeTable = RuleTable<ValueBag>;

impl<T> RuleTable<T> {
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Insert a rule, classifying its selector
    ///
    /// Re-inserting an existing selector replaces its value but keeps its
    /// first position in iteration order.
    pub fn insert(&mut self, selector: &str, value: T) -> Result<()> {
        match self.rules.entry(selector.to_string()) {
            Entry::Occupied(mut e) => {
                e.get_mut().value = value;
            }
            Entry::Vacant(e) => {
                let selector = Selector::new(selector)?;
                e.insert(Rule { selector, value });
            }
        }
        Ok(())
    }

    /// Value stored for an exact selector string
    pub fn get(&self, selector: &str) -> Option<&T> {
        self.rules.get(selector).map(|r| &r.value)
    }

    pub fn get_mut(&mut self, selector: &str) -> Option<&mut T> {
        self.rules.get_mut(selector).map(|r| &mut r.value)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.rules.contains_key(selector)
    }

    /// Remove a rule, preserving the order of the remaining ones
    pub fn remove(&mut self, selector: &str) -> Option<T> {
        self.rules.shift_remove(selector).map(|r| r.value)
    }

    /// Rules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Rule<T>> {
        self.rules.values()
    }

    /// Selector strings in insertion order
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T> Default for RuleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for RuleTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .rules
                .iter()
                .all(|(k, r)| other.get(k).is_some_and(|v| *v == r.value))
    }
}

impl AttributeTable {
    /// Build an attribute table from `{ "<selector>": { "<attr>": value } }`
    ///
    /// Empty selectors are skipped; non-scalar attribute values are dropped.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let root = json
            .as_object()
            .ok_or_else(|| Error::InvalidTable(format!("expected an object, found {}", json)))?;

        let mut table = Self::new();
        for (selector, bag) in root {
            let bag = bag.as_object().ok_or_else(|| {
                Error::InvalidTable(format!("attributes for '{}' must be an object", selector))
            })?;

            if selector.is_empty() {
                tracing::debug!("Skipping attribute rule with empty selector");
                continue;
            }
            table.insert(selector, bag_from_json(bag))?;
        }
        Ok(table)
    }

    /// Convert back to the JSON shape it was read from
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for rule in self.iter() {
            let bag = rule
                .value
                .iter()
                .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
                .collect();
            root.insert(rule.selector.as_str().to_string(), serde_json::Value::Object(bag));
        }
        serde_json::Value::Object(root)
    }
}

/// Shader or displacement assignments: handle name to the paths it applies to
///
/// This is the shape rule files author. [`AssignmentTable::bind`] turns it
/// into a [`RuleTable`] keyed by path once the host can resolve names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentTable {
    assignments: IndexMap<String, Vec<String>>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `{ "<name>": ["<path>", ...] }`, skipping non-string paths
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let root = json
            .as_object()
            .ok_or_else(|| Error::InvalidTable(format!("expected an object, found {}", json)))?;

        let mut table = Self::new();
        for (name, paths) in root {
            let paths = paths.as_array().ok_or_else(|| {
                Error::InvalidTable(format!("assignments for '{}' must be an array", name))
            })?;
            let paths = paths
                .iter()
                .filter_map(|p| p.as_str().map(str::to_string))
                .collect();
            table.assignments.insert(name.clone(), paths);
        }
        Ok(table)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.assignments
                .iter()
                .map(|(name, paths)| {
                    let paths = paths.iter().cloned().map(serde_json::Value::String).collect();
                    (name.clone(), serde_json::Value::Array(paths))
                })
                .collect(),
        )
    }

    /// Replace the path list of `name`, appending it if new
    pub fn assign<I, S>(&mut self, name: &str, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignments
            .insert(name.to_string(), paths.into_iter().map(Into::into).collect());
    }

    pub fn paths(&self, name: &str) -> Option<&[String]> {
        self.assignments.get(name).map(Vec::as_slice)
    }

    pub fn paths_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.assignments.get_mut(name)
    }

    /// Names and path lists in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.assignments.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assignments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Bind names to host handles and key the result by path
    ///
    /// Each name is looked up through [`handle_candidates`] until `lookup`
    /// returns a handle. Names that never resolve are skipped with a warning.
    /// A path assigned by several names keeps its first position and the
    /// handle of the last one.
    pub fn bind<H, F>(&self, namespace: Option<&str>, name_prefix: &str, mut lookup: F) -> RuleTable<H>
    where
        H: Clone,
        F: FnMut(&str) -> Option<H>,
    {
        let mut table = RuleTable::new();

        for (name, paths) in self.iter() {
            let handle = handle_candidates(name, namespace, name_prefix)
                .iter()
                .find_map(|candidate| lookup(candidate.as_str()));

            let Some(handle) = handle else {
                tracing::warn!("Can't find shader {}", name);
                continue;
            };

            tracing::debug!("Binding {} to {} path(s)", name, paths.len());
            for path in paths {
                if let Err(e) = table.insert(path, handle.clone()) {
                    tracing::debug!("Skipping assignment of {}: {}", name, e);
                }
            }
        }

        table
    }
}

/// Names to try, in order, when binding an assigned name to a host handle
///
/// 1. the name inside the rule namespace (`ns:name`)
/// 2. the bare name
/// 3. the bare name without a Maya `.message` plug suffix
/// 4. the name inside the namespace of the object prefix (`a:b:obj` → `a:b:name`)
pub fn handle_candidates(name: &str, namespace: Option<&str>, name_prefix: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    let mut push = |c: String| {
        if !candidates.contains(&c) {
            candidates.push(c);
        }
    };

    if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
        push(format!("{}:{}", ns.trim_end_matches(':'), name));
    }
    push(name.to_string());
    if let Some(stripped) = name.strip_suffix(".message") {
        push(stripped.to_string());
    }
    if let Some((prefix_ns, _)) = name_prefix.rsplit_once(':') {
        push(format!("{}:{}", prefix_ns, name));
    }

    candidates
}
