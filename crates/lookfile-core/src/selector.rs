//! Rule selectors
//!
//! A selector's kind is never declared: it is inferred from the literal
//! string when a rule table is built and stored alongside it.

use crate::pattern::{WildcardPattern, has_glob_metacharacters};
use crate::path::{PATH_SEPARATOR, path_contains};
use crate::{Error, Result};
use std::fmt;

/// How a selector string matches objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// Contains `/`: an ancestor path in the scene hierarchy
    Path,
    /// Contains a glob metacharacter: a wildcard searched in the object path
    Pattern,
    /// Anything else: an opaque label compared against object tags
    Tag,
}

impl SelectorKind {
    /// Classify a selector string
    pub fn classify(text: &str) -> Self {
        if text.contains(PATH_SEPARATOR) {
            Self::Path
        } else if has_glob_metacharacters(text) {
            Self::Pattern
        } else {
            Self::Tag
        }
    }

    /// Whether matches of this kind take part in the longest-match race
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Path | Self::Pattern)
    }
}

/// A classified selector
#[derive(Debug, Clone)]
pub struct Selector {
    text: String,
    kind: SelectorKind,
    /// Compiled wildcard, present only for pattern selectors
    pattern: Option<WildcardPattern>,
}

impl Selector {
    /// Classify `text` and compile it if it is a pattern
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::EmptySelector);
        }

        let kind = SelectorKind::classify(&text);
        let pattern = (kind == SelectorKind::Pattern).then(|| WildcardPattern::new(&text));

        Ok(Self { text, kind, pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Length of the selector string, used for longest-match precedence
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Test this selector against an object's path and tags
    pub fn matches(&self, path: &str, tags: &[String]) -> bool {
        match self.kind {
            SelectorKind::Path => path_contains(path, &self.text),
            SelectorKind::Pattern => self.pattern.as_ref().is_some_and(|p| p.is_match(path)),
            SelectorKind::Tag => tags.iter().any(|t| *t == self.text),
        }
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Selector {}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(SelectorKind::classify("/root/hero"), SelectorKind::Path);
        assert_eq!(SelectorKind::classify("/root/*"), SelectorKind::Path);
        assert_eq!(SelectorKind::classify("hero_*"), SelectorKind::Pattern);
        assert_eq!(SelectorKind::classify("leaf?"), SelectorKind::Pattern);
        assert_eq!(SelectorKind::classify("[ab]x"), SelectorKind::Pattern);
        assert_eq!(SelectorKind::classify("hero"), SelectorKind::Tag);
    }

    #[test]
    fn test_empty_selector_rejected() {
        assert!(matches!(Selector::new(""), Err(Error::EmptySelector)));
    }

    #[test]
    fn test_matching_by_kind() {
        let no_tags: Vec<String> = Vec::new();
        let path = Selector::new("/a/b").unwrap();
        assert!(path.matches("/a/b/c", &no_tags));
        assert!(!path.matches("/a/bc", &no_tags));

        let pattern = Selector::new("b?c").unwrap();
        assert!(pattern.matches("/a/bxc", &no_tags));

        let tag = Selector::new("hero").unwrap();
        assert!(tag.matches("/anything", &["hero".to_string()]));
        // Tags are never searched in the path
        assert!(!tag.matches("/a/hero", &no_tags));
    }
}
