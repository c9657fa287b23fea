//! Shell-style wildcard patterns
//!
//! Patterns follow `fnmatch` conventions: `*` matches any run of characters,
//! `?` matches a single character and `[...]` / `[!...]` are character
//! classes. The translated expression is searched for anywhere in the
//! subject rather than anchored to the whole string, so `foo/*` matches
//! `/root/foo/bar`.

use regex::Regex;

/// Characters that make a selector a wildcard pattern
pub const GLOB_METACHARACTERS: [char; 3] = ['*', '?', '['];

/// Check whether `text` contains any glob metacharacter
pub fn has_glob_metacharacters(text: &str) -> bool {
    text.contains(GLOB_METACHARACTERS)
}

/// Translate a shell pattern into regular expression source
///
/// An unterminated `[` degrades to a literal `\[`. Classes are copied with
/// backslashes doubled, `!` negation becomes `^`, and a leading `^` is
/// escaped so it stays literal.
pub fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;

        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                // `[]` and `[!]` are not valid classes; the `]` is content
                if j < n && chars[j] == '!' {
                    j += 1;
                }
                if j < n && chars[j] == ']' {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }

                if j >= n {
                    out.push_str("\\[");
                } else {
                    let stuff: String = chars[i..j].iter().collect::<String>().replace('\\', "\\\\");
                    i = j + 1;
                    out.push('[');
                    if let Some(rest) = stuff.strip_prefix('!') {
                        out.push('^');
                        out.push_str(rest);
                    } else if stuff.starts_with('^') {
                        out.push('\\');
                        out.push_str(&stuff);
                    } else {
                        out.push_str(&stuff);
                    }
                    out.push(']');
                }
            }
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out
}

/// A wildcard pattern compiled once and matched many times
///
/// Compilation failure is remembered rather than reported: a pattern that
/// cannot be compiled simply never matches.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Option<Regex>,
}

impl WildcardPattern {
    /// Translate and compile a shell pattern
    pub fn new(pattern: &str) -> Self {
        let translated = translate(pattern);
        let regex = match Regex::new(&translated) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::debug!("Wildcard '{}' does not compile ({}), it will never match", pattern, e);
                None
            }
        };

        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    /// The shell pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the translated expression compiled
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Search for the pattern anywhere in `subject`
    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(subject))
    }
}

/// One-shot wildcard match of `pattern` against `subject`
///
/// Never fails: malformed patterns either degrade to literals or do not match.
pub fn matches_wildcard(subject: &str, pattern: &str) -> bool {
    WildcardPattern::new(pattern).is_match(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_basic() {
        assert_eq!(translate("foo*"), "foo.*");
        assert_eq!(translate("a?c"), "a.c");
        assert_eq!(translate("a_b9"), "a_b9");
        assert_eq!(translate("/a.b"), "/a\\.b");
    }

    #[test]
    fn test_translate_classes() {
        assert_eq!(translate("[abc]"), "[abc]");
        assert_eq!(translate("[!abc]"), "[^abc]");
        assert_eq!(translate("[^a]"), "[\\^a]");
        assert_eq!(translate("[]a]"), "[]a]");
        assert_eq!(translate("[a\\b]"), "[a\\\\b]");
    }

    #[test]
    fn test_translate_unterminated_bracket() {
        assert_eq!(translate("["), "\\[");
        assert_eq!(translate("a[bc"), "a\\[bc");
    }

    #[test]
    fn test_wildcard_examples() {
        assert!(matches_wildcard("foo/bar", "foo/*"));
        assert!(matches_wildcard("foobar", "foo?ar"));
        assert!(!matches_wildcard("x", "["));
    }

    #[test]
    fn test_search_is_unanchored() {
        assert!(matches_wildcard("/root/world/hero_GEO", "hero*"));
        assert!(matches_wildcard("/root/world/hero_GEO", "GEO"));
        assert!(!matches_wildcard("/root/world/villain", "hero*"));
    }

    #[test]
    fn test_character_classes() {
        assert!(matches_wildcard("/set/tree3", "tree[0-9]"));
        assert!(!matches_wildcard("/set/treeX", "tree[0-9]"));
        assert!(matches_wildcard("/set/treeX", "tree[!0-9]"));
    }

    #[test]
    fn test_literal_bracket_matches_literally() {
        assert!(matches_wildcard("/a/[b", "[b"));
    }

    #[test]
    fn test_invalid_class_never_matches() {
        // `[z-a]` is a reversed range and does not compile
        let pattern = WildcardPattern::new("[z-a]");
        assert!(!pattern.is_valid());
        assert!(!pattern.is_match("z"));
    }

    #[test]
    fn test_glob_detection() {
        assert!(has_glob_metacharacters("hero*"));
        assert!(has_glob_metacharacters("a?"));
        assert!(has_glob_metacharacters("[ab]"));
        assert!(!has_glob_metacharacters("hero"));
    }
}
