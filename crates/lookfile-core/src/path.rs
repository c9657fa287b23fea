//! Scene-graph path tokenization and ancestor containment

/// Separator used by scene-graph paths
pub const PATH_SEPARATOR: char = '/';

/// Split `path` on `separator`, discarding empty tokens
///
/// Leading, trailing and repeated separators therefore have no effect:
/// `"//a///b/"` tokenizes to `["a", "b"]`.
pub fn tokenize_path(path: &str, separator: char) -> Vec<&str> {
    path.split(separator).filter(|t| !t.is_empty()).collect()
}

/// Check whether `other` names `path` itself or one of its ancestors
///
/// Both paths are tokenized on `/`. The test is an order-sensitive,
/// case-sensitive prefix match over tokens, so `/a/bc` does not contain `/a/b`.
pub fn path_contains(path: &str, other: &str) -> bool {
    let mut parts = path.split(PATH_SEPARATOR).filter(|t| !t.is_empty());

    for expected in other.split(PATH_SEPARATOR).filter(|t| !t.is_empty()) {
        match parts.next() {
            Some(actual) if actual == expected => {}
            _ => return false,
        }
    }

    true
}
