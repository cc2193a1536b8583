//! Wildcard pattern matching for file selection.
//!
//! A pattern is a shell-style wildcard where `*` matches any run of
//! characters and `.` is literal. Patterns are anchored against the whole
//! relative path. Only those two characters are translated: any other regex
//! metacharacter reaches the regex engine as-is, so callers should stick to
//! plain glob patterns. This is a deliberate limitation of the pattern
//! language, not an escaping bug.

use regex::Regex;

use crate::error::SyncError;

/// A compiled, ordered set of inclusion patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    regexes: Vec<Regex>,
    patterns: Vec<String>,
}

impl PatternSet {
    /// Compile a pattern list. An empty list yields a set matching nothing.
    pub fn compile(patterns: &[String]) -> Result<Self, SyncError> {
        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(&wildcard_to_regex(pattern)).map_err(|e| {
                SyncError::Pattern {
                    pattern: pattern.clone(),
                    source: e,
                }
            })?;
            regexes.push(regex);
        }
        Ok(Self {
            regexes,
            patterns: patterns.to_vec(),
        })
    }

    /// Check whether a relative path matches any pattern in the set.
    pub fn matches(&self, path: &str) -> bool {
        self.regexes.iter().any(|regex| regex.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    /// Get the raw pattern strings.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Translate a wildcard pattern into an anchored regex.
fn wildcard_to_regex(pattern: &str) -> String {
    let translated = pattern.replace('.', "\\.").replace('*', ".*");
    format!("^{}$", translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> PatternSet {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        PatternSet::compile(&owned).unwrap()
    }

    #[test]
    fn test_star_matches_any_run() {
        let patterns = set(&["assets/*"]);

        assert!(patterns.matches("assets/a.png"));
        assert!(patterns.matches("assets/nested/b.png"));

        assert!(!patterns.matches("docs/readme.md"));
        assert!(!patterns.matches("assets"));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let patterns = set(&["*.png"]);

        assert!(patterns.matches("a.png"));
        assert!(patterns.matches("assets/a.png"));

        assert!(!patterns.matches("a.png.bak"));
    }

    #[test]
    fn test_dot_is_literal() {
        let patterns = set(&["a.png"]);

        assert!(patterns.matches("a.png"));
        assert!(!patterns.matches("azpng"));
    }

    #[test]
    fn test_any_pattern_suffices() {
        let patterns = set(&["assets/*", "*.bin"]);

        assert!(patterns.matches("assets/a.png"));
        assert!(patterns.matches("data/blob.bin"));
        assert!(!patterns.matches("src/main.rs"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let patterns = set(&[]);

        assert!(patterns.is_empty());
        assert!(!patterns.matches("anything"));
        assert!(!patterns.matches(""));
    }

    #[test]
    fn test_matching_is_stateless() {
        let patterns = set(&["assets/*"]);

        for _ in 0..3 {
            assert!(patterns.matches("assets/a.png"));
            assert!(!patterns.matches("docs/readme.md"));
        }
    }
}
