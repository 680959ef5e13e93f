//! Wildcard matching of fully qualified symbol names.
//!
//! A pattern is a literal string with zero or more `*` wildcards, e.g.
//! `ID3D12GraphicsCommandList::*` or `ns::*::Close`. Matching against a
//! candidate name is exact for wildcard-free patterns, uses cheap
//! prefix/suffix checks for a single wildcard, and falls back to an anchored
//! lazy regex (`.*?` between literal segments) for two or more.

use regex::Regex;

/// Matches a candidate string against a single `*`-wildcard pattern.
pub struct WildcardMatcher {
    segments: Vec<String>,
    regex: Option<Regex>,
}

impl WildcardMatcher {
    pub fn new(pattern: &str) -> Self {
        let segments: Vec<String> = pattern.split('*').map(str::to_string).collect();

        // The regex path is only taken for >= 2 wildcards; the literal
        // segments are escaped so names like "operator+" match verbatim.
        let regex = if segments.len() > 2 {
            let body = segments
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join(".*?");
            Some(Regex::new(&format!("^{}$", body)).unwrap())
        } else {
            None
        };

        Self { segments, regex }
    }

    /// Checks whether `input` matches the pattern.
    pub fn is_match(&self, input: &str) -> bool {
        // Quick checks
        if self.segments.len() == 1 {
            return self.segments[0] == input;
        }

        if self.segments.len() == 2 {
            let prefix = &self.segments[0];
            let suffix = &self.segments[1];

            return match (prefix.is_empty(), suffix.is_empty()) {
                (false, false) => input.starts_with(prefix) && input.ends_with(suffix),
                (true, false) => input.ends_with(suffix),
                (false, true) => input.starts_with(prefix),
                // this is "*"
                (true, true) => true,
            };
        }

        // Regex check
        self.regex
            .as_ref()
            .map(|re| re.is_match(input))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_without_wildcards() {
        let m = WildcardMatcher::new("ns::Foo::Bar");
        assert!(m.is_match("ns::Foo::Bar"));
        assert!(!m.is_match("ns::Foo::Baz"));
        assert!(!m.is_match("ns::Foo::Bar2"));
    }

    #[test]
    fn empty_pattern_matches_only_empty_input() {
        let m = WildcardMatcher::new("");
        assert!(m.is_match(""));
        assert!(!m.is_match("x"));
    }

    #[test]
    fn bare_star_matches_everything() {
        let m = WildcardMatcher::new("*");
        assert!(m.is_match(""));
        assert!(m.is_match("anything::at::all"));
    }

    #[test]
    fn prefix_wildcard() {
        let m = WildcardMatcher::new("foo*");
        assert!(m.is_match("foobar"));
        assert!(m.is_match("foo"));
        assert!(!m.is_match("fob"));
    }

    #[test]
    fn suffix_wildcard() {
        let m = WildcardMatcher::new("*foo");
        assert!(m.is_match("barfoo"));
        assert!(m.is_match("foo"));
        assert!(!m.is_match("foob"));
    }

    #[test]
    fn infix_wildcard_checks_both_ends() {
        let m = WildcardMatcher::new("foo*bar");
        assert!(m.is_match("foo123bar"));
        assert!(m.is_match("foobar"));
        assert!(!m.is_match("foo123baz"));
    }

    #[test]
    fn multiple_wildcards_fall_back_to_regex() {
        let m = WildcardMatcher::new("foo*bar*foo");
        assert!(m.is_match("foo2bar2foo"));
        assert!(!m.is_match("foo2bar2foo2"));
        assert!(m.is_match("foobarfoo"));
    }

    #[test]
    fn regex_metacharacters_in_segments_are_literal() {
        let m = WildcardMatcher::new("ns::Vec::operator+*x*");
        assert!(m.is_match("ns::Vec::operator+ x "));
        assert!(!m.is_match("ns::Vec::operatorQ x "));
    }

    #[test]
    fn class_method_wildcard() {
        let m = WildcardMatcher::new("ID3D12GraphicsCommandList::*");
        assert!(m.is_match("ID3D12GraphicsCommandList::Close"));
        assert!(!m.is_match("ID3D12CommandQueue::Close"));
    }
}
