//! Ordered include/exclude filename rules.
//!
//! Rules are written as `+ <glob>` or `- <glob>` (the space is optional).
//! For each path the last matching rule wins; a path that matches no rule
//! is excluded. Globs use shell semantics against the whole relative path,
//! so `*` also crosses `/`.

use glob::{MatchOptions, Pattern};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Include,
    Exclude,
}

/// One compiled `+`/`-` rule.
#[derive(Debug, Clone)]
pub struct FilterRule {
    pub sign: Sign,
    pattern: Pattern,
}

impl FilterRule {
    /// Parse a rule such as `+ *.py` or `-tests/*`.
    ///
    /// Errors carry a human readable reason; callers wrap it into a
    /// configuration error naming the linter.
    pub fn parse(rule: &str) -> Result<Self, String> {
        let rule = rule.trim();
        let mut chars = rule.chars();
        let sign = match chars.next() {
            Some('+') => Sign::Include,
            Some('-') => Sign::Exclude,
            _ => return Err("rule must start with '+' or '-'".to_string()),
        };
        let glob = chars.as_str().trim();
        if glob.is_empty() {
            return Err("rule has no pattern".to_string());
        }
        let pattern = Pattern::new(glob).map_err(|e| e.to_string())?;
        Ok(Self { sign, pattern })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Include => '+',
            Sign::Exclude => '-',
        };
        write!(f, "{} {}", sign, self.pattern.as_str())
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// An immutable ordered list of rules.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    rules: Vec<FilterRule>,
}

impl FileFilter {
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// Compile textual rules, failing on the first bad one.
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self, (String, String)> {
        let rules = rules
            .iter()
            .map(|r| FilterRule::parse(r.as_ref()).map_err(|e| (r.as_ref().to_string(), e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Outcome for a single path.
    pub fn accepts(&self, path: &str) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .is_some_and(|rule| rule.sign == Sign::Include)
    }

    /// Keep the candidates this filter accepts, in input order.
    pub fn select<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| self.accepts(path))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(rules: &[&str]) -> FileFilter {
        FileFilter::parse(rules).unwrap()
    }

    #[test]
    fn last_matching_rule_wins_and_order_is_kept() {
        let f = filter(&["+*.py", "-test_*.py"]);
        assert_eq!(f.select(&["a.py", "test_a.py", "a.txt"]), vec!["a.py"]);
    }

    #[test]
    fn later_include_overrides_earlier_exclude() {
        let f = filter(&["- tests/*", "+ *.py"]);
        assert_eq!(f.select(&["tests/t.py", "x.py", "tests/data.txt"]), vec!["tests/t.py", "x.py"]);
    }

    #[test]
    fn no_match_means_excluded() {
        let f = filter(&["+ *.yml"]);
        assert!(f.select(&["a.py", "b.yaml"]).is_empty());
        assert!(FileFilter::default().select(&["a.py"]).is_empty());
    }

    #[test]
    fn star_matches_across_directories() {
        let f = filter(&["+ *.py"]);
        assert!(f.accepts("pkg/sub/mod.py"));
        let f = filter(&["+ scripts/*"]);
        assert!(f.accepts("scripts/tools/run"));
        assert!(!f.accepts("other/scripts/run"));
    }

    #[test]
    fn select_is_deterministic() {
        let f = filter(&["+ *", "- *.md"]);
        let input = ["b.rs", "README.md", "a.rs"];
        assert_eq!(f.select(&input), f.select(&input));
        assert_eq!(f.select(&input), vec!["b.rs", "a.rs"]);
    }

    #[test]
    fn rejects_unsigned_and_invalid_rules() {
        assert!(FilterRule::parse("*.py").is_err());
        assert!(FilterRule::parse("+ ").is_err());
        assert!(FilterRule::parse("+ [").is_err());
        let err = FileFilter::parse(&["+ *.py", "oops"]).unwrap_err();
        assert_eq!(err.0, "oops");
    }

    #[test]
    fn display_round_trips_rule_text() {
        assert_eq!(FilterRule::parse("-test_*.py").unwrap().to_string(), "- test_*.py");
    }
}
