//! Pragma-style version range parsing and best-match selection.
//!
//! Range expressions follow the Solidity pragma grammar: comparator sets
//! joined by `||`, each set a conjunction of constraints like
//! `>=0.5.0 <0.6.0` with operators `<`, `>`, `<=`, `>=`, `=` and `^`.

use solx_core::Version;
use std::fmt;

/// A single version constraint within a comparator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exact version: =0.5.0 (also the meaning of a bare version)
    Exact(Version),
    /// Greater than: >0.5.0
    GreaterThan(Version),
    /// Greater than or equal: >=0.5.0
    GreaterThanOrEqual(Version),
    /// Less than: <0.6.0
    LessThan(Version),
    /// Less than or equal: <=0.5.17
    LessThanOrEqual(Version),
    /// Caret: ^0.5.0 means >=0.5.0 <0.6.0 (leftmost non-zero component)
    Caret(Version),
}

impl Constraint {
    /// Check if a version satisfies this constraint.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(v) => version == v,
            Constraint::GreaterThan(v) => version > v,
            Constraint::GreaterThanOrEqual(v) => version >= v,
            Constraint::LessThan(v) => version < v,
            Constraint::LessThanOrEqual(v) => version <= v,
            Constraint::Caret(v) => version >= v && version < &caret_upper_bound(v),
        }
    }
}

/// The exclusive upper bound implied by a caret constraint.
fn caret_upper_bound(v: &Version) -> Version {
    if v.major > 0 {
        Version::new(v.major + 1, 0, 0)
    } else if v.minor > 0 {
        Version::new(0, v.minor + 1, 0)
    } else {
        Version::new(0, 0, v.patch + 1)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exact(v) => write!(f, "={}", v),
            Constraint::GreaterThan(v) => write!(f, ">{}", v),
            Constraint::GreaterThanOrEqual(v) => write!(f, ">={}", v),
            Constraint::LessThan(v) => write!(f, "<{}", v),
            Constraint::LessThanOrEqual(v) => write!(f, "<={}", v),
            Constraint::Caret(v) => write!(f, "^{}", v),
        }
    }
}

/// A conjunction of constraints, e.g. `>=0.5.0 <0.6.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorSet {
    pub constraints: Vec<Constraint>,
}

impl ComparatorSet {
    /// Check if a version satisfies every constraint in the set.
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }
}

/// A disjunction of comparator sets, e.g. `^0.5.0 || >=0.6.0 <0.7.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub sets: Vec<ComparatorSet>,
}

impl Range {
    /// Parse a pragma-style range expression.
    pub fn parse(expression: &str) -> Result<Self, RangeParseError> {
        let expression: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
        if expression.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let sets = expression
            .split("||")
            .map(parse_comparator_set)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sets })
    }

    /// Check if a version satisfies at least one comparator set.
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|s| s.matches(version))
    }

    /// Select the best matching candidate: the maximum version satisfying
    /// at least one comparator set, or `None` if nothing matches.
    ///
    /// Selection is a strict maximum, so identical inputs always yield
    /// the identical result regardless of candidate ordering.
    pub fn select<'a, I>(&self, candidates: I) -> Option<Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        candidates
            .into_iter()
            .filter(|v| self.matches(v))
            .max()
            .cloned()
    }
}

fn parse_comparator_set(set: &str) -> Result<ComparatorSet, RangeParseError> {
    let pattern = regex_lite::Regex::new(r"([<>]=?|=|\^)?(\d+\.\d+\.\d+)")
        .expect("constraint pattern is valid");

    let mut constraints = Vec::new();
    let mut consumed = 0;

    for captures in pattern.captures_iter(set) {
        let whole = captures.get(0).expect("match has a group 0");
        if whole.start() != consumed {
            return Err(RangeParseError::InvalidSet(set.to_string()));
        }
        consumed = whole.end();

        let version: Version = captures
            .get(2)
            .expect("version group always present")
            .as_str()
            .parse()
            .map_err(|_| RangeParseError::InvalidSet(set.to_string()))?;

        let constraint = match captures.get(1).map(|m| m.as_str()) {
            None | Some("=") => Constraint::Exact(version),
            Some(">") => Constraint::GreaterThan(version),
            Some(">=") => Constraint::GreaterThanOrEqual(version),
            Some("<") => Constraint::LessThan(version),
            Some("<=") => Constraint::LessThanOrEqual(version),
            Some("^") => Constraint::Caret(version),
            Some(op) => return Err(RangeParseError::UnknownOperator(op.to_string())),
        };
        constraints.push(constraint);
    }

    if constraints.is_empty() || consumed != set.len() {
        return Err(RangeParseError::InvalidSet(set.to_string()));
    }

    Ok(ComparatorSet { constraints })
}

/// Error parsing a range expression.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RangeParseError {
    #[error("empty range expression")]
    Empty,
    #[error("invalid comparator set: {0}")]
    InvalidSet(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(specs: &[&str]) -> Vec<Version> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_parse_single_set() {
        let range = Range::parse(">=0.5.0 <0.6.0").unwrap();
        assert_eq!(range.sets.len(), 1);
        assert_eq!(range.sets[0].constraints.len(), 2);
    }

    #[test]
    fn test_parse_disjunction() {
        let range = Range::parse("^0.5.0 || >=0.6.0 <0.7.0").unwrap();
        assert_eq!(range.sets.len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Range::parse("").is_err());
        assert!(Range::parse("banana").is_err());
        assert!(Range::parse(">=0.5").is_err());
        assert!(Range::parse("~0.5.0").is_err());
    }

    #[test]
    fn test_bare_version_means_exact() {
        let range = Range::parse("0.5.7").unwrap();
        assert!(range.matches(&"0.5.7".parse().unwrap()));
        assert!(!range.matches(&"0.5.8".parse().unwrap()));
    }

    #[test]
    fn test_caret_zero_minor() {
        let range = Range::parse("^0.5.0").unwrap();
        assert!(range.matches(&"0.5.0".parse().unwrap()));
        assert!(range.matches(&"0.5.17".parse().unwrap()));
        assert!(!range.matches(&"0.6.0".parse().unwrap()));
        assert!(!range.matches(&"0.4.26".parse().unwrap()));
    }

    #[test]
    fn test_caret_nonzero_major() {
        let range = Range::parse("^1.2.3").unwrap();
        assert!(range.matches(&"1.9.0".parse().unwrap()));
        assert!(!range.matches(&"2.0.0".parse().unwrap()));
        assert!(!range.matches(&"1.2.2".parse().unwrap()));
    }

    #[test]
    fn test_select_best_is_maximum() {
        let range = Range::parse("^0.5.0 || >=0.6.0 <0.7.0").unwrap();
        let candidates = versions(&["0.4.26", "0.5.0", "0.5.17", "0.6.12", "0.7.0", "0.8.1"]);
        assert_eq!(range.select(&candidates), Some("0.6.12".parse().unwrap()));
    }

    #[test]
    fn test_select_is_order_independent() {
        let range = Range::parse(">=0.5.0 <0.6.0").unwrap();
        let forward = versions(&["0.5.0", "0.5.7", "0.5.17"]);
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(range.select(&forward), range.select(&reversed));
        assert_eq!(range.select(&forward), Some("0.5.17".parse().unwrap()));
    }

    #[test]
    fn test_select_none_when_no_match() {
        let range = Range::parse(">=0.9.0").unwrap();
        let candidates = versions(&["0.5.0", "0.6.12"]);
        assert_eq!(range.select(&candidates), None);
    }
}
