//! Name-matching predicates: glob, regex, and bounded-edit-distance (fuzzy).
//!
//! All three builders compile once and produce an immutable predicate that
//! is safely shareable across volumes and worker threads — the coordinator
//! hands every search driver the same `Arc<Predicate>` rather than
//! recompiling per volume.
//!
//! Matching is always case-insensitive and treats the name as a single line,
//! per the source behaviour this system preserves.

use crate::error::{PredicateError, Result};
use regex::Regex;

/// A compiled, immutable name predicate.
///
/// Modeled as a tagged variant rather than a trait object: the source picks
/// glob/regex/fuzzy dynamically per call via an open lambda, which this
/// rewrites into a single enum selected once per run (see the distilled
/// spec's design notes on dynamic predicate composition).
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Shell-style glob (`*`, `?`), compiled to an anchored, case-insensitive
    /// regex.
    Glob(Regex),
    /// A user-supplied regex, used verbatim (no anchors added).
    Regex(Regex),
    /// Bounded Levenshtein distance from a query string.
    Fuzzy { query: Vec<u16>, max_distance: u8 },
}

impl Predicate {
    /// Compile a glob pattern (`*` = any run of characters, `?` = exactly one
    /// character) into an anchored, case-insensitive predicate.
    ///
    /// Every regex metacharacter in `pattern` is escaped first; only then are
    /// the escaped `\*`/`\?` sequences rewritten to `.*`/`.`, so a literal
    /// `.` or `+` in the glob stays literal.
    pub fn glob(pattern: &str) -> Result<Self> {
        let escaped = regex::escape(pattern);
        let rewritten = escaped.replace(r"\*", ".*").replace(r"\?", ".");
        let anchored = format!("(?i)^{}$", rewritten);
        let regex = Regex::new(&anchored).map_err(|e| PredicateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Predicate::Glob(regex))
    }

    /// Compile a raw regex pattern, used verbatim. The caller supplies their
    /// own anchors if they want them; only case-insensitivity is added.
    pub fn regex(pattern: &str) -> Result<Self> {
        let with_flags = format!("(?i){}", pattern);
        let regex = Regex::new(&with_flags).map_err(|e| PredicateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Predicate::Regex(regex))
    }

    /// Build a fuzzy predicate matching names within `max_distance` edits of
    /// `query` (case-insensitive, compared by UTF-16 code unit).
    pub fn fuzzy(query: &str, max_distance: u8) -> Self {
        Predicate::Fuzzy {
            query: query.to_lowercase().encode_utf16().collect(),
            max_distance,
        }
    }

    /// Test a decoded file or folder name against this predicate.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Predicate::Glob(re) | Predicate::Regex(re) => re.is_match(name),
            Predicate::Fuzzy {
                query,
                max_distance,
            } => {
                let name_units: Vec<u16> = name.to_lowercase().encode_utf16().collect();
                levenshtein_distance(&name_units, query) <= *max_distance as usize
            }
        }
    }
}

/// Bounded Levenshtein distance between two UTF-16 code unit sequences,
/// computed with the classic two-row iterative algorithm.
///
/// For `a` of length `m` and `b` of length `n`: `v0` holds the distances from
/// the empty prefix of `a` to every prefix of `b`; each outer step extends
/// `a` by one code unit and derives `v1` from `v0`, then `v1` becomes the new
/// `v0`. The result is `v0[n]` — the distance between the full strings.
///
/// A naive port of the source returns `v0[len - 2]` instead, which is off by
/// one; this implementation returns the correct `v0[n]`.
fn levenshtein_distance(a: &[u16], b: &[u16]) -> usize {
    let n = b.len();
    let mut v0: Vec<usize> = (0..=n).collect();
    let mut v1: Vec<usize> = vec![0; n + 1];

    for (i, &ai) in a.iter().enumerate() {
        v1[0] = i + 1;
        for j in 0..n {
            let deletion_cost = v0[j + 1] + 1;
            let insertion_cost = v1[j] + 1;
            let substitution_cost = v0[j] + usize::from(ai != b[j]);
            v1[j + 1] = deletion_cost.min(insertion_cost).min(substitution_cost);
        }
        std::mem::swap(&mut v0, &mut v1);
    }

    v0[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: &str, b: &str) -> usize {
        let au: Vec<u16> = a.encode_utf16().collect();
        let bu: Vec<u16> = b.encode_utf16().collect();
        levenshtein_distance(&au, &bu)
    }

    #[test]
    fn levenshtein_identity_is_zero() {
        assert_eq!(dist("config_prod", "config_prod"), 0);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        assert_eq!(dist("kitten", "sitting"), dist("sitting", "kitten"));
    }

    #[test]
    fn levenshtein_matches_known_value() {
        // classic textbook example
        assert_eq!(dist("kitten", "sitting"), 3);
    }

    #[test]
    fn levenshtein_triangle_inequality_holds() {
        let a = "report_42.log";
        let b = "report_41.log";
        let c = "reports.log";
        assert!(dist(a, c) <= dist(a, b) + dist(b, c));
    }

    #[test]
    fn levenshtein_bounded_by_max_length() {
        let a = "config";
        let b = "config_prod";
        assert!(dist(a, b) <= a.len().max(b.len()));
    }

    #[test]
    fn levenshtein_empty_strings() {
        assert_eq!(dist("", ""), 0);
        assert_eq!(dist("abc", ""), 3);
        assert_eq!(dist("", "abc"), 3);
    }

    #[test]
    fn glob_star_matches_any_run() {
        let p = Predicate::glob("report_*.log").unwrap();
        assert!(p.matches("report_42.log"));
        assert!(p.matches("REPORT_.log"));
        assert!(!p.matches("report_42.txt"));
    }

    #[test]
    fn glob_question_mark_matches_single_char() {
        let p = Predicate::glob("img_?.png").unwrap();
        assert!(p.matches("img_1.png"));
        assert!(!p.matches("img_12.png"));
        assert!(!p.matches("img_.png"));
    }

    #[test]
    fn glob_escapes_literal_metacharacters() {
        let p = Predicate::glob("a.b+c").unwrap();
        assert!(p.matches("a.b+c"));
        assert!(!p.matches("axbyc")); // '.' and '+' must stay literal
    }

    #[test]
    fn glob_regex_equivalence_invariant() {
        // literal name matches the glob N iff it regex-matches the
        // escape(N).replace(\*, .*).replace(\?, .) form, anchored and
        // case-insensitive.
        let literal = "weird[name].txt";
        let glob = Predicate::glob(literal).unwrap();
        let escaped = regex::escape(literal);
        let rewritten = escaped.replace(r"\*", ".*").replace(r"\?", ".");
        let equivalent = Predicate::regex(&format!("^{}$", rewritten)).unwrap();
        assert_eq!(glob.matches(literal), equivalent.matches(literal));
        assert!(glob.matches(literal));
    }

    #[test]
    fn regex_used_verbatim_no_anchors() {
        let p = Predicate::regex(r"^img_\d+\.(png|jpg)$").unwrap();
        assert!(p.matches("img_01.png"));
        assert!(!p.matches("imgX.png"));
    }

    #[test]
    fn regex_is_case_insensitive() {
        let p = Predicate::regex(r"readme").unwrap();
        assert!(p.matches("README.MD"));
    }

    #[test]
    fn fuzzy_within_distance_matches() {
        let p = Predicate::fuzzy("config", 7);
        assert!(p.matches("config_prod"));
    }

    #[test]
    fn fuzzy_outside_distance_does_not_match() {
        let p = Predicate::fuzzy("config", 4);
        assert!(!p.matches("config_prod"));
    }

    #[test]
    fn fuzzy_is_case_insensitive() {
        let p = Predicate::fuzzy("README", 0);
        assert!(p.matches("readme"));
    }

    #[test]
    fn invalid_regex_fails_to_compile() {
        let result = Predicate::regex("[unterminated");
        assert!(result.is_err());
    }

    #[test]
    fn globs_with_only_wildcards_still_compile() {
        // globs can't produce invalid regex since every special char is
        // either escaped or a controlled substitution
        assert!(Predicate::glob("***???").is_ok());
    }
}
