//! Field-pattern rule table for Oracle type mapping.
//!
//! Rules are loaded once and evaluated in ascending rank order; the
//! first rule whose glob matches a field name wins and its Oracle type
//! template is used verbatim. The evaluation order is part of the
//! contract, so the set is immutable after compilation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name-glob-to-type mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatternRule {
    /// Rule name, used in logs when the rule fires.
    pub name: String,
    /// Glob patterns (`*` and `?` wildcards), matched case-insensitively.
    pub patterns: Vec<String>,
    /// Oracle type template emitted verbatim on match.
    pub oracle_type: String,
    /// Ascending evaluation order; lower rank is evaluated first.
    pub rank: u32,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}' has invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        source: regex::Error,
    },
    #[error("rule '{rule}' has no patterns")]
    EmptyRule { rule: String },
}

#[derive(Debug)]
struct CompiledRule {
    rule: FieldPatternRule,
    matchers: Vec<Regex>,
}

/// Ordered, compiled rule table. Read-only after construction.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile a rule list, sorting by rank (declaration order breaks ties).
    pub fn compile(mut rules: Vec<FieldPatternRule>) -> Result<Self, RuleError> {
        rules.sort_by_key(|r| r.rank);
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.patterns.is_empty() {
                return Err(RuleError::EmptyRule { rule: rule.name });
            }
            let mut matchers = Vec::with_capacity(rule.patterns.len());
            for pattern in &rule.patterns {
                let regex =
                    Regex::new(&glob_to_regex(pattern)).map_err(|source| RuleError::InvalidPattern {
                        rule: rule.name.clone(),
                        pattern: pattern.clone(),
                        source,
                    })?;
                matchers.push(regex);
            }
            compiled.push(CompiledRule { rule, matchers });
        }
        Ok(Self { rules: compiled })
    }

    /// The canonical built-in rule table.
    ///
    /// This is the single shared artifact consumed by both the standalone
    /// DDL path and the sync loader path; do not fork it.
    pub fn builtin() -> &'static Self {
        static BUILTIN: LazyLock<RuleSet> = LazyLock::new(|| {
            RuleSet::compile(builtin_rules()).expect("builtin rule table compiles")
        });
        &BUILTIN
    }

    /// First rule matching the field name, in rank order.
    pub fn match_field(&self, field_name: &str) -> Option<&FieldPatternRule> {
        self.rules
            .iter()
            .find(|c| c.matchers.iter().any(|m| m.is_match(field_name)))
            .map(|c| &c.rule)
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldPatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn builtin_rules() -> Vec<FieldPatternRule> {
    let rule = |name: &str, patterns: &[&str], oracle_type: &str, rank: u32| FieldPatternRule {
        name: name.into(),
        patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        oracle_type: oracle_type.into(),
        rank,
    };
    vec![
        // Trailing _set fields carry serialized multi-value content and
        // must always land in a large text column, whatever the source
        // declared. Ranked first so nothing can shadow it.
        rule("collection", &["*_set"], "VARCHAR2(4000 CHAR)", 10),
        rule("identifier", &["id", "*_id"], "NUMBER", 20),
        rule("quantity", &["qty", "*_qty"], "NUMBER", 30),
        rule("flag", &["is_*", "has_*"], "NUMBER(1,0)", 40),
        rule("event_time", &["*_ts", "*_at", "*_time"], "TIMESTAMP(6)", 50),
        rule("calendar_date", &["*_date"], "DATE", 60),
    ]
}

/// Translate a glob into an anchored, case-insensitive regex.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push_str("(?i)^");
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_is_anchored() {
        let rules = RuleSet::compile(vec![FieldPatternRule {
            name: "identifier".into(),
            patterns: vec!["*_id".into()],
            oracle_type: "NUMBER".into(),
            rank: 1,
        }])
        .unwrap();
        assert!(rules.match_field("order_id").is_some());
        assert!(rules.match_field("order_id_set").is_none());
    }

    #[test]
    fn glob_is_case_insensitive() {
        let rules = RuleSet::builtin();
        assert!(rules.match_field("ORDER_ID").is_some());
        assert_eq!(rules.match_field("ORDER_ID").unwrap().name, "identifier");
    }

    #[test]
    fn first_match_wins_by_rank() {
        let make = |set_rank: u32, id_rank: u32| {
            RuleSet::compile(vec![
                FieldPatternRule {
                    name: "collection".into(),
                    patterns: vec!["*_set*".into()],
                    oracle_type: "VARCHAR2(4000 CHAR)".into(),
                    rank: set_rank,
                },
                FieldPatternRule {
                    name: "identifier".into(),
                    patterns: vec!["*_id".into()],
                    oracle_type: "NUMBER".into(),
                    rank: id_rank,
                },
            ])
            .unwrap()
        };

        // "order_set_id" matches both rules; the winner is whichever is
        // ranked first, in either ordering.
        let set_first = make(1, 2);
        assert_eq!(
            set_first.match_field("order_set_id").unwrap().oracle_type,
            "VARCHAR2(4000 CHAR)"
        );
        let id_first = make(2, 1);
        assert_eq!(id_first.match_field("order_set_id").unwrap().oracle_type, "NUMBER");
    }

    #[test]
    fn builtin_collection_rule_is_first() {
        let first = RuleSet::builtin().iter().next().unwrap();
        assert_eq!(first.name, "collection");
        assert_eq!(first.oracle_type, "VARCHAR2(4000 CHAR)");
    }

    #[test]
    fn builtin_matches_bare_id() {
        let rule = RuleSet::builtin().match_field("id").unwrap();
        assert_eq!(rule.oracle_type, "NUMBER");
    }

    #[test]
    fn unmatched_name_returns_none() {
        assert!(RuleSet::builtin().match_field("description").is_none());
    }

    #[test]
    fn empty_rule_rejected() {
        let err = RuleSet::compile(vec![FieldPatternRule {
            name: "broken".into(),
            patterns: vec![],
            oracle_type: "NUMBER".into(),
            rank: 1,
        }])
        .unwrap_err();
        assert!(err.to_string().contains("no patterns"));
    }

    #[test]
    fn literal_regex_chars_are_escaped() {
        let rules = RuleSet::compile(vec![FieldPatternRule {
            name: "odd".into(),
            patterns: vec!["a.b".into()],
            oracle_type: "NUMBER".into(),
            rank: 1,
        }])
        .unwrap();
        assert!(rules.match_field("a.b").is_some());
        assert!(rules.match_field("axb").is_none());
    }
}
