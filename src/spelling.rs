//! Spelling variants and the key builder.
//!
//! A [`SpellingRule`] receives the cleaned key padded with one space on each
//! side and proposes weighted variants into a [`SpellingMap`]. The builder
//! then pins the untouched key at weight 1.

use regex::Regex;
use serde::Deserialize;

use crate::error::{IndexError, SpellingError};
use crate::normalize::{NormalizeOptions, normalize};

/// Ordered mapping from normalized key to weight. Keys are trimmed on write;
/// writing an existing key keeps its position and replaces its weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpellingMap {
    entries: Vec<(String, f64)>,
}

impl SpellingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, weight: f64) {
        let key = key.trim();
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(slot) => slot.1 = weight,
            None => self.entries.push((key.to_owned(), weight)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, weight)| *weight)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .map(|(key, weight)| (key.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Proposes alternate keys for a cleaned key.
///
/// `padded` is the cleaned key with a leading and trailing space so that
/// rules can anchor on word boundaries. Returning an error aborts the
/// calling `set` or `get`.
pub trait SpellingRule: Send + Sync {
    fn expand(&self, spellings: &mut SpellingMap, padded: &str) -> Result<(), SpellingError>;
}

impl<F> SpellingRule for F
where
    F: Fn(&mut SpellingMap, &str) -> Result<(), SpellingError> + Send + Sync,
{
    fn expand(&self, spellings: &mut SpellingMap, padded: &str) -> Result<(), SpellingError> {
        self(spellings, padded)
    }
}

/// The default rule: no variants, only the exact key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpellings;

impl SpellingRule for NoSpellings {
    fn expand(&self, _spellings: &mut SpellingMap, _padded: &str) -> Result<(), SpellingError> {
        Ok(())
    }
}

/// Regex replacement over the padded key. When the replacement changes the
/// key, the result is registered at `weight`.
#[derive(Debug, Clone)]
pub struct ReplaceRule {
    pattern: Regex,
    replacement: String,
    weight: f64,
}

impl ReplaceRule {
    pub fn new(
        pattern: &str,
        replacement: impl Into<String>,
        weight: f64,
    ) -> Result<Self, IndexError> {
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(IndexError::InvalidWeight(weight));
        }
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
            weight,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl SpellingRule for ReplaceRule {
    fn expand(&self, spellings: &mut SpellingMap, padded: &str) -> Result<(), SpellingError> {
        let replaced = self.pattern.replace_all(padded, self.replacement.as_str());
        if replaced != padded {
            spellings.set(&replaced, self.weight);
        }
        Ok(())
    }
}

/// Serialized form of a [`ReplaceRule`], as found in rule files.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceRuleSpec {
    pub pattern: String,
    pub replacement: String,
    #[serde(default = "default_rule_weight")]
    pub weight: f64,
}

fn default_rule_weight() -> f64 {
    0.5
}

impl TryFrom<ReplaceRuleSpec> for ReplaceRule {
    type Error = IndexError;

    fn try_from(spec: ReplaceRuleSpec) -> Result<Self, Self::Error> {
        ReplaceRule::new(&spec.pattern, spec.replacement, spec.weight)
    }
}

/// Applies each rule independently to the same padded key, in order.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn SpellingRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl SpellingRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn push(&mut self, rule: impl SpellingRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn from_specs(specs: Vec<ReplaceRuleSpec>) -> Result<Self, IndexError> {
        let mut set = Self::new();
        for spec in specs {
            set.push(ReplaceRule::try_from(spec)?);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl SpellingRule for RuleSet {
    fn expand(&self, spellings: &mut SpellingMap, padded: &str) -> Result<(), SpellingError> {
        for rule in &self.rules {
            rule.expand(spellings, padded)?;
        }
        Ok(())
    }
}

/// Normalizes `raw` and expands it into the weighted set of lookup keys.
///
/// The exact cleaned key is written last at weight 1, so it is always present
/// and wins over any variant that trims to the same text.
pub fn build_spellings(
    raw: &str,
    rule: &dyn SpellingRule,
    options: &NormalizeOptions,
) -> Result<SpellingMap, IndexError> {
    let key = normalize(raw, options);
    let mut spellings = SpellingMap::new();
    let padded = format!(" {key} ");
    rule.expand(&mut spellings, &padded)
        .map_err(|source| IndexError::Spelling {
            key: key.trim().to_owned(),
            source,
        })?;
    spellings.set(&key, 1.0);
    Ok(spellings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_rule() -> ReplaceRule {
        ReplaceRule::new("(?:le|el) ", "the ", 0.5).expect("valid rule")
    }

    #[test]
    fn map_trims_keys_and_last_write_wins() {
        let mut map = SpellingMap::new();
        map.set(" chef ", 0.3);
        map.set("chef", 0.7);
        map.set("cook", 0.2);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("chef"), Some(0.7));
        let keys: Vec<_> = map.entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["chef", "cook"]);
    }

    #[test]
    fn exact_key_is_always_weight_one() {
        let noisy = |map: &mut SpellingMap, padded: &str| -> Result<(), SpellingError> {
            map.set(padded, 0.1);
            Ok(())
        };
        let spellings =
            build_spellings("The Chef", &noisy, &NormalizeOptions::default()).expect("built");
        assert_eq!(spellings.len(), 1);
        assert_eq!(spellings.get("the chef"), Some(1.0));
    }

    #[test]
    fn rule_sees_padded_key() {
        let seen = |map: &mut SpellingMap, padded: &str| -> Result<(), SpellingError> {
            assert_eq!(padded, " el chef ");
            map.set("seen", 0.9);
            Ok(())
        };
        let spellings =
            build_spellings("El Chef", &seen, &NormalizeOptions::default()).expect("built");
        assert_eq!(spellings.get("seen"), Some(0.9));
        assert_eq!(spellings.get("el chef"), Some(1.0));
    }

    #[test]
    fn replace_rule_adds_weighted_variant() {
        let spellings =
            build_spellings("le chef", &article_rule(), &NormalizeOptions::default())
                .expect("built");
        let pairs: Vec<_> = spellings.entries().collect();
        assert_eq!(pairs, vec![("the chef", 0.5), ("le chef", 1.0)]);
    }

    #[test]
    fn replace_rule_skips_unchanged_keys() {
        let spellings =
            build_spellings("the chef", &article_rule(), &NormalizeOptions::default())
                .expect("built");
        assert_eq!(spellings.len(), 1);
    }

    #[test]
    fn replace_rule_rejects_bad_input() {
        assert!(matches!(
            ReplaceRule::new("x", "y", 0.0),
            Err(IndexError::InvalidWeight(_))
        ));
        assert!(matches!(
            ReplaceRule::new("(", "y", 0.5),
            Err(IndexError::Pattern(_))
        ));
    }

    #[test]
    fn rule_set_applies_every_rule() {
        let rules = RuleSet::from_specs(vec![
            ReplaceRuleSpec {
                pattern: " st ".into(),
                replacement: " saint ".into(),
                weight: 0.8,
            },
            ReplaceRuleSpec {
                pattern: " mt ".into(),
                replacement: " mount ".into(),
                weight: 0.6,
            },
        ])
        .expect("valid rules");
        assert_eq!(rules.len(), 2);
        let spellings =
            build_spellings("Mt. St. Helens", &rules, &NormalizeOptions::default())
                .expect("built");
        assert_eq!(spellings.get("mt saint helens"), Some(0.8));
        assert_eq!(spellings.get("mount st helens"), Some(0.6));
        assert_eq!(spellings.get("mt st helens"), Some(1.0));
    }

    #[test]
    fn rule_failure_is_reported() {
        let failing = |_: &mut SpellingMap, _: &str| -> Result<(), SpellingError> {
            Err(SpellingError::new("rule exploded"))
        };
        let err = build_spellings("anything", &failing, &NormalizeOptions::default())
            .expect_err("rule failure propagates");
        match err {
            IndexError::Spelling { key, source } => {
                assert_eq!(key, "anything");
                assert_eq!(source.message(), "rule exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rule_spec_defaults_weight() {
        let spec: ReplaceRuleSpec =
            serde_json::from_str(r#"{"pattern": "x", "replacement": "y"}"#).expect("valid spec");
        let rule = ReplaceRule::try_from(spec).expect("valid rule");
        assert_eq!(rule.weight(), 0.5);
    }
}
