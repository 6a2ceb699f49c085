//! Rule Set
//!
//! Runtime keyword tables used by the classifier.
//! Starts from the builtin tables and applies `[rules]` overrides.

use serde::{Deserialize, Serialize};

use crate::error::{ModSortError, Result};

use super::builtin::{KeywordTier, SubclassRule, BUILTIN_SUBCLASSES, BUILTIN_TIERS};

/// Immutable keyword tables for one classifier instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Keyword lists in evaluation order (core, system, gameplay, cosmetic)
    tiers: Vec<(KeywordTier, Vec<String>)>,
    /// Sub-classification rules, first match wins
    subclasses: Vec<SubclassRule>,
}

impl RuleSet {
    /// Builtin tables only
    pub fn builtin() -> Self {
        let tiers = KeywordTier::ORDER
            .iter()
            .map(|tier| {
                let keywords = BUILTIN_TIERS
                    .iter()
                    .filter(|b| b.tier == *tier)
                    .flat_map(|b| b.keywords.iter().map(|k| k.to_string()))
                    .collect();
                (*tier, keywords)
            })
            .collect();
        let subclasses = BUILTIN_SUBCLASSES.iter().map(SubclassRule::from).collect();
        Self { tiers, subclasses }
    }

    /// Build from explicit tables.
    ///
    /// Keywords are lower-cased; tiers missing from `tiers` get an empty list.
    pub fn new(
        tiers: impl IntoIterator<Item = (KeywordTier, Vec<String>)>,
        subclasses: Vec<SubclassRule>,
    ) -> Result<Self> {
        let mut given: Vec<(KeywordTier, Vec<String>)> = tiers.into_iter().collect();
        let tiers = KeywordTier::ORDER
            .iter()
            .map(|tier| {
                let keywords = given
                    .iter_mut()
                    .find(|(t, _)| t == tier)
                    .map(|(_, k)| std::mem::take(k))
                    .unwrap_or_default();
                (*tier, lowercase_all(keywords))
            })
            .collect();
        let subclasses = subclasses
            .into_iter()
            .map(|mut rule| {
                rule.keyword = rule.keyword.to_lowercase();
                rule
            })
            .collect();

        let rules = Self { tiers, subclasses };
        rules.validate()?;
        Ok(rules)
    }

    /// Apply `[rules]` overrides from config.
    ///
    /// - A tier list present in config replaces the builtin list
    /// - A `subclass` list present in config replaces the builtin rules
    pub fn with_config(mut self, config: &RulesConfig) -> Result<Self> {
        for (tier, keywords) in self.tiers.iter_mut() {
            if let Some(overrides) = config.tier(*tier) {
                *keywords = lowercase_all(overrides.to_vec());
            }
        }
        if let Some(subclasses) = &config.subclass {
            self.subclasses = subclasses
                .iter()
                .cloned()
                .map(|mut rule| {
                    rule.keyword = rule.keyword.to_lowercase();
                    rule
                })
                .collect();
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject blank keywords, codes and labels.
    pub fn validate(&self) -> Result<()> {
        for (tier, keywords) in &self.tiers {
            if let Some(pos) = keywords.iter().position(|k| k.trim().is_empty()) {
                return Err(ModSortError::InvalidRules(format!(
                    "{} keyword #{} is empty",
                    tier,
                    pos + 1
                )));
            }
        }
        for (i, rule) in self.subclasses.iter().enumerate() {
            if rule.keyword.trim().is_empty()
                || rule.code.trim().is_empty()
                || rule.label.trim().is_empty()
            {
                return Err(ModSortError::InvalidRules(format!(
                    "subclass rule #{} needs keyword, code and label",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Keywords of a tier
    pub fn keywords(&self, tier: KeywordTier) -> &[String] {
        self.tiers
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }

    /// All tiers in evaluation order
    pub fn tiers(&self) -> impl Iterator<Item = (KeywordTier, &[String])> {
        self.tiers.iter().map(|(t, k)| (*t, k.as_slice()))
    }

    /// Sub-classification rules in declared order
    pub fn subclasses(&self) -> &[SubclassRule] {
        &self.subclasses
    }

    /// First tier with a keyword contained in `corpus`.
    ///
    /// `corpus` must already be lower-cased.
    pub fn first_matching_tier(&self, corpus: &str) -> Option<KeywordTier> {
        self.tiers
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| corpus.contains(k.as_str())))
            .map(|(tier, _)| *tier)
    }

    /// First sub-classification rule contained in `corpus`.
    pub fn first_matching_subclass(&self, corpus: &str) -> Option<&SubclassRule> {
        self.subclasses
            .iter()
            .find(|rule| corpus.contains(rule.keyword.as_str()))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lowercase_all(keywords: Vec<String>) -> Vec<String> {
    keywords.into_iter().map(|k| k.to_lowercase()).collect()
}

/// `[rules]` section of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gameplay: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmetic: Option<Vec<String>>,
    /// Replaces the builtin sub-classification rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<Vec<SubclassRule>>,
}

impl RulesConfig {
    fn tier(&self, tier: KeywordTier) -> Option<&[String]> {
        match tier {
            KeywordTier::Core => self.core.as_deref(),
            KeywordTier::System => self.system.as_deref(),
            KeywordTier::Gameplay => self.gameplay.as_deref(),
            KeywordTier::Cosmetic => self.cosmetic.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
