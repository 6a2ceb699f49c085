//! Mod Classifier
//!
//! Scores a mod's text against the keyword tiers of a [`RuleSet`]:
//!
//! ```text
//! score = removal_impact (0-4) + framework (0-1) + essentiality (0-3)
//! ```
//!
//! and maps the score onto the priority ruler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::record::ModRecord;

use super::builtin::{KeywordTier, DEFAULT_REMOVAL_IMPACT};
use super::priority::{Priority, MAX_SCORE};
use super::rules::RuleSet;

/// Sub-scores behind a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Tier that decided the sub-scores (`None` when nothing matched)
    pub tier: Option<KeywordTier>,
    pub removal_impact: u8,
    pub framework: u8,
    pub essentiality: u8,
}

impl ScoreBreakdown {
    fn from_tier(tier: Option<KeywordTier>) -> Self {
        let removal_impact = tier.map_or(DEFAULT_REMOVAL_IMPACT, |t| t.removal_impact());
        let framework = u8::from(tier == Some(KeywordTier::Core));
        let essentiality = tier.map_or(0, |t| t.essentiality());
        Self {
            tier,
            removal_impact,
            framework,
            essentiality,
        }
    }

    pub fn total(&self) -> u8 {
        self.removal_impact + self.framework + self.essentiality
    }
}

/// Result of classifying one mod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub priority: Priority,
    /// Folder label, always `priority.folder()`
    pub folder: String,
    /// `score / 8`, clamped to `[0, 1]`
    pub confidence: f64,
    pub score: u8,
    /// `"CODE — Label"` of the first matching sub-classification rule
    pub notes_suffix: Option<String>,
    pub mod_name: String,
    pub breakdown: ScoreBreakdown,
}

impl Classification {
    /// Safe default used whenever a mod cannot be classified.
    ///
    /// Priority 4 means "needs review" here, not its threshold meaning.
    /// A genuine priority 4 always has score 2 and confidence 0.25, so
    /// `confidence == 0.0` together with priority 4 identifies this record.
    pub fn fallback(mod_name: impl Into<String>) -> Self {
        let priority = Priority::PERSISTENT;
        Self {
            priority,
            folder: priority.folder().to_string(),
            confidence: 0.0,
            score: 0,
            notes_suffix: None,
            mod_name: mod_name.into(),
            breakdown: ScoreBreakdown {
                tier: None,
                removal_impact: 0,
                framework: 0,
                essentiality: 0,
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0 && self.priority == Priority::PERSISTENT
    }

    /// Confidence as a whole percentage, for display.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Keyword-based mod classifier
///
/// Holds only immutable tables, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ModClassifier {
    rules: RuleSet,
}

impl ModClassifier {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Classifier over the builtin tables
    pub fn builtin() -> Self {
        Self::new(RuleSet::builtin())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a mod from its name, description and creator.
    pub fn classify(&self, name: &str, description: &str, creator: &str) -> Classification {
        let corpus = build_corpus(name, description, creator);
        let breakdown = ScoreBreakdown::from_tier(self.rules.first_matching_tier(&corpus));
        let score = breakdown.total();
        let priority = Priority::from_score(score);
        let confidence = (f64::from(score) / f64::from(MAX_SCORE)).clamp(0.0, 1.0);
        let notes_suffix = self
            .rules
            .first_matching_subclass(&corpus)
            .map(|rule| rule.note());

        log::info!(
            "classified '{}': score={} -> priority={} ({})",
            name,
            score,
            priority,
            priority.folder()
        );

        Classification {
            priority,
            folder: priority.folder().to_string(),
            confidence,
            score,
            notes_suffix,
            mod_name: name.to_string(),
            breakdown,
        }
    }

    pub fn classify_record(&self, record: &ModRecord) -> Classification {
        self.classify(&record.name, &record.description, &record.creator)
    }

    /// Classify an untyped item (e.g. one element of a JSON batch).
    ///
    /// Fails when the item is not an object or a field has the wrong type.
    pub fn try_classify_value(&self, item: &Value) -> Result<Classification> {
        let record = ModRecord::from_value(item)?;
        Ok(self.classify_record(&record))
    }

    /// Like [`Self::try_classify_value`], but returns the fallback on error.
    pub fn classify_value(&self, item: &Value) -> Classification {
        match self.try_classify_value(item) {
            Ok(classification) => classification,
            Err(e) => {
                let name = best_effort_name(item);
                log::error!("failed to classify mod '{}': {}", name, e);
                Classification::fallback(name)
            }
        }
    }

    /// Classify records independently, preserving order.
    pub fn classify_batch(&self, records: &[ModRecord]) -> Vec<Classification> {
        records.iter().map(|r| self.classify_record(r)).collect()
    }

    /// Classify untyped items, preserving order and length.
    ///
    /// Malformed items get a fallback record in place.
    pub fn classify_json_batch(&self, items: &[Value]) -> Vec<Classification> {
        let results: Vec<Classification> = items.iter().map(|i| self.classify_value(i)).collect();
        let failed = results.iter().filter(|c| c.is_fallback()).count();
        if failed > 0 {
            log::warn!("{} of {} batch items fell back", failed, results.len());
        }
        results
    }
}

/// Lower-cased `"name description creator"`.
pub fn build_corpus(name: &str, description: &str, creator: &str) -> String {
    format!("{} {} {}", name, description, creator).to_lowercase()
}

fn best_effort_name(item: &Value) -> String {
    item.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::builtin::SubclassRule;
    use serde_json::json;

    fn classify(name: &str) -> Classification {
        ModClassifier::builtin().classify(name, "", "")
    }

    #[test]
    fn test_core_beats_cosmetic() {
        let result = classify("framework hair");
        assert_eq!(result.breakdown.removal_impact, 4);
        assert_eq!(result.breakdown.framework, 1);
        assert_eq!(result.breakdown.essentiality, 3);
        assert_eq!(result.score, 8);
        assert_eq!(result.priority, Priority::CORE);
        assert_eq!(result.folder, "01 - Core");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_no_keyword_match() {
        let result = classify("xyz totally unrelated text");
        assert_eq!(result.breakdown.tier, None);
        assert_eq!(result.breakdown.removal_impact, 1);
        assert_eq!(result.breakdown.framework, 0);
        assert_eq!(result.breakdown.essentiality, 0);
        assert_eq!(result.score, 1);
        assert_eq!(result.priority, Priority::COSMETIC);
        assert_eq!(result.confidence, 0.125);
        assert_eq!(result.notes_suffix, None);
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_tiers() {
        let system = classify("Better Pregnancy");
        assert_eq!(system.score, 3 + 2);
        assert_eq!(system.priority, Priority::SYSTEMS);

        let gameplay = classify("More Buffs");
        assert_eq!(gameplay.score, 2 + 1);
        assert_eq!(gameplay.priority, Priority::GAMEPLAY);

        let cosmetic = classify("Long Hair");
        assert_eq!(cosmetic.score, 0);
        assert_eq!(cosmetic.priority, Priority::COSMETIC);
        assert_eq!(cosmetic.confidence, 0.0);
        assert!(!cosmetic.is_fallback());
    }

    #[test]
    fn test_description_and_creator_are_searched() {
        let classifier = ModClassifier::builtin();
        let result = classifier.classify("MC Command Center", "Requires the core library", "");
        assert_eq!(result.priority, Priority::CORE);

        let by_creator = classifier.classify("Thing", "", "career builder");
        assert_eq!(by_creator.breakdown.tier, Some(KeywordTier::System));
    }

    #[test]
    fn test_case_insensitive() {
        let upper = classify("FRAMEWORK Mod");
        let lower = classify("framework mod");
        assert_eq!(upper.score, lower.score);
        assert_eq!(upper.priority, lower.priority);
    }

    #[test]
    fn test_idempotent() {
        let classifier = ModClassifier::builtin();
        let a = classifier.classify("Inventory UI", "trait tweaks", "someone");
        let b = classifier.classify("Inventory UI", "trait tweaks", "someone");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_subclass_first_match() {
        let result = classify("inventory ui mod");
        assert_eq!(
            result.notes_suffix.as_deref(),
            Some("5B — Utilitários de Inventário e Gestão")
        );
    }

    #[test]
    fn test_fallback_record() {
        let fallback = Classification::fallback("Broken");
        assert_eq!(fallback.priority, Priority::PERSISTENT);
        assert_eq!(fallback.folder, "04 - Persistente");
        assert_eq!(fallback.score, 0);
        assert_eq!(fallback.confidence, 0.0);
        assert_eq!(fallback.notes_suffix, None);
        assert!(fallback.is_fallback());
    }

    #[test]
    fn test_reachable_scores_never_hit_priority_four() {
        let classifier = ModClassifier::builtin();
        let samples = ["framework", "career", "trait", "hair", "xyz"];
        let scores: Vec<u8> = samples
            .iter()
            .map(|s| classifier.classify(s, "", "").score)
            .collect();
        assert_eq!(scores, vec![8, 5, 3, 0, 1]);
        for name in samples {
            let result = classifier.classify(name, "", "");
            assert_ne!(result.priority, Priority::PERSISTENT);
            assert!(!result.is_fallback());
        }
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = RuleSet::new(
            [(KeywordTier::Core, vec!["xml injector".to_string()])],
            vec![SubclassRule {
                keyword: "injector".to_string(),
                code: "1B".to_string(),
                label: "Injetores".to_string(),
            }],
        )
        .unwrap();
        let classifier = ModClassifier::new(rules);
        let result = classifier.classify("XML Injector", "", "");
        assert_eq!(result.priority, Priority::CORE);
        assert_eq!(result.notes_suffix.as_deref(), Some("1B — Injetores"));

        let miss = classifier.classify("framework", "", "");
        assert_eq!(miss.score, 1);
    }

    #[test]
    fn test_batch_preserves_order_with_malformed_item() {
        let classifier = ModClassifier::builtin();
        let items = vec![
            json!({"name": "Core Library"}),
            json!(42),
            json!({"name": "Long Hair", "description": "", "creator": "someone"}),
        ];
        let results = classifier.classify_json_batch(&items);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].mod_name, "Core Library");
        assert_eq!(results[0].priority, Priority::CORE);
        assert!(results[1].is_fallback());
        assert_eq!(results[2].mod_name, "Long Hair");
        assert_eq!(results[2].priority, Priority::COSMETIC);
    }

    #[test]
    fn test_wrong_field_type_falls_back_with_name() {
        let classifier = ModClassifier::builtin();
        let item = json!({"name": "Career Mod", "description": ["not", "a", "string"]});
        assert!(classifier.try_classify_value(&item).is_err());
        let result = classifier.classify_value(&item);
        assert!(result.is_fallback());
        assert_eq!(result.mod_name, "Career Mod");
    }

    #[test]
    fn test_typed_batch() {
        let classifier = ModClassifier::builtin();
        let records = vec![
            ModRecord::new("Better Calendar", "", ""),
            ModRecord::new("xyz", "", ""),
        ];
        let results = classifier.classify_batch(&records);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].priority, Priority::SYSTEMS);
        assert_eq!(results[1].priority, Priority::COSMETIC);
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(classify("framework").confidence_percent(), 100);
        assert_eq!(classify("xyz").confidence_percent(), 13);
    }
}
