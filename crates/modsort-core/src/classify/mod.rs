//! # Classify Module
//!
//! Assigns each mod a priority tier on the v3.0 ruler:
//!
//! ```text
//! Score = Removal + Framework + Essential
//! ```
//!
//! | Score | Priority | Folder           |
//! |-------|----------|------------------|
//! | 7-8   | 1        | 01 - Core        |
//! | 5-6   | 2        | 02 - Sistemas    |
//! | 3-4   | 3        | 03 - Gameplay    |
//! | 2     | 4        | 04 - Persistente |
//! | 0-1   | 0        | 00 - Cosmético   |
//!
//! Priority 5 (`05 - Volátil`) exists in the folder table but is only set by
//! hand in Notion.
//!
//! ## Module layout
//!
//! - `builtin`: keyword tiers and sub-classification rules compiled in
//! - `rules`: runtime rule set with config overrides
//! - `priority`: score thresholds and folder labels
//! - `classifier`: the scoring itself
//!
//! ## Example
//!
//! ```rust
//! use modsort_core::classify::{ModClassifier, Priority};
//!
//! let classifier = ModClassifier::builtin();
//! let result = classifier.classify("Inventory Framework", "", "");
//! assert_eq!(result.priority, Priority::CORE);
//! assert_eq!(result.folder, "01 - Core");
//! assert_eq!(
//!     result.notes_suffix.as_deref(),
//!     Some("5B — Utilitários de Inventário e Gestão")
//! );
//! ```

mod builtin;
mod classifier;
mod priority;
mod rules;

pub use builtin::{
    BuiltinSubclass, BuiltinTier, KeywordTier, SubclassRule, BUILTIN_SUBCLASSES, BUILTIN_TIERS,
    DEFAULT_REMOVAL_IMPACT,
};
pub use classifier::{build_corpus, Classification, ModClassifier, ScoreBreakdown};
pub use priority::{Priority, FOLDER_LABELS, MAX_SCORE, SCORE_THRESHOLDS};
pub use rules::{RuleSet, RulesConfig};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn priority_and_confidence_stay_in_range(
            name in ".{0,40}",
            description in ".{0,80}",
            creator in "[a-zA-Z ]{0,20}",
        ) {
            let result = ModClassifier::builtin().classify(&name, &description, &creator);
            prop_assert!(result.priority.value() <= 5);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            prop_assert!(result.score <= MAX_SCORE);
            prop_assert_eq!(result.folder.as_str(), result.priority.folder());
        }

        #[test]
        fn classification_ignores_ascii_case(name in "[a-zA-Z ]{0,40}") {
            let classifier = ModClassifier::builtin();
            let upper = classifier.classify(&name.to_uppercase(), "", "");
            let lower = classifier.classify(&name.to_lowercase(), "", "");
            prop_assert_eq!(upper.score, lower.score);
            prop_assert_eq!(upper.priority, lower.priority);
            prop_assert_eq!(upper.notes_suffix, lower.notes_suffix);
        }

        #[test]
        fn classification_is_idempotent(name in ".{0,40}", description in ".{0,40}") {
            let classifier = ModClassifier::builtin();
            let a = classifier.classify(&name, &description, "");
            let b = classifier.classify(&name, &description, "");
            prop_assert_eq!(a, b);
        }
    }
}
