//! Builtin Rule Tables
//!
//! Keyword tiers and sub-classification rules compiled into the binary.
//! `config.toml` may override any of them (see `rules::RulesConfig`).

use serde::{Deserialize, Serialize};

/// Semantic axis a keyword belongs to.
///
/// Tiers are checked in declaration order; the first tier with a matching
/// keyword decides the sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordTier {
    Core,
    System,
    Gameplay,
    Cosmetic,
}

impl KeywordTier {
    /// Evaluation order, highest precedence first.
    pub const ORDER: [KeywordTier; 4] = [
        KeywordTier::Core,
        KeywordTier::System,
        KeywordTier::Gameplay,
        KeywordTier::Cosmetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordTier::Core => "core",
            KeywordTier::System => "system",
            KeywordTier::Gameplay => "gameplay",
            KeywordTier::Cosmetic => "cosmetic",
        }
    }

    /// Removal impact contributed when this tier matches (0-4).
    pub fn removal_impact(&self) -> u8 {
        match self {
            KeywordTier::Core => 4,
            KeywordTier::System => 3,
            KeywordTier::Gameplay => 2,
            KeywordTier::Cosmetic => 0,
        }
    }

    /// Essentiality contributed when this tier matches (0-3).
    pub fn essentiality(&self) -> u8 {
        match self {
            KeywordTier::Core => 3,
            KeywordTier::System => 2,
            KeywordTier::Gameplay => 1,
            KeywordTier::Cosmetic => 0,
        }
    }
}

impl std::fmt::Display for KeywordTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removal impact when no tier matches.
pub const DEFAULT_REMOVAL_IMPACT: u8 = 1;

/// Builtin keyword lists, one per tier
pub const BUILTIN_TIERS: &[BuiltinTier] = &[
    BuiltinTier {
        tier: KeywordTier::Core,
        keywords: &["framework", "core", "injector", "library", "dependency"],
    },
    BuiltinTier {
        tier: KeywordTier::System,
        keywords: &[
            "career",
            "pregnancy",
            "relationship",
            "emotion",
            "calendar",
            "finance",
            "death",
            "school",
            "education",
            "overhaul",
        ],
    },
    BuiltinTier {
        tier: KeywordTier::Gameplay,
        keywords: &[
            "event",
            "interaction",
            "buff",
            "trait",
            "skill",
            "aspiration",
            "holiday",
            "festival",
            "object",
        ],
    },
    BuiltinTier {
        tier: KeywordTier::Cosmetic,
        keywords: &[
            "override",
            "map",
            "loading screen",
            "font",
            "ui recolor",
            "cas",
            "hair",
            "clothing",
            "makeup",
        ],
    },
];

/// Builtin sub-classification rules. Order matters: the first match wins.
pub const BUILTIN_SUBCLASSES: &[BuiltinSubclass] = &[
    BuiltinSubclass {
        keyword: "inventory",
        code: "5B",
        label: "Utilitários de Inventário e Gestão",
    },
    BuiltinSubclass {
        keyword: "ui",
        code: "4A",
        label: "Ajustes de Interface",
    },
    BuiltinSubclass {
        keyword: "framework",
        code: "1A",
        label: "Framework / Dependência",
    },
    BuiltinSubclass {
        keyword: "career",
        code: "2B",
        label: "Sistemas de Carreira",
    },
    BuiltinSubclass {
        keyword: "trait",
        code: "3A",
        label: "Traços e Personalidade",
    },
    BuiltinSubclass {
        keyword: "aspiration",
        code: "3B",
        label: "Aspirações e Objetivos",
    },
    BuiltinSubclass {
        keyword: "cas",
        code: "0A",
        label: "Itens CAS",
    },
];

/// Static keyword list for a tier
#[derive(Debug, Clone)]
pub struct BuiltinTier {
    pub tier: KeywordTier,
    pub keywords: &'static [&'static str],
}

/// Static sub-classification rule
#[derive(Debug, Clone)]
pub struct BuiltinSubclass {
    pub keyword: &'static str,
    pub code: &'static str,
    pub label: &'static str,
}

/// Runtime sub-classification rule
///
/// Built from [`BUILTIN_SUBCLASSES`] or from `[[rules.subclass]]` in
/// `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclassRule {
    /// Substring searched in the corpus
    pub keyword: String,
    /// Short code, e.g. `5B`
    pub code: String,
    /// Human readable label
    pub label: String,
}

impl SubclassRule {
    /// Text appended to the Notes property: `"CODE — Label"`.
    pub fn note(&self) -> String {
        format!("{} — {}", self.code, self.label)
    }
}

impl From<&BuiltinSubclass> for SubclassRule {
    fn from(builtin: &BuiltinSubclass) -> Self {
        Self {
            keyword: builtin.keyword.to_string(),
            code: builtin.code.to_string(),
            label: builtin.label.to_string(),
        }
    }
}
