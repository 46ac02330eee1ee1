//! Hardware tier → model recommendation rules.
//!
//! The rules form an ordered table evaluated top to bottom; the first rule
//! whose thresholds the profile meets wins. The last rule has no thresholds
//! so every profile lands somewhere.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{self, ModelCatalogEntry};
use crate::defaults::{self, GenerationDefaults};
use crate::hardware::HardwareProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardwareTier {
    Basic,
    LowerEnd,
    MidRange,
    HighEnd,
}

impl HardwareTier {
    pub fn label(&self) -> &'static str {
        match self {
            HardwareTier::Basic => "basic",
            HardwareTier::LowerEnd => "lower-end",
            HardwareTier::MidRange => "mid-range",
            HardwareTier::HighEnd => "high-end",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HardwareTier::Basic => "Basic system: stick to the smallest models",
            HardwareTier::LowerEnd => "Lower-end system: 1-3B models run comfortably",
            HardwareTier::MidRange => "Mid-range system: 7-8B models are the sweet spot",
            HardwareTier::HighEnd => "High-end system with a capable GPU: 14B models and up",
        }
    }
}

impl fmt::Display for HardwareTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a pick is presented within its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Standing {
    Primary,
    Alternate,
    Specialized,
    Experimental,
    /// Listed for visibility; expected to struggle on this tier.
    NotRecommended,
}

impl Standing {
    pub fn label(&self) -> &'static str {
        match self {
            Standing::Primary => "recommended",
            Standing::Alternate => "alternate",
            Standing::Specialized => "specialized",
            Standing::Experimental => "experimental",
            Standing::NotRecommended => "challenging",
        }
    }

    pub fn is_top_pick(&self) -> bool {
        !matches!(self, Standing::NotRecommended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRule {
    pub identifier: &'static str,
    pub standing: Standing,
}

const fn pick(identifier: &'static str, standing: Standing) -> PickRule {
    PickRule {
        identifier,
        standing,
    }
}

/// One row of the tier table. `max_ram_gb` is exclusive and informational:
/// matching only checks the lower bounds, relying on row order for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRule {
    pub tier: HardwareTier,
    pub min_ram_gb: u64,
    pub max_ram_gb: Option<u64>,
    pub min_vram_gb: u64,
    pub picks: &'static [PickRule],
}

impl TierRule {
    pub fn matches(&self, profile: &HardwareProfile) -> bool {
        profile.ram_gb >= self.min_ram_gb && profile.gpu_vram_gb >= self.min_vram_gb
    }

    pub fn is_catch_all(&self) -> bool {
        self.min_ram_gb == 0 && self.min_vram_gb == 0
    }
}

static BUILTIN_RULES: &[TierRule] = &[
    TierRule {
        tier: HardwareTier::HighEnd,
        min_ram_gb: 32,
        max_ram_gb: None,
        min_vram_gb: 8,
        picks: &[
            pick("qwen2.5:14b", Standing::Primary),
            pick("phi3:14b", Standing::Alternate),
            pick("gpt-oss:20b", Standing::Experimental),
        ],
    },
    // Also catches ram >= 32 without a capable GPU.
    TierRule {
        tier: HardwareTier::MidRange,
        min_ram_gb: 16,
        max_ram_gb: None,
        min_vram_gb: 0,
        picks: &[
            pick("llama3.1:8b", Standing::Primary),
            pick("mistral:7b", Standing::Alternate),
            pick("codellama:7b", Standing::Specialized),
            pick("gpt-oss:20b", Standing::NotRecommended),
        ],
    },
    TierRule {
        tier: HardwareTier::LowerEnd,
        min_ram_gb: 8,
        max_ram_gb: Some(16),
        min_vram_gb: 0,
        picks: &[
            pick("llama3.2:3b", Standing::Primary),
            pick("phi3:mini", Standing::Alternate),
            pick("llama3.2:1b", Standing::Alternate),
        ],
    },
    TierRule {
        tier: HardwareTier::Basic,
        min_ram_gb: 0,
        max_ram_gb: Some(8),
        min_vram_gb: 0,
        picks: &[
            pick("llama3.2:1b", Standing::Primary),
            pick("gemma2:2b", Standing::Alternate),
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    /// No rule matched; the table does not cover the profile.
    #[error("no hardware tier matches {ram_gb} GB RAM / {vram_gb} GB VRAM")]
    UnknownHardwareTier { ram_gb: u64, vram_gb: u64 },

    #[error("tier table is empty")]
    EmptyTable,

    #[error("last tier ({0}) has thresholds; the table needs a catch-all row")]
    MissingCatchAll(HardwareTier),

    #[error("tier {0} lists no models")]
    EmptyTier(HardwareTier),

    #[error("tier {tier} references '{identifier}', which is not in the catalog")]
    UnknownModel {
        tier: HardwareTier,
        identifier: &'static str,
    },
}

/// A model picked for a tier, with its generation defaults resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedModel {
    pub entry: &'static ModelCatalogEntry,
    pub standing: Standing,
    pub defaults: GenerationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub tier: HardwareTier,
    pub models: Vec<RecommendedModel>,
}

impl Recommendation {
    /// Catalog entries in recommendation order.
    pub fn entries(&self) -> impl Iterator<Item = &'static ModelCatalogEntry> + '_ {
        self.models.iter().map(|m| m.entry)
    }

    pub fn identifiers(&self) -> Vec<&'static str> {
        self.entries().map(|e| e.identifier).collect()
    }

    /// First pick that is not flagged as challenging.
    pub fn top_pick(&self) -> Option<&RecommendedModel> {
        self.models.iter().find(|m| m.standing.is_top_pick())
    }

    /// 1-based lookup, as used by numbered selection.
    pub fn choice(&self, number: usize) -> Option<&RecommendedModel> {
        number.checked_sub(1).and_then(|i| self.models.get(i))
    }

    pub fn standing_of(&self, identifier: &str) -> Option<Standing> {
        self.models
            .iter()
            .find(|m| m.entry.identifier == identifier)
            .map(|m| m.standing)
    }
}

/// A validated, ordered tier table.
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    rules: &'static [TierRule],
}

impl RuleTable {
    /// Validate a table: non-empty, catch-all last, every tier populated with
    /// catalog models.
    pub fn new(rules: &'static [TierRule]) -> Result<Self, RecommendError> {
        let last = rules.last().ok_or(RecommendError::EmptyTable)?;
        if !last.is_catch_all() {
            return Err(RecommendError::MissingCatchAll(last.tier));
        }
        for rule in rules {
            if rule.picks.is_empty() {
                return Err(RecommendError::EmptyTier(rule.tier));
            }
            if let Some(missing) = rule
                .picks
                .iter()
                .find(|p| catalog::find(p.identifier).is_none())
            {
                return Err(RecommendError::UnknownModel {
                    tier: rule.tier,
                    identifier: missing.identifier,
                });
            }
        }
        Ok(Self { rules })
    }

    /// Build without validation; `recommend` then reports gaps as
    /// `UnknownHardwareTier`.
    pub fn unchecked(rules: &'static [TierRule]) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self { rules: BUILTIN_RULES }
    }

    pub fn rules(&self) -> &'static [TierRule] {
        self.rules
    }

    pub fn select(&self, profile: &HardwareProfile) -> Result<&'static TierRule, RecommendError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(profile))
            .ok_or(RecommendError::UnknownHardwareTier {
                ram_gb: profile.ram_gb,
                vram_gb: profile.gpu_vram_gb,
            })
    }

    pub fn recommend(&self, profile: &HardwareProfile) -> Result<Recommendation, RecommendError> {
        let rule = self.select(profile)?;
        let models = rule
            .picks
            .iter()
            .filter_map(|p| {
                catalog::find(p.identifier).map(|entry| RecommendedModel {
                    entry,
                    standing: p.standing,
                    defaults: defaults::defaults_for(entry.identifier),
                })
            })
            .collect::<Vec<_>>();

        if models.is_empty() {
            return Err(RecommendError::EmptyTier(rule.tier));
        }
        debug!(
            tier = rule.tier.label(),
            ram_gb = profile.ram_gb,
            vram_gb = profile.gpu_vram_gb,
            picks = models.len(),
            "selected hardware tier"
        );
        Ok(Recommendation {
            tier: rule.tier,
            models,
        })
    }
}

/// Recommend models for a hardware profile using the built-in tier table.
pub fn recommend(profile: &HardwareProfile) -> Recommendation {
    RuleTable::builtin()
        .recommend(profile)
        .expect("built-in tier table covers every hardware profile")
}
