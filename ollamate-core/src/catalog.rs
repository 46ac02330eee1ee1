//! The curated model catalog.
//!
//! One static table, shared by the recommendation rules, the CLI listings
//! and the interactive selector.

use std::fmt;

use serde::Serialize;

/// Parameter-count bracket of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Tiny,
    Small,
    Medium,
    Large,
    XLarge,
}

impl SizeTier {
    pub fn label(&self) -> &'static str {
        match self {
            SizeTier::Tiny => "tiny",
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
            SizeTier::XLarge => "xlarge",
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCatalogEntry {
    /// Ollama tag, e.g. "llama3.1:8b".
    pub identifier: &'static str,
    pub display_name: &'static str,
    /// Download size in GB.
    pub size_gb: f64,
    pub tier: SizeTier,
    pub tags: &'static [&'static str],
    pub summary: &'static str,
}

impl ModelCatalogEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Family part of the tag, before the colon.
    pub fn family(&self) -> &'static str {
        self.identifier
            .split_once(':')
            .map(|(family, _)| family)
            .unwrap_or(self.identifier)
    }
}

pub static CATALOG: &[ModelCatalogEntry] = &[
    ModelCatalogEntry {
        identifier: "llama3.2:1b",
        display_name: "Llama 3.2 1B",
        size_gb: 1.3,
        tier: SizeTier::Tiny,
        tags: &["chat", "fast"],
        summary: "Smallest Llama; runs on almost anything",
    },
    ModelCatalogEntry {
        identifier: "gemma2:2b",
        display_name: "Gemma 2 2B",
        size_gb: 1.6,
        tier: SizeTier::Small,
        tags: &["chat"],
        summary: "Compact Google model with good answer quality for its size",
    },
    ModelCatalogEntry {
        identifier: "phi3:mini",
        display_name: "Phi-3 Mini",
        size_gb: 1.8,
        tier: SizeTier::Small,
        tags: &["chat", "reasoning"],
        summary: "Microsoft's mini model, strong reasoning per gigabyte",
    },
    ModelCatalogEntry {
        identifier: "llama3.2:3b",
        display_name: "Llama 3.2 3B",
        size_gb: 2.0,
        tier: SizeTier::Small,
        tags: &["chat", "general"],
        summary: "Balanced small model for everyday chat",
    },
    ModelCatalogEntry {
        identifier: "mistral:7b",
        display_name: "Mistral 7B",
        size_gb: 4.1,
        tier: SizeTier::Medium,
        tags: &["chat", "general"],
        summary: "Fast general-purpose 7B model",
    },
    ModelCatalogEntry {
        identifier: "codellama:7b",
        display_name: "Code Llama 7B",
        size_gb: 3.8,
        tier: SizeTier::Medium,
        tags: &["coding"],
        summary: "Llama tuned for code generation and explanation",
    },
    ModelCatalogEntry {
        identifier: "llama3.1:8b",
        display_name: "Llama 3.1 8B",
        size_gb: 4.7,
        tier: SizeTier::Medium,
        tags: &["chat", "general"],
        summary: "Best all-rounder for mid-range machines",
    },
    ModelCatalogEntry {
        identifier: "qwen2.5:14b",
        display_name: "Qwen 2.5 14B",
        size_gb: 9.0,
        tier: SizeTier::Large,
        tags: &["chat", "general", "coding"],
        summary: "High quality multilingual model",
    },
    ModelCatalogEntry {
        identifier: "phi3:14b",
        display_name: "Phi-3 Medium 14B",
        size_gb: 7.9,
        tier: SizeTier::Large,
        tags: &["chat", "reasoning"],
        summary: "Larger Phi with strong reasoning",
    },
    ModelCatalogEntry {
        identifier: "gpt-oss:20b",
        display_name: "GPT-OSS 20B",
        size_gb: 14.0,
        tier: SizeTier::XLarge,
        tags: &["chat", "reasoning", "experimental"],
        summary: "Open-weight 20B model; needs a lot of memory",
    },
];

/// Look up an entry by exact identifier (case-insensitive).
pub fn find(identifier: &str) -> Option<&'static ModelCatalogEntry> {
    CATALOG
        .iter()
        .find(|e| e.identifier.eq_ignore_ascii_case(identifier.trim()))
}

impl ModelCatalogEntry {
    /// Every whitespace-separated term of `query` must appear somewhere in
    /// the identifier, display name, size tier or tags. Case-insensitive;
    /// an empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let mut terms = query.split_whitespace().peekable();
        if terms.peek().is_none() {
            return true;
        }
        let haystack = format!(
            "{} {} {} {}",
            self.identifier,
            self.display_name,
            self.tier.label(),
            self.tags.join(" ")
        )
        .to_lowercase();
        terms.all(|term| haystack.contains(term))
    }
}

/// Catalog entries matching `query`, in table order.
pub fn search(query: &str) -> Vec<&'static ModelCatalogEntry> {
    CATALOG.iter().filter(|e| e.matches(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_identifiers_are_unique() {
        let ids: HashSet<&str> = CATALOG.iter().map(|e| e.identifier).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_catalog_entries_are_well_formed() {
        for entry in CATALOG {
            assert!(entry.identifier.contains(':'), "{}", entry.identifier);
            assert!(entry.size_gb > 0.0, "{}", entry.identifier);
            assert!(!entry.tags.is_empty(), "{}", entry.identifier);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("LLAMA3.1:8B").unwrap().identifier, "llama3.1:8b");
        assert_eq!(find(" gpt-oss:20b ").unwrap().tier, SizeTier::XLarge);
        assert!(find("llama3.1").is_none());
    }

    #[test]
    fn test_search_matches_tags_and_names() {
        let coding = search("coding");
        assert!(coding.iter().any(|e| e.identifier == "codellama:7b"));

        let phi = search("Phi");
        assert_eq!(phi.len(), 2);

        assert_eq!(search("").len(), CATALOG.len());
        assert_eq!(search("   ").len(), CATALOG.len());
        assert!(search("nonexistent").is_empty());
    }

    #[test]
    fn test_matches_requires_every_term() {
        let codellama = find("codellama:7b").unwrap();
        assert!(codellama.matches("code llama"));
        assert!(codellama.matches("LLAMA coding"));
        assert!(!codellama.matches("code mistral"));
        assert!(codellama.matches(""));
    }

    #[test]
    fn test_family_and_tags() {
        let entry = find("codellama:7b").unwrap();
        assert_eq!(entry.family(), "codellama");
        assert!(entry.has_tag("Coding"));
        assert!(!entry.has_tag("vision"));
    }
}
