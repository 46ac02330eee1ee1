//! Generation defaults derived from a model tag's size suffix.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationDefaults {
    /// Row used for small models and for anything we cannot classify.
    pub const CONSERVATIVE: GenerationDefaults = GenerationDefaults {
        max_tokens: 2048,
        temperature: 0.7,
    };
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self::CONSERVATIVE
    }
}

/// Parameter-size class parsed from a tag like `llama3.1:8b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// 1b, 2b, 3b
    Compact,
    /// 7b, 8b
    Balanced,
    /// 13b, 14b
    Generous,
    /// 20b, 34b; kept short so large models stay responsive
    Heavy,
}

impl SizeClass {
    pub fn defaults(&self) -> GenerationDefaults {
        match self {
            SizeClass::Compact | SizeClass::Heavy => GenerationDefaults::CONSERVATIVE,
            SizeClass::Balanced => GenerationDefaults {
                max_tokens: 3072,
                temperature: 0.8,
            },
            SizeClass::Generous => GenerationDefaults {
                max_tokens: 4096,
                temperature: 0.8,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefaultsError {
    #[error("unrecognized model size suffix in '{identifier}'")]
    UnrecognizedModelSuffix { identifier: String },
}

/// Classify the suffix after the last `:`. Quantization or variant
/// qualifiers after the size (`8b-instruct-q4_K_M`) are ignored.
pub fn size_class(identifier: &str) -> Result<SizeClass, DefaultsError> {
    let unrecognized = || DefaultsError::UnrecognizedModelSuffix {
        identifier: identifier.to_string(),
    };

    let (_, suffix) = identifier.trim().rsplit_once(':').ok_or_else(unrecognized)?;
    let size = suffix.split('-').next().unwrap_or_default().to_ascii_lowercase();
    let billions = size
        .strip_suffix('b')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(unrecognized)?;

    match billions {
        1..=3 => Ok(SizeClass::Compact),
        7 | 8 => Ok(SizeClass::Balanced),
        13 | 14 => Ok(SizeClass::Generous),
        20 | 34 => Ok(SizeClass::Heavy),
        _ => Err(unrecognized()),
    }
}

/// Suggested `max_tokens`/`temperature` for a model tag. Never fails:
/// unknown suffixes get the conservative row.
pub fn defaults_for(identifier: &str) -> GenerationDefaults {
    match size_class(identifier) {
        Ok(class) => class.defaults(),
        Err(e) => {
            debug!("{e}; using conservative generation defaults");
            GenerationDefaults::CONSERVATIVE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(identifier: &str) -> (u32, f64) {
        let d = defaults_for(identifier);
        (d.max_tokens, d.temperature)
    }

    #[test]
    fn test_defaults_table() {
        assert_eq!(pair("llama3.2:1b"), (2048, 0.7));
        assert_eq!(pair("gemma2:2b"), (2048, 0.7));
        assert_eq!(pair("llama3.2:3b"), (2048, 0.7));
        assert_eq!(pair("mistral:7b"), (3072, 0.8));
        assert_eq!(pair("llama3.2:8b"), (3072, 0.8));
        assert_eq!(pair("codellama:13b"), (4096, 0.8));
        assert_eq!(pair("qwen2.5:14b"), (4096, 0.8));
        assert_eq!(pair("gpt-oss:20b"), (2048, 0.7));
        assert_eq!(pair("codellama:34b"), (2048, 0.7));
    }

    #[test]
    fn test_unrecognized_suffix_falls_back() {
        assert_eq!(pair("unknown-model:99x"), (2048, 0.7));
        assert_eq!(pair("llama3.3:70b"), (2048, 0.7));
        assert_eq!(pair("phi3:mini"), (2048, 0.7));
        assert_eq!(pair("qwen2.5:1.5b"), (2048, 0.7));
        assert_eq!(pair("phi4"), (2048, 0.7));
        assert_eq!(pair(""), (2048, 0.7));
        assert_eq!(pair("model:"), (2048, 0.7));
        assert_eq!(pair("model:b"), (2048, 0.7));
    }

    #[test]
    fn test_size_class_reports_unrecognized_suffix() {
        let err = size_class("unknown-model:99x").unwrap_err();
        assert_eq!(
            err,
            DefaultsError::UnrecognizedModelSuffix {
                identifier: "unknown-model:99x".to_string()
            }
        );
        assert!(err.to_string().contains("unknown-model:99x"));
    }

    #[test]
    fn test_size_class_ignores_variant_qualifiers() {
        assert_eq!(
            size_class("llama3.1:8b-instruct-q4_K_M"),
            Ok(SizeClass::Balanced)
        );
        assert_eq!(size_class("Qwen2.5:14B"), Ok(SizeClass::Generous));
        // only the last colon counts
        assert_eq!(size_class("registry:5000/llama:3b"), Ok(SizeClass::Compact));
    }

    #[test]
    fn test_default_is_conservative() {
        assert_eq!(GenerationDefaults::default(), GenerationDefaults::CONSERVATIVE);
    }
}
