use crate::technique::{Category, Technique};

/// Technique name reported for the untouched payload.
pub const ORIGINAL_TECHNIQUE: &str = "original";
/// Category reported for the untouched payload.
pub const ORIGINAL_CATEGORY: &str = "none";

/// Where an accepted variant came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSource {
    /// The payload itself, kept because `preserve_original` was set.
    Original,
    Technique { name: String, category: Category },
}

/// One accepted variant of one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub original: String,
    pub variant: String,
    pub source: VariantSource,
}

impl VariantRecord {
    pub fn original(payload: &str) -> Self {
        Self {
            original: payload.to_string(),
            variant: payload.to_string(),
            source: VariantSource::Original,
        }
    }

    pub fn from_technique(payload: &str, variant: String, technique: &dyn Technique) -> Self {
        Self {
            original: payload.to_string(),
            variant,
            source: VariantSource::Technique {
                name: technique.name().to_string(),
                category: technique.category(),
            },
        }
    }

    pub fn technique_name(&self) -> &str {
        match &self.source {
            VariantSource::Original => ORIGINAL_TECHNIQUE,
            VariantSource::Technique { name, .. } => name,
        }
    }

    pub fn category_name(&self) -> &str {
        match &self.source {
            VariantSource::Original => ORIGINAL_CATEGORY,
            VariantSource::Technique { category, .. } => category.as_str(),
        }
    }
}
