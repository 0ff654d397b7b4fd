use serde::{Deserialize, Serialize};

use super::BuildError;
use crate::capability::LanguagePair;
use crate::item::WorkItem;

/// A text to translate in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub source_language: String,
    pub target_language: String,
    pub content: String,
}

impl TranslationRequest {
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(&self.source_language, &self.target_language)
    }
}

pub fn build_translation(
    item: &WorkItem,
    pair: &LanguagePair,
) -> Result<TranslationRequest, BuildError> {
    if item.is_empty() {
        return Err(BuildError::EmptyInput);
    }
    let content = std::str::from_utf8(item.content())
        .map_err(|e| BuildError::Serialization(format!("content is not valid UTF-8: {e}")))?;

    Ok(TranslationRequest {
        source_language: pair.source.clone(),
        target_language: pair.target.clone(),
        content: content.to_string(),
    })
}
