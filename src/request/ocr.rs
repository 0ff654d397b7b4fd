use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BuildError, RequestDefaults, RequestOptions, encode_content, merge_args};
use crate::item::WorkItem;

/// Body of `POST /ocr` on an OpenOCR server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRequest {
    pub engine: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub engine_args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preprocessors: Vec<String>,
    pub img_base64: String,
}

/// Build an OCR request. Empty content is rejected before anything is
/// encoded.
pub fn build_ocr(
    item: &WorkItem,
    options: &RequestOptions,
    defaults: &RequestDefaults,
) -> Result<OcrRequest, BuildError> {
    if item.is_empty() {
        return Err(BuildError::EmptyInput);
    }

    let preprocessors = options
        .preprocessors
        .clone()
        .unwrap_or_else(|| defaults.preprocessors.clone());

    Ok(OcrRequest {
        engine: defaults.engine.clone(),
        engine_args: merge_args(&defaults.engine_args, &options.engine_args),
        preprocessors,
        img_base64: encode_content(item.content()),
    })
}
