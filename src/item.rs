use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One unit of input: raw bytes plus string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkItem {
    content: Vec<u8>,
    attributes: BTreeMap<String, String>,
}

impl WorkItem {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(attributes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Hex SHA-256 of the content. Stable id for logs and output names.
    pub fn fingerprint(&self) -> String {
        let mut h = Sha256::new();
        h.update(&self.content);
        format!("{:x}", h.finalize())
    }

    /// Same attributes, new content.
    pub fn derive(&self, content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            attributes: self.attributes.clone(),
        }
    }
}
