//! `${attribute}` substitution for per-item settings.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{\s*([^}\s]+)\s*\}").expect("attribute reference pattern is valid")
});

/// Replace every `${name}` in `template` with the attribute value.
/// Missing attributes evaluate to the empty string.
pub fn evaluate(template: &str, attributes: &BTreeMap<String, String>) -> String {
    REFERENCE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            attributes.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
