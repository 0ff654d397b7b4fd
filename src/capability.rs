//! Capability negotiation: is a requested language pair admissible for the
//! active engine?

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::consts::LANGUAGE_AUTO;

/// A `(source, target)` translation direction. `source` may be
/// [`LANGUAGE_AUTO`]; equality is exact, so `auto` never equals a concrete
/// language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// A pair whose source is left for the engine to detect.
    pub fn auto(target: impl Into<String>) -> Self {
        Self::new(LANGUAGE_AUTO, target)
    }

    pub fn is_auto_source(&self) -> bool {
        self.source == LANGUAGE_AUTO
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -> {})", self.source, self.target)
    }
}

/// Operations an engine reports it can perform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pairs: HashSet<LanguagePair>,
}

impl CapabilitySet {
    pub fn contains(&self, pair: &LanguagePair) -> bool {
        self.pairs.contains(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguagePair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<LanguagePair> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = LanguagePair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Whether the active engine is checked against a capability set at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityMode {
    /// The engine doesn't answer capability queries; the remote call decides.
    Unchecked,
    /// Capabilities reported right after the engine was last configured.
    Checked(CapabilitySet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Decide whether `requested` may be sent to an engine in `mode`.
///
/// An `auto` source is admitted iff some supported pair has the requested
/// target. Anything else must be present verbatim.
pub fn admit(mode: &CapabilityMode, requested: &LanguagePair) -> Admission {
    let supported = match mode {
        CapabilityMode::Unchecked => return Admission::Admitted,
        CapabilityMode::Checked(set) => set,
    };

    let found = if requested.is_auto_source() {
        supported.iter().any(|lp| lp.target == requested.target)
    } else {
        supported.contains(requested)
    };

    if found {
        Admission::Admitted
    } else {
        Admission::Rejected
    }
}
