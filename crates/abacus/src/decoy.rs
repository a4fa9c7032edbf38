//! Target/decoy classification by protein name prefix
//!
//! Every classifier here is a pure function of its arguments, so it can be
//! called from any number of threads without synchronization.

use serde::{Deserialize, Serialize};

/// Protein name prefix marking decoy database entries (e.g. `rev_`).
///
/// An empty tag disables decoy awareness: nothing is ever classified as a
/// decoy, since every name trivially starts with the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecoyTag(String);

impl DecoyTag {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    /// A single protein name is a decoy iff it starts with the tag
    pub fn is_decoy(&self, name: &str) -> bool {
        self.is_enabled() && name.starts_with(&self.0)
    }

    /// Classify a PSM from its primary protein and the alternative proteins
    /// it also maps to.
    ///
    /// When there is more than one alternative, a single target alternative
    /// is enough to rescue the PSM from decoy status.
    pub fn is_decoy_psm<S: AsRef<str>>(&self, protein: &str, alternatives: &[S]) -> bool {
        if alternatives.len() > 1
            && alternatives
                .iter()
                .any(|alt| !self.is_decoy(alt.as_ref()))
        {
            return false;
        }
        self.is_decoy(protein)
    }

    /// A set of protein names (e.g. every protein a peptide ion maps to) is
    /// a decoy iff *every* name is a decoy. An empty set is a decoy.
    pub fn is_decoy_set<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.is_enabled() {
            return false;
        }
        names.into_iter().all(|name| name.as_ref().starts_with(&self.0))
    }
}

impl From<&str> for DecoyTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for DecoyTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl std::fmt::Display for DecoyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
