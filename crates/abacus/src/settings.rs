use crate::decoy::DecoyTag;
use serde::{Deserialize, Serialize};

/// Options controlling a single aggregation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Protein name prefix identifying decoy entries. Empty disables
    /// decoy awareness entirely
    pub decoy_tag: DecoyTag,
    /// PSMs and peptide evidence below this probability are not counted
    pub min_peptide_probability: f64,
    /// Protein groups below this probability are discarded
    pub min_protein_probability: f64,
    /// Maximum protein-level false discovery rate, only applied when
    /// `decoy_tag` is set
    pub protein_fdr: f64,
    /// Assign every shared peptide ion to exactly one protein group
    pub razor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decoy_tag: DecoyTag::default(),
            min_peptide_probability: 0.0,
            min_protein_probability: 0.0,
            protein_fdr: 0.01,
            razor: false,
        }
    }
}

impl Settings {
    /// Log suspicious values. Nothing here is fatal
    pub fn check(&self) {
        for (name, value) in [
            ("min_peptide_probability", self.min_peptide_probability),
            ("min_protein_probability", self.min_protein_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                log::warn!("{} = {} is outside of [0, 1]", name, value);
            }
        }
        if self.protein_fdr > 0.05 {
            log::warn!("protein_fdr is higher than expected: {}", self.protein_fdr);
        }
        if !self.decoy_tag.is_enabled() {
            log::warn!("no decoy tag set - protein FDR filtering is disabled");
        }
    }
}
