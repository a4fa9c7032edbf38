use std::sync::Arc;

/// A peptide (with optional modifications) at a given charge state, treated
/// as a single quantifiable unit.
///
/// `sequence` is the modified peptide string when one is available, and the
/// plain sequence otherwise. Equality is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeptideIon {
    pub sequence: String,
    pub charge: u8,
}

impl PeptideIon {
    /// Build an ion key, preferring `modified` when it is non-empty
    pub fn new(sequence: &str, modified: Option<&str>, charge: u8) -> Self {
        let sequence = match modified {
            Some(m) if !m.is_empty() => m,
            _ => sequence,
        };
        Self {
            sequence: sequence.to_string(),
            charge,
        }
    }
}

impl std::fmt::Display for PeptideIon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.sequence, self.charge)
    }
}

/// A [`PeptideIon`] observed in a named experiment
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExperimentIon {
    pub experiment: Arc<str>,
    pub ion: PeptideIon,
}

impl std::fmt::Display for ExperimentIon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.experiment, self.ion)
    }
}
