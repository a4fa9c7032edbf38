use crate::experiment::Experiment;
use crate::ion::{ExperimentIon, PeptideIon};
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::sync::Arc;

/// Observation counts of each peptide ion, per experiment, over PSMs that
/// pass a minimum probability. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalPeptideIonIndex {
    counts: FnvHashMap<Arc<str>, FnvHashMap<PeptideIon, usize>>,
}

impl GlobalPeptideIonIndex {
    pub fn build(experiments: &[Experiment], min_peptide_probability: f64) -> Self {
        // Each experiment is tallied independently; partial maps are merged
        // by summation, so the result does not depend on scheduling
        let counts = experiments
            .par_iter()
            .fold(FnvHashMap::default, |mut acc, exp| {
                let tally: &mut FnvHashMap<PeptideIon, usize> =
                    acc.entry(Arc::clone(&exp.name)).or_default();
                for psm in &exp.psms {
                    if psm.probability >= min_peptide_probability {
                        *tally.entry(psm.ion()).or_insert(0) += 1;
                    }
                }
                acc
            })
            .reduce(FnvHashMap::default, |mut a, b| {
                for (experiment, tally) in b {
                    let merged = a.entry(experiment).or_default();
                    for (ion, count) in tally {
                        *merged.entry(ion).or_insert(0) += count;
                    }
                }
                a
            });

        GlobalPeptideIonIndex { counts }
    }

    /// Number of observations of `ion` in `experiment`, 0 if never seen
    pub fn observations(&self, experiment: &str, ion: &PeptideIon) -> usize {
        self.counts
            .get(experiment)
            .and_then(|tally| tally.get(ion))
            .copied()
            .unwrap_or_default()
    }

    /// Number of distinct (experiment, ion) pairs
    pub fn len(&self) -> usize {
        self.counts.values().map(FnvHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExperimentIon, usize)> + '_ {
        self.counts.iter().flat_map(|(experiment, tally)| {
            tally.iter().map(move |(ion, count)| {
                let key = ExperimentIon {
                    experiment: Arc::clone(experiment),
                    ion: ion.clone(),
                };
                (key, *count)
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::ProteinDatabase;
    use crate::psm::PeptideSpectrumMatch;
    use std::path::PathBuf;

    fn experiment(name: &str, psms: &[(&str, u8, f64)]) -> Experiment {
        Experiment {
            name: Arc::from(name),
            path: PathBuf::from(name),
            psms: psms
                .iter()
                .map(|&(peptide, charge, probability)| PeptideSpectrumMatch {
                    peptide: peptide.into(),
                    charge,
                    probability,
                    ..Default::default()
                })
                .collect(),
            database: ProteinDatabase::default(),
            exchange_files: Vec::new(),
        }
    }

    #[test]
    fn tally_per_experiment() {
        let experiments = vec![
            experiment("a", &[("PEPTIDE", 2, 0.97), ("PEPTIDE", 2, 0.5), ("PEPTIDE", 3, 0.9)]),
            experiment("b", &[("PEPTIDE", 2, 0.1), ("AAAK", 1, 1.0)]),
        ];
        let index = GlobalPeptideIonIndex::build(&experiments, 0.5);
        let (a, b) = ("a", "b");
        let ion = PeptideIon::new("PEPTIDE", None, 2);

        assert_eq!(index.observations(a, &ion), 2);
        assert_eq!(index.observations(a, &PeptideIon::new("PEPTIDE", None, 3)), 1);
        // below threshold
        assert_eq!(index.observations(b, &ion), 0);
        assert_eq!(index.observations(b, &PeptideIon::new("AAAK", None, 1)), 1);
        // never seen
        assert_eq!(index.observations("c", &ion), 0);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn order_independent() {
        let a = experiment("a", &[("PEPTIDE", 2, 0.97), ("AAAK", 2, 0.4)]);
        let b = experiment("b", &[("PEPTIDE", 2, 0.97)]);
        let c = experiment("c", &[("PEPTIDE", 2, 0.97), ("PEPTIDE", 2, 0.97)]);
        let forward = GlobalPeptideIonIndex::build(&[a, b, c], 0.0);

        let a = experiment("a", &[("AAAK", 2, 0.4), ("PEPTIDE", 2, 0.97)]);
        let b = experiment("b", &[("PEPTIDE", 2, 0.97)]);
        let c = experiment("c", &[("PEPTIDE", 2, 0.97), ("PEPTIDE", 2, 0.97)]);
        let reverse = GlobalPeptideIonIndex::build(&[c, b, a], 0.0);

        assert_eq!(forward, reverse);
        assert_eq!(forward.iter().map(|(_, n)| n).sum::<usize>(), 5);
        assert_eq!(forward.len(), 4);
    }
}
