//! Per-protein, per-experiment quantification of resolved protein groups
//!
//! Each resolved record's peptide ions are split into total, unique and
//! razor sets. For every experiment and every set, the spectral count is the
//! sum of index observations over the set, and the intensity is the sum of
//! the three most intense PSMs whose ion falls in the set.

use crate::database::ProteinDatabase;
use crate::decoy::DecoyTag;
use crate::experiment::Experiment;
use crate::heap::{top_n_sum, Intensity, TOP_N};
use crate::index::GlobalPeptideIonIndex;
use crate::ion::PeptideIon;
use crate::protxml::ProteinGroupRecord;
use fnv::FnvHashMap;
use log::info;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentQuant {
    pub experiment: Arc<str>,
    pub total_spectral_count: usize,
    pub unique_spectral_count: usize,
    pub razor_spectral_count: usize,
    pub total_intensity: f64,
    pub unique_intensity: f64,
    pub razor_intensity: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedEvidence {
    pub group_number: u32,
    pub sibling_id: String,
    pub protein_name: String,
    /// Joined from the protein database, empty if no header matched
    pub protein_id: String,
    pub entry_name: String,
    pub gene_names: String,
    pub length: usize,
    pub probability: f64,
    pub top_peptide_probability: f64,
    pub is_decoy: bool,
    /// Distinct plain sequences supporting the group
    pub unique_stripped_peptides: usize,
    pub total_ions: BTreeSet<PeptideIon>,
    pub unique_ions: BTreeSet<PeptideIon>,
    pub razor_ions: BTreeSet<PeptideIon>,
    /// One entry per experiment, sorted by experiment name
    pub quant: Vec<ExperimentQuant>,
}

impl CombinedEvidence {
    /// `<group number>-<sibling ID>`
    pub fn protein_group(&self) -> String {
        format!("{}-{}", self.group_number, self.sibling_id)
    }

    pub fn total_ion_count(&self) -> usize {
        self.total_ions.len()
    }

    pub fn unique_ion_count(&self) -> usize {
        self.unique_ions.len()
    }

    pub fn razor_ion_count(&self) -> usize {
        self.razor_ions.len()
    }

    pub fn shared_ion_count(&self) -> usize {
        self.total_ion_count() - self.unique_ion_count()
    }
}

/// PSM intensities of one experiment, grouped by peptide ion
struct ExperimentIntensities {
    name: Arc<str>,
    intensities: FnvHashMap<PeptideIon, Vec<Intensity>>,
}

impl ExperimentIntensities {
    fn top_n(&self, ions: &BTreeSet<PeptideIon>) -> f64 {
        let values = ions
            .iter()
            .filter_map(|ion| self.intensities.get(ion))
            .flatten()
            .copied()
            .collect();
        top_n_sum(values, TOP_N)
    }
}

fn spectral_count(
    index: &GlobalPeptideIonIndex,
    experiment: &Arc<str>,
    ions: &BTreeSet<PeptideIon>,
) -> usize {
    ions.iter()
        .map(|ion| index.observations(experiment, ion))
        .sum()
}

fn evaluate(
    record: &ProteinGroupRecord,
    index: &GlobalPeptideIonIndex,
    experiments: &[ExperimentIntensities],
    database: &ProteinDatabase,
    tag: &DecoyTag,
) -> CombinedEvidence {
    let mut total_ions = BTreeSet::new();
    let mut unique_ions = BTreeSet::new();
    let mut razor_ions = BTreeSet::new();
    let mut stripped = BTreeSet::new();
    for peptide in &record.peptides {
        let ion = peptide.ion();
        if peptide.is_unique {
            unique_ions.insert(ion.clone());
        }
        if peptide.razor {
            razor_ions.insert(ion.clone());
        }
        total_ions.insert(ion);
        stripped.insert(peptide.sequence.as_str());
    }

    let quant = experiments
        .iter()
        .map(|exp| ExperimentQuant {
            experiment: Arc::clone(&exp.name),
            total_spectral_count: spectral_count(index, &exp.name, &total_ions),
            unique_spectral_count: spectral_count(index, &exp.name, &unique_ions),
            razor_spectral_count: spectral_count(index, &exp.name, &razor_ions),
            total_intensity: exp.top_n(&total_ions),
            unique_intensity: exp.top_n(&unique_ions),
            razor_intensity: exp.top_n(&razor_ions),
        })
        .collect();

    let identity = database.find_by_header(&record.protein_name);
    let (protein_id, entry_name, gene_names) = identity
        .map(|r| (r.id.clone(), r.entry_name.clone(), r.gene_names.clone()))
        .unwrap_or_default();

    CombinedEvidence {
        group_number: record.group_number,
        sibling_id: record.sibling_id.clone(),
        protein_name: record.protein_name.clone(),
        protein_id,
        entry_name,
        gene_names,
        length: record
            .length
            .or_else(|| identity.map(|r| r.length))
            .unwrap_or_default(),
        probability: record.probability,
        top_peptide_probability: record.top_peptide_probability,
        is_decoy: record.is_decoy(tag),
        unique_stripped_peptides: stripped.len(),
        total_ions,
        unique_ions,
        razor_ions,
        quant,
    }
}

/// Combine resolved protein groups with per-experiment PSM evidence.
///
/// Output rows are sorted by group number and sibling ID, and each row's
/// quantification by experiment name, whatever the order of the inputs.
pub fn build(
    records: &[ProteinGroupRecord],
    index: &GlobalPeptideIonIndex,
    experiments: &[Experiment],
    database: &ProteinDatabase,
    tag: &DecoyTag,
) -> Vec<CombinedEvidence> {
    let start = Instant::now();
    let mut intensities = experiments
        .par_iter()
        .map(|exp| ExperimentIntensities {
            name: Arc::clone(&exp.name),
            intensities: exp.intensities(),
        })
        .collect::<Vec<_>>();
    intensities.sort_by(|a, b| a.name.cmp(&b.name));

    let mut evidence = records
        .par_iter()
        .map(|record| evaluate(record, index, &intensities, database, tag))
        .collect::<Vec<_>>();
    evidence.sort_by(|a, b| {
        a.group_number
            .cmp(&b.group_number)
            .then_with(|| a.sibling_id.cmp(&b.sibling_id))
    });

    let unmatched = evidence.iter().filter(|e| e.protein_id.is_empty()).count();
    if unmatched > 0 {
        log::debug!("{} protein groups have no matching database entry", unmatched);
    }
    info!(
        "computed evidence for {} protein groups across {} experiments in {}ms",
        evidence.len(),
        intensities.len(),
        start.elapsed().as_millis()
    );
    evidence
}
