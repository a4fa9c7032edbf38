//! Loading of per-experiment identification results
//!
//! An experiment directory holds a `psm.tsv` PSM list, a FASTA protein
//! database and any number of `*.pep.xml` exchange files. Only the exchange
//! file paths are recorded; they are handed to the external grouping tool.

use crate::database::ProteinDatabase;
use crate::decoy::DecoyTag;
use crate::heap::Intensity;
use crate::ion::PeptideIon;
use crate::psm::{read_psms, PeptideSpectrumMatch};
use crate::Error;
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const PSM_FILE: &str = "psm.tsv";
const FASTA_EXTENSIONS: [&str; 3] = ["fasta", "fas", "fa"];
const EXCHANGE_SUFFIX: &str = ".pep.xml";

#[derive(Debug)]
pub struct Experiment {
    pub name: Arc<str>,
    pub path: PathBuf,
    pub psms: Vec<PeptideSpectrumMatch>,
    pub database: ProteinDatabase,
    /// Sorted paths of the `*.pep.xml` files found in the directory
    pub exchange_files: Vec<PathBuf>,
}

impl Experiment {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let path = dir
            .canonicalize()
            .map_err(|e| Error::missing(dir, e.to_string()))?;
        if !path.is_dir() {
            return Err(Error::missing(dir, "not a directory"));
        }
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| Error::missing(dir, "cannot derive experiment name"))?;

        let mut files = std::fs::read_dir(&path)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|source| Error::IO {
                path: path.clone(),
                source,
            })?;
        files.retain(|p| p.is_file());
        files.sort();

        let psm_path = path.join(PSM_FILE);
        if !psm_path.is_file() {
            return Err(Error::missing(psm_path, "no PSM list in experiment"));
        }

        let fasta = files
            .iter()
            .find(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FASTA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::missing(&path, "no FASTA protein database in experiment"))?;

        let exchange_files = files
            .iter()
            .filter(|p| {
                p.file_name()
                    .map(|s| s.to_string_lossy().ends_with(EXCHANGE_SUFFIX))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        Ok(Experiment {
            name: Arc::from(name),
            psms: read_psms(&psm_path)?,
            database: ProteinDatabase::open(fasta)?,
            exchange_files,
            path,
        })
    }

    /// Number of PSMs classified as decoys
    pub fn decoys(&self, tag: &DecoyTag) -> usize {
        self.psms.iter().filter(|psm| psm.is_decoy(tag)).count()
    }

    /// Every PSM intensity in the experiment, grouped by peptide ion
    pub fn intensities(&self) -> FnvHashMap<PeptideIon, Vec<Intensity>> {
        let mut map: FnvHashMap<PeptideIon, Vec<Intensity>> = FnvHashMap::default();
        for psm in &self.psms {
            map.entry(psm.ion())
                .or_default()
                .push(Intensity(psm.intensity));
        }
        map
    }
}

/// Load every experiment directory in parallel. The result is sorted by
/// experiment name, and two directories resolving to the same name are an
/// error.
pub fn load_all<P: AsRef<Path> + Sync>(dirs: &[P], tag: &DecoyTag) -> Result<Vec<Experiment>, Error> {
    let start = Instant::now();
    let mut experiments = dirs
        .par_iter()
        .map(Experiment::load)
        .collect::<Result<Vec<_>, _>>()?;

    experiments.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(dup) = experiments.windows(2).find(|w| w[0].name == w[1].name) {
        return Err(Error::DuplicateExperiment(dup[0].name.to_string()));
    }

    for exp in &experiments {
        let decoys = exp.decoys(tag);
        log::info!(
            "{}: {} PSMs ({} targets, {} decoys), {} proteins, {} exchange files",
            exp.name,
            exp.psms.len(),
            exp.psms.len() - decoys,
            decoys,
            exp.database.len(),
            exp.exchange_files.len()
        );
    }
    log::info!(
        "loaded {} experiments in {}ms",
        experiments.len(),
        start.elapsed().as_millis()
    );
    Ok(experiments)
}
