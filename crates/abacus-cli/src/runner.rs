use crate::grouper::{self, COMBINED_FILE};
use crate::input::Search;
use abacus_core::database::ProteinDatabase;
use abacus_core::evidence::{self, CombinedEvidence};
use abacus_core::experiment::{self, Experiment};
use abacus_core::index::GlobalPeptideIonIndex;
use abacus_core::protxml::read_protxml;
use abacus_core::resolver::resolve;
use anyhow::Context;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

pub struct Runner {
    pub experiments: Vec<Experiment>,
    pub parameters: Search,
    start: Instant,
}

impl Runner {
    pub fn new(parameters: Search) -> anyhow::Result<Self> {
        let start = Instant::now();
        let experiments = experiment::load_all(
            &parameters.experiments,
            &parameters.settings.decoy_tag,
        )
        .context("Failed to load experiments")?;

        Ok(Runner {
            experiments,
            parameters,
            start,
        })
    }

    pub fn make_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.parameters.output_directory.join(file_name.as_ref())
    }

    /// Protein database used to annotate protein groups. Every experiment is
    /// expected to be searched against the same database; the first one (by
    /// name) is used.
    fn database(&self) -> anyhow::Result<&ProteinDatabase> {
        let first = self
            .experiments
            .first()
            .context("no experiments were loaded")?;
        for exp in &self.experiments[1..] {
            if exp.database.len() != first.database.len() {
                log::warn!(
                    "protein databases differ between `{}` ({} entries) and `{}` ({} entries), using `{}`",
                    first.name,
                    first.database.len(),
                    exp.name,
                    exp.database.len(),
                    first.name
                );
            }
        }
        Ok(&first.database)
    }

    /// Locate the combined protein grouping, building it from every
    /// experiment's exchange files if none was supplied
    fn combined_grouping(&self) -> anyhow::Result<PathBuf> {
        match &self.parameters.combined {
            Some(path) => {
                info!("using combined protein grouping `{}`", path.display());
                Ok(path.clone())
            }
            None => {
                info!("creating the combined protein grouping");
                let exchange_files = self
                    .experiments
                    .iter()
                    .flat_map(|exp| exp.exchange_files.iter().cloned())
                    .collect::<Vec<_>>();
                grouper::combine(
                    &self.parameters.grouping_program,
                    &exchange_files,
                    &self.make_path(COMBINED_FILE),
                )
            }
        }
    }

    pub fn aggregate(&self) -> anyhow::Result<Vec<CombinedEvidence>> {
        let settings = &self.parameters.settings;

        let start = Instant::now();
        let index = GlobalPeptideIonIndex::build(&self.experiments, settings.min_peptide_probability);
        info!(
            "indexed {} peptide ions in {}ms",
            index.len(),
            start.elapsed().as_millis()
        );

        let path = self.combined_grouping()?;
        let records = read_protxml(&path)
            .with_context(|| format!("Failed to read combined protein grouping `{}`", path.display()))?;
        info!("read {} protein group records", records.len());

        let resolved = resolve(records, settings);
        Ok(evidence::build(
            &resolved,
            &index,
            &self.experiments,
            self.database()?,
            &settings.decoy_tag,
        ))
    }

    pub fn run(mut self) -> anyhow::Result<Search> {
        let evidence = self.aggregate()?;

        let decoys = evidence.iter().filter(|e| e.is_decoy).count();
        info!(
            "reporting {} protein groups ({} targets, {} decoys)",
            evidence.len(),
            evidence.len() - decoys,
            decoys
        );

        let written = self.write_combined(&evidence)?;
        self.parameters.output_paths.extend(written);

        let path = self.make_path("results.json");
        self.parameters
            .output_paths
            .push(path.display().to_string());
        println!("{}", serde_json::to_string_pretty(&self.parameters)?);

        let bytes = serde_json::to_vec_pretty(&self.parameters)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write `{}`", path.display()))?;

        info!("finished in {}s", self.start.elapsed().as_secs());
        Ok(self.parameters)
    }
}
