use abacus_core::decoy::DecoyTag;
use abacus_core::Settings;
use anyhow::{ensure, Context};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_GROUPING_PROGRAM: &str = "ProteinProphet";

/// Fully resolved run configuration
#[derive(Serialize, Clone, Debug)]
pub struct Search {
    pub version: String,
    pub settings: Settings,
    pub experiments: Vec<PathBuf>,
    /// Pre-built combined protein grouping, if supplied
    pub combined: Option<PathBuf>,
    pub grouping_program: String,
    pub output_paths: Vec<String>,

    #[serde(skip_serializing)]
    pub output_directory: PathBuf,

    #[serde(skip_serializing)]
    pub copy_to_working_directory: bool,
}

/// Run configuration as read from a JSON parameter file. Every field is
/// optional and may be overridden from the command line
#[derive(Deserialize, Default, Debug)]
pub struct Input {
    decoy_tag: Option<String>,
    min_peptide_probability: Option<f64>,
    min_protein_probability: Option<f64>,
    protein_fdr: Option<f64>,
    razor: Option<bool>,
    combined: Option<String>,
    output_directory: Option<String>,
    experiments: Option<Vec<String>>,
    grouping_program: Option<String>,
}

impl Input {
    pub fn from_arguments(matches: ArgMatches) -> anyhow::Result<Self> {
        let mut input = match matches.get_one::<String>("parameters") {
            Some(path) => Input::load(path)
                .with_context(|| format!("Failed to read parameters from `{path}`"))?,
            None => Input::default(),
        };

        // Command line arguments take precedence over the parameter file
        if let Some(experiments) = matches.get_many::<String>("experiments") {
            log::trace!("overriding `experiments` parameter.");
            input.experiments = Some(experiments.into_iter().map(|p| p.into()).collect());
        }
        if let Some(tag) = matches.get_one::<String>("decoy_tag") {
            log::trace!("overriding `decoy_tag` parameter.");
            input.decoy_tag = Some(tag.into());
        }
        if let Some(prob) = matches.get_one::<f64>("peptide_probability").copied() {
            log::trace!("overriding `min_peptide_probability` parameter.");
            input.min_peptide_probability = Some(prob);
        }
        if let Some(prob) = matches.get_one::<f64>("protein_probability").copied() {
            log::trace!("overriding `min_protein_probability` parameter.");
            input.min_protein_probability = Some(prob);
        }
        if let Some(fdr) = matches.get_one::<f64>("protein_fdr").copied() {
            log::trace!("overriding `protein_fdr` parameter.");
            input.protein_fdr = Some(fdr);
        }
        if matches.get_flag("razor") {
            log::trace!("overriding `razor` parameter.");
            input.razor = Some(true);
        }
        if let Some(combined) = matches.get_one::<String>("combined") {
            log::trace!("overriding `combined` parameter.");
            input.combined = Some(combined.into());
        }
        if let Some(output_directory) = matches.get_one::<String>("output_directory") {
            log::trace!("overriding `output_directory` parameter.");
            input.output_directory = Some(output_directory.into());
        }
        if let Some(program) = matches.get_one::<String>("grouping_program") {
            log::trace!("overriding `grouping_program` parameter.");
            input.grouping_program = Some(program.into());
        }

        ensure!(
            input.experiments.as_ref().map_or(false, |e| !e.is_empty()),
            "at least one experiment directory must be given. For more information try '--help'"
        );

        Ok(input)
    }

    pub fn load<S: AsRef<str>>(path: S) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        serde_json::from_slice(&bytes).map_err(anyhow::Error::from)
    }

    pub fn build(self) -> anyhow::Result<Search> {
        let default = Settings::default();
        let settings = Settings {
            decoy_tag: self
                .decoy_tag
                .map(DecoyTag::from)
                .unwrap_or(default.decoy_tag),
            min_peptide_probability: self
                .min_peptide_probability
                .unwrap_or(default.min_peptide_probability),
            min_protein_probability: self
                .min_protein_probability
                .unwrap_or(default.min_protein_probability),
            protein_fdr: self.protein_fdr.unwrap_or(default.protein_fdr),
            razor: self.razor.unwrap_or(default.razor),
        };
        settings.check();

        let experiments = self
            .experiments
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>();
        ensure!(!experiments.is_empty(), "`experiments` must be set");

        let output_directory = match self.output_directory {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::create_dir_all(&path).with_context(|| {
                    format!("Failed to create output directory `{}`", path.display())
                })?;
                path
            }
            None => std::env::current_dir()?,
        };

        let combined = self.combined.map(PathBuf::from);
        if let Some(path) = &combined {
            ensure!(
                path.is_file(),
                "combined protein grouping file `{}` does not exist",
                path.display()
            );
        }

        Ok(Search {
            version: clap::crate_version!().into(),
            settings,
            experiments,
            combined,
            grouping_program: self
                .grouping_program
                .unwrap_or_else(|| DEFAULT_GROUPING_PROGRAM.into()),
            output_paths: Vec::new(),
            output_directory,
            copy_to_working_directory: true,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parameter_file() -> anyhow::Result<()> {
        let json = r#"{
            "decoy_tag": "rev_",
            "min_protein_probability": 0.5,
            "razor": true,
            "experiments": ["a", "b"]
        }"#;
        let input: Input = serde_json::from_str(json)?;
        let search = input.build()?;

        assert_eq!(search.settings.decoy_tag.as_str(), "rev_");
        assert_eq!(search.settings.min_protein_probability, 0.5);
        assert_eq!(search.settings.min_peptide_probability, 0.0);
        assert_eq!(search.settings.protein_fdr, 0.01);
        assert!(search.settings.razor);
        assert_eq!(search.experiments, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(search.grouping_program, DEFAULT_GROUPING_PROGRAM);
        assert!(search.combined.is_none());
        Ok(())
    }

    #[test]
    fn requires_experiments() {
        assert!(Input::default().build().is_err());
    }

    #[test]
    fn missing_combined_file() {
        let input = Input {
            experiments: Some(vec!["a".into()]),
            combined: Some("/definitely/not/combined.prot.xml".into()),
            ..Default::default()
        };
        assert!(input.build().is_err());
    }
}
