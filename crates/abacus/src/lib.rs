//! Combine protein identifications from many independently scored experiments
//! into one protein-level quantitative report.
//!
//! The pipeline is a sequence of folds over immutable inputs:
//!
//! 1. [`experiment::Experiment::load`] reads each experiment directory
//! 2. [`index::GlobalPeptideIonIndex::build`] tallies peptide ions per experiment
//! 3. [`protxml::read_protxml`] reads the combined protein grouping
//! 4. [`resolver::resolve`] promotes decoys, assigns razor peptides and filters
//! 5. [`evidence::build`] computes spectral counts and top-3 intensities
pub mod database;
pub mod decoy;
pub mod evidence;
pub mod experiment;
pub mod heap;
pub mod index;
pub mod ion;
pub mod protxml;
pub mod psm;
pub mod resolver;

mod settings;

pub use settings::Settings;

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing input `{}`: {reason}", path.display())]
    MissingInput { path: PathBuf, reason: String },
    #[error("io error reading `{}`: {source}", path.display())]
    IO {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse `{}`: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("failed to parse `{}`: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("failed to parse protXML `{}`: {source}", path.display())]
    ProtXml {
        path: PathBuf,
        source: protxml::ProtXmlError,
    },
    #[error("experiment name `{0}` is used by more than one input directory")]
    DuplicateExperiment(String),
}

impl Error {
    pub(crate) fn missing<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::MissingInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
