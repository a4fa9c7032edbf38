//! Peptide-spectrum matches scored by an upstream statistical engine
//!
//! PSMs are read from a tab-separated `psm.tsv` file with a header row. Only
//! `Peptide`, `Charge` and `Probability` are required; unknown columns are
//! ignored.
//!
//! ```text
//! Spectrum	Peptide	Modified Peptide	Charge	Probability	Intensity	Protein	Mapped Proteins
//! run1.00042.00042.2	PEPTIDE		2	0.9731	15230.5	sp|P02768|ALBU_HUMAN
//! ```

use crate::decoy::DecoyTag;
use crate::ion::PeptideIon;
use crate::Error;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeptideSpectrumMatch {
    pub spectrum: String,
    pub peptide: String,
    /// May be empty if the peptide carries no modifications
    pub modified_peptide: String,
    pub charge: u8,
    /// Probability assigned by the upstream engine, in [0, 1]
    pub probability: f64,
    /// Precursor intensity, 0 if unavailable
    pub intensity: f64,
    pub protein: String,
    pub alternative_proteins: Vec<String>,
}

impl PeptideSpectrumMatch {
    pub fn ion(&self) -> PeptideIon {
        PeptideIon::new(&self.peptide, Some(&self.modified_peptide), self.charge)
    }

    pub fn is_decoy(&self, tag: &DecoyTag) -> bool {
        tag.is_decoy_psm(&self.protein, &self.alternative_proteins)
    }
}

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "Spectrum", default)]
    spectrum: String,
    #[serde(rename = "Peptide")]
    peptide: String,
    #[serde(rename = "Modified Peptide", default)]
    modified_peptide: String,
    #[serde(rename = "Charge")]
    charge: u8,
    #[serde(rename = "Probability")]
    probability: f64,
    #[serde(rename = "Intensity", default)]
    intensity: Option<f64>,
    #[serde(rename = "Protein", default)]
    protein: String,
    #[serde(rename = "Mapped Proteins", default)]
    mapped_proteins: String,
}

/// Parse a tab-separated PSM list. `path` is only used for error reporting
pub fn parse<R: Read>(reader: R, path: &Path) -> Result<Vec<PeptideSpectrumMatch>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(reader);

    let mut psms = Vec::new();
    for (idx, row) in rdr.deserialize::<Row>().enumerate() {
        let row = row.map_err(|source| Error::Csv {
            path: path.into(),
            source,
        })?;
        // header is line 1
        let line = idx + 2;

        if !(0.0..=1.0).contains(&row.probability) {
            return Err(Error::parse(
                path,
                format!("line {}: probability {} outside of [0, 1]", line, row.probability),
            ));
        }
        let intensity = row.intensity.unwrap_or_default();
        if intensity.is_nan() || intensity < 0.0 {
            return Err(Error::parse(
                path,
                format!("line {}: invalid intensity {}", line, intensity),
            ));
        }

        psms.push(PeptideSpectrumMatch {
            spectrum: row.spectrum,
            peptide: row.peptide,
            modified_peptide: row.modified_peptide,
            charge: row.charge,
            probability: row.probability,
            intensity,
            protein: row.protein,
            alternative_proteins: row
                .mapped_proteins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        });
    }
    Ok(psms)
}

pub fn read_psms<P: AsRef<Path>>(path: P) -> Result<Vec<PeptideSpectrumMatch>, Error> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| Error::IO {
        path: path.into(),
        source,
    })?;
    parse(std::io::BufReader::new(file), path)
}

#[cfg(test)]
mod test {
    use super::*;

    const PSMS: &str = "Spectrum\tPeptide\tModified Peptide\tCharge\tProbability\tIntensity\tProtein\tMapped Proteins
s1\tPEPTIDE\t\t2\t0.97\t10\tsp|A|A_HUMAN\t
s2\tPEPTMIDE\tPEPTM[147]IDE\t3\t0.5\t\trev_sp|B|B_HUMAN\tsp|C|C_HUMAN, rev_sp|D|D_HUMAN
";

    #[test]
    fn parse_psm_list() {
        let psms = parse(PSMS.as_bytes(), Path::new("psm.tsv")).unwrap();
        assert_eq!(psms.len(), 2);

        assert_eq!(psms[0].ion(), PeptideIon::new("PEPTIDE", None, 2));
        assert_eq!(psms[0].intensity, 10.0);
        assert!(psms[0].alternative_proteins.is_empty());

        assert_eq!(psms[1].ion().to_string(), "PEPTM[147]IDE#3");
        assert_eq!(psms[1].intensity, 0.0);
        assert_eq!(
            psms[1].alternative_proteins,
            vec!["sp|C|C_HUMAN", "rev_sp|D|D_HUMAN"]
        );
    }

    #[test]
    fn decoy_psm_rescued_by_alternative() {
        let psms = parse(PSMS.as_bytes(), Path::new("psm.tsv")).unwrap();
        let tag = DecoyTag::from("rev_");
        assert!(!psms[0].is_decoy(&tag));
        assert!(!psms[1].is_decoy(&tag));
    }

    #[test]
    fn optional_columns() {
        let data = "Peptide\tCharge\tProbability\nAAAK\t2\t1.0\n";
        let psms = parse(data.as_bytes(), Path::new("psm.tsv")).unwrap();
        assert_eq!(psms[0].ion().to_string(), "AAAK#2");
        assert_eq!(psms[0].intensity, 0.0);
    }

    #[test]
    fn reject_bad_probability() {
        let data = "Peptide\tCharge\tProbability\nAAAK\t2\t1.5\n";
        let err = parse(data.as_bytes(), Path::new("psm.tsv")).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn reject_bad_intensity() {
        let data = "Peptide\tCharge\tProbability\tIntensity\nAAAK\t2\t0.9\tnot-a-number\n";
        assert!(parse(data.as_bytes(), Path::new("psm.tsv")).is_err());

        let data = "Peptide\tCharge\tProbability\tIntensity\nAAAK\t2\t0.9\t-5\n";
        let err = parse(data.as_bytes(), Path::new("psm.tsv")).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn reject_missing_column() {
        let data = "Peptide\tProbability\nAAAK\t1.0\n";
        assert!(parse(data.as_bytes(), Path::new("psm.tsv")).is_err());
    }
}
