//! Reader for the subset of protXML needed to aggregate evidence
//!
//! A combined protXML file describes protein groups, the proteins in each
//! group and the peptide ions supporting each protein. Everything not needed
//! downstream (coverage, annotations, analysis summaries, ...) is skipped.

use crate::decoy::DecoyTag;
use crate::ion::PeptideIon;
use crate::Error;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeptideIonEvidence {
    /// Plain amino acid sequence
    pub sequence: String,
    /// Modified peptide string, empty if unmodified
    pub modified_peptide: String,
    pub charge: u8,
    pub probability: f64,
    /// The ion maps to this protein group only
    pub is_unique: bool,
    /// This group was chosen as the ion's razor group
    pub razor: bool,
}

impl PeptideIonEvidence {
    pub fn ion(&self) -> PeptideIon {
        PeptideIon::new(&self.sequence, Some(&self.modified_peptide), self.charge)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProteinGroupRecord {
    pub protein_name: String,
    /// Other proteins supported by exactly the same evidence
    pub indistinguishable: Vec<String>,
    /// Sequence length, if reported
    pub length: Option<usize>,
    pub group_number: u32,
    pub sibling_id: String,
    pub probability: f64,
    pub top_peptide_probability: f64,
    pub peptides: Vec<PeptideIonEvidence>,
}

impl ProteinGroupRecord {
    pub fn is_decoy(&self, tag: &DecoyTag) -> bool {
        tag.is_decoy(&self.protein_name)
    }

    /// Distinct peptide ions supporting this record
    pub fn ions(&self) -> BTreeSet<PeptideIon> {
        self.peptides.iter().map(PeptideIonEvidence::ion).collect()
    }

    /// Sort key giving the order records appear in the grouping file
    pub fn key(&self) -> (u32, &str) {
        (self.group_number, &self.sibling_id)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProtXmlError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("invalid value `{value}` for attribute `{attribute}`")]
    InvalidValue {
        attribute: &'static str,
        value: String,
    },
    #[error("<{0}> found outside of its parent element")]
    Misplaced(&'static str),
    #[error("no protein groups found")]
    Empty,
}

fn attribute(ev: &BytesStart, key: &'static str) -> Result<Option<String>, ProtXmlError> {
    match ev.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required(
    ev: &BytesStart,
    element: &'static str,
    key: &'static str,
) -> Result<String, ProtXmlError> {
    attribute(ev, key)?.ok_or(ProtXmlError::MissingAttribute {
        element,
        attribute: key,
    })
}

fn number<T: FromStr>(value: String, key: &'static str) -> Result<T, ProtXmlError> {
    value
        .trim()
        .parse()
        .map_err(|_| ProtXmlError::InvalidValue {
            attribute: key,
            value,
        })
}

/// Streaming protXML parser state
#[derive(Default)]
struct Parser {
    records: Vec<ProteinGroupRecord>,
    group_number: Option<u32>,
    protein: Option<ProteinGroupRecord>,
    peptide: Option<PeptideIonEvidence>,
    /// Inside `<indistinguishable_peptide>`, whose modifications are not ours
    alias: bool,
}

impl Parser {
    fn start(&mut self, ev: &BytesStart) -> Result<(), ProtXmlError> {
        match ev.name().into_inner() {
            b"protein_group" => {
                let n = required(ev, "protein_group", "group_number")?;
                self.group_number = Some(number(n, "group_number")?);
            }
            b"protein" => {
                let group_number = self
                    .group_number
                    .ok_or(ProtXmlError::Misplaced("protein"))?;
                let probability = required(ev, "protein", "probability")?;
                self.protein = Some(ProteinGroupRecord {
                    protein_name: required(ev, "protein", "protein_name")?,
                    group_number,
                    sibling_id: attribute(ev, "group_sibling_id")?.unwrap_or_default(),
                    probability: number(probability, "probability")?,
                    ..Default::default()
                });
            }
            b"parameter" if self.peptide.is_none() => {
                if let Some(protein) = self.protein.as_mut() {
                    if attribute(ev, "name")?.as_deref() == Some("prot_length") {
                        let value = required(ev, "parameter", "value")?;
                        protein.length = Some(number(value, "prot_length")?);
                    }
                }
            }
            b"indistinguishable_protein" => {
                let protein = self
                    .protein
                    .as_mut()
                    .ok_or(ProtXmlError::Misplaced("indistinguishable_protein"))?;
                protein
                    .indistinguishable
                    .push(required(ev, "indistinguishable_protein", "protein_name")?);
            }
            b"peptide" => {
                if self.protein.is_none() {
                    return Err(ProtXmlError::Misplaced("peptide"));
                }
                let charge = required(ev, "peptide", "charge")?;
                let probability = required(ev, "peptide", "initial_probability")?;
                self.peptide = Some(PeptideIonEvidence {
                    sequence: required(ev, "peptide", "peptide_sequence")?,
                    charge: number(charge, "charge")?,
                    probability: number(probability, "initial_probability")?,
                    is_unique: attribute(ev, "is_nondegenerate_evidence")?.as_deref()
                        == Some("Y"),
                    ..Default::default()
                });
            }
            b"indistinguishable_peptide" => self.alias = true,
            b"modification_info" if !self.alias => {
                if let Some(peptide) = self.peptide.as_mut() {
                    if let Some(modified) = attribute(ev, "modified_peptide")? {
                        peptide.modified_peptide = modified;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"protein_group" => self.group_number = None,
            b"protein" => {
                if let Some(mut protein) = self.protein.take() {
                    protein.top_peptide_probability = protein
                        .peptides
                        .iter()
                        .map(|p| p.probability)
                        .fold(0.0, f64::max);
                    self.records.push(protein);
                }
            }
            b"peptide" => {
                if let (Some(peptide), Some(protein)) = (self.peptide.take(), self.protein.as_mut())
                {
                    protein.peptides.push(peptide);
                }
            }
            b"indistinguishable_peptide" => self.alias = false,
            _ => {}
        }
    }
}

/// Parse protein group records from a protXML document, in file order
pub fn parse<B: BufRead>(b: B) -> Result<Vec<ProteinGroupRecord>, ProtXmlError> {
    let mut reader = Reader::from_reader(b);
    let mut buf = Vec::new();
    let mut parser = Parser::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref ev) => parser.start(ev)?,
            Event::Empty(ref ev) => {
                parser.start(ev)?;
                parser.end(ev.name().into_inner());
            }
            Event::End(ref ev) => parser.end(ev.name().into_inner()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if parser.records.is_empty() {
        return Err(ProtXmlError::Empty);
    }
    Ok(parser.records)
}

/// Read a combined protein grouping file. A missing file or a malformed
/// document is fatal for the run
pub fn read_protxml<P: AsRef<Path>>(path: P) -> Result<Vec<ProteinGroupRecord>, Error> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::missing(path, "combined protein grouping file not found"));
    }
    let file = std::fs::File::open(path).map_err(|source| Error::IO {
        path: path.into(),
        source,
    })?;
    parse(std::io::BufReader::new(file)).map_err(|source| Error::ProtXml {
        path: path.into(),
        source,
    })
}
