//! Protein database loaded from a FASTA file, used to attach identity
//! metadata (accession, entry name, gene names) to protein groups

use crate::Error;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProteinRecord {
    pub id: String,
    pub entry_name: String,
    pub gene_names: String,
    pub description: String,
    /// Full header line, without the leading `>`
    pub original_header: String,
    pub length: usize,
}

impl ProteinRecord {
    /// Split a header into its fields. UniProt style headers
    /// (`db|ACCESSION|ENTRY_NAME description OS=... GN=GENE ...`) are fully
    /// parsed, anything else keeps its first token as the ID.
    fn from_header(header: &str, length: usize) -> Self {
        let mut split = header.splitn(2, char::is_whitespace);
        let token = split.next().unwrap_or_default();
        let rest = split.next().unwrap_or_default().trim();

        let fields = token.split('|').collect::<Vec<_>>();
        let (id, entry_name) = match fields.as_slice() {
            [_, id, entry, ..] => (id.to_string(), entry.to_string()),
            _ => (token.to_string(), String::new()),
        };

        let description = match rest.find(" OS=") {
            Some(ix) => &rest[..ix],
            None => rest,
        };

        let gene_names = rest
            .split_ascii_whitespace()
            .find_map(|field| field.strip_prefix("GN="))
            .unwrap_or_default();

        ProteinRecord {
            id,
            entry_name,
            gene_names: gene_names.into(),
            description: description.into(),
            original_header: header.into(),
            length,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProteinDatabase {
    /// Records in file order
    pub records: Vec<ProteinRecord>,
}

impl ProteinDatabase {
    /// Parse a string into a protein database
    pub fn parse(contents: &str) -> ProteinDatabase {
        let mut records = Vec::new();
        let mut header: Option<&str> = None;
        let mut length = 0;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(id) = line.strip_prefix('>') {
                if let Some(last) = header {
                    records.push(ProteinRecord::from_header(last, length));
                }
                header = Some(id);
                length = 0;
            } else {
                length += line.len();
            }
        }

        if let Some(last) = header {
            records.push(ProteinRecord::from_header(last, length));
        }

        ProteinDatabase { records }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<ProteinDatabase, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::IO {
            path: path.into(),
            source,
        })?;
        let db = Self::parse(&contents);
        if db.is_empty() {
            return Err(Error::parse(path, "no FASTA records found"));
        }
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Best-effort identity join: the first record, in file order, whose
    /// original header contains `protein_name`
    pub fn find_by_header(&self, protein_name: &str) -> Option<&ProteinRecord> {
        if protein_name.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|record| record.original_header.contains(protein_name))
    }
}
