use abacus_core::evidence::CombinedEvidence;
use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;

use crate::Runner;

pub const REPORT_FILE: &str = "combined.tsv";

impl Runner {
    pub fn serialize_evidence(&self, evidence: &CombinedEvidence) -> csv::ByteRecord {
        let mut record = csv::ByteRecord::new();
        record.push_field(evidence.protein_group().as_bytes());
        record.push_field(evidence.protein_id.as_bytes());
        record.push_field(evidence.entry_name.as_bytes());
        record.push_field(evidence.gene_names.as_bytes());
        record.push_field(evidence.protein_name.as_bytes());
        record.push_field(itoa::Buffer::new().format(evidence.length).as_bytes());
        record.push_field(format!("{:.4}", evidence.probability).as_bytes());
        record.push_field(format!("{:.4}", evidence.top_peptide_probability).as_bytes());
        record.push_field(
            itoa::Buffer::new()
                .format(evidence.unique_stripped_peptides)
                .as_bytes(),
        );
        record.push_field(
            itoa::Buffer::new()
                .format(evidence.total_ion_count())
                .as_bytes(),
        );
        record.push_field(
            itoa::Buffer::new()
                .format(evidence.unique_ion_count())
                .as_bytes(),
        );
        record.push_field(
            itoa::Buffer::new()
                .format(evidence.razor_ion_count())
                .as_bytes(),
        );
        for quant in &evidence.quant {
            record.push_field(
                itoa::Buffer::new()
                    .format(quant.total_spectral_count)
                    .as_bytes(),
            );
            record.push_field(
                itoa::Buffer::new()
                    .format(quant.unique_spectral_count)
                    .as_bytes(),
            );
            record.push_field(
                itoa::Buffer::new()
                    .format(quant.razor_spectral_count)
                    .as_bytes(),
            );
            record.push_field(format!("{:.0}", quant.total_intensity).as_bytes());
            record.push_field(format!("{:.0}", quant.unique_intensity).as_bytes());
            record.push_field(format!("{:.0}", quant.razor_intensity).as_bytes());
        }
        record
    }

    /// Write the combined report to the output directory, and, if enabled,
    /// place a copy in the current working directory
    pub fn write_combined(&self, evidence: &[CombinedEvidence]) -> anyhow::Result<Vec<String>> {
        let path = self.make_path(REPORT_FILE);

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(vec![]);

        let mut headers = csv::ByteRecord::from(vec![
            "Protein Group",
            "Protein ID",
            "Entry Name",
            "Gene Names",
            "Description",
            "Protein Length",
            "Protein Probability",
            "Top Peptide Probability",
            "Unique Stripped Peptides",
            "Total Peptide Ions",
            "Unique Peptide Ions",
            "Razor Peptide Ions",
        ]);
        for experiment in &self.experiments {
            for column in [
                "Total Spectral Count",
                "Unique Spectral Count",
                "Razor Spectral Count",
                "Total Intensity",
                "Unique Intensity",
                "Razor Intensity",
            ] {
                headers.push_field(format!("{} {}", experiment.name, column).as_bytes());
            }
        }
        wtr.write_byte_record(&headers)?;

        let records = evidence
            .into_par_iter()
            .map(|e| self.serialize_evidence(e))
            .collect::<Vec<_>>();
        for record in records {
            wtr.write_byte_record(&record)?;
        }

        wtr.flush()?;
        let bytes = wtr.into_inner()?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write report to `{}`", path.display()))?;
        let mut written = vec![path.display().to_string()];

        if self.parameters.copy_to_working_directory {
            let cwd = std::env::current_dir()?.join(REPORT_FILE);
            if !same_file(&path, &cwd) {
                std::fs::write(&cwd, &bytes)
                    .with_context(|| format!("Failed to write report to `{}`", cwd.display()))?;
                written.push(cwd.display().to_string());
            }
        }
        Ok(written)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
