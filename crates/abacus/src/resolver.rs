//! Decoy-aware filtering and razor assignment of combined protein groups
//!
//! Steps run in a fixed order: decoy promotion, razor assignment, probability
//! filtering, protein-level FDR. The output is sorted by group number and
//! sibling ID, independent of the input order.

use crate::decoy::DecoyTag;
use crate::ion::PeptideIon;
use crate::protxml::ProteinGroupRecord;
use crate::Settings;
use fnv::FnvHashMap;
use log::info;
use std::cmp::Ordering;
use std::time::Instant;

/// Rename decoy records that have a target among their indistinguishable
/// proteins, so the locus is reported once, as a target. The first target
/// alternative becomes the record's name, and the decoy name takes its place
/// in the indistinguishable list.
///
/// Returns the number of promoted records
pub fn promote_decoys(records: &mut [ProteinGroupRecord], tag: &DecoyTag) -> usize {
    let mut promoted = 0;
    for record in records.iter_mut() {
        if !record.is_decoy(tag) || tag.is_decoy_set(&record.indistinguishable) {
            continue;
        }
        if let Some(ix) = record
            .indistinguishable
            .iter()
            .position(|name| !tag.is_decoy(name))
        {
            std::mem::swap(&mut record.protein_name, &mut record.indistinguishable[ix]);
            promoted += 1;
        }
    }
    promoted
}

/// Give every peptide ion shared by more than one record to exactly one of
/// them. Candidates are ranked by:
///
/// 1. highest protein probability
/// 2. most distinct peptide ions in the record
/// 3. lexicographically smallest protein name
/// 4. smallest (group number, sibling ID)
///
/// Ions found in a single record are never marked razor. Returns the number
/// of shared ions that were assigned
pub fn assign_razor(records: &mut [ProteinGroupRecord]) -> usize {
    let mut owners: FnvHashMap<PeptideIon, Vec<usize>> = FnvHashMap::default();
    let mut sizes = Vec::with_capacity(records.len());
    for (ix, record) in records.iter().enumerate() {
        let ions = record.ions();
        sizes.push(ions.len());
        for ion in ions {
            owners.entry(ion).or_default().push(ix);
        }
    }

    let rank = |a: usize, b: usize| -> Ordering {
        let (x, y) = (&records[a], &records[b]);
        y.probability
            .total_cmp(&x.probability)
            .then_with(|| sizes[b].cmp(&sizes[a]))
            .then_with(|| x.protein_name.cmp(&y.protein_name))
            .then_with(|| x.key().cmp(&y.key()))
    };

    let razor = owners
        .into_iter()
        .filter(|(_, candidates)| candidates.len() > 1)
        .filter_map(|(ion, candidates)| {
            candidates
                .into_iter()
                .min_by(|&a, &b| rank(a, b))
                .map(|winner| (ion, winner))
        })
        .collect::<FnvHashMap<_, _>>();

    for (ix, record) in records.iter_mut().enumerate() {
        for peptide in record.peptides.iter_mut() {
            peptide.razor = razor.get(&peptide.ion()) == Some(&ix);
        }
    }
    razor.len()
}

/// Drop records below the minimum protein probability, then drop peptide
/// ions below the minimum peptide probability from the rest. Records left
/// without any peptide ion are dropped as well.
pub fn filter(records: Vec<ProteinGroupRecord>, settings: &Settings) -> Vec<ProteinGroupRecord> {
    records
        .into_iter()
        .filter(|record| record.probability >= settings.min_protein_probability)
        .filter_map(|mut record| {
            record
                .peptides
                .retain(|p| p.probability >= settings.min_peptide_probability);
            match record.peptides.is_empty() {
                true => None,
                false => Some(record),
            }
        })
        .collect()
}

/// Keep the records at or above the lowest protein probability at which the
/// ratio of decoys to targets is at most `max_fdr`. If no such probability
/// exists, nothing is kept.
pub fn protein_fdr(
    records: Vec<ProteinGroupRecord>,
    tag: &DecoyTag,
    max_fdr: f64,
) -> Vec<ProteinGroupRecord> {
    let mut scored = records
        .iter()
        .map(|r| (r.probability, r.is_decoy(tag)))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut decoys = 0usize;
    let mut targets = 0usize;
    let mut threshold = None;
    for (ix, &(probability, decoy)) in scored.iter().enumerate() {
        match decoy {
            true => decoys += 1,
            false => targets += 1,
        }
        // Evaluate once every record at this probability has been counted
        if matches!(scored.get(ix + 1), Some(next) if next.0 == probability) {
            continue;
        }
        // no targets yet: infinite FDR
        let fdr = decoys as f64 / targets as f64;
        if fdr <= max_fdr {
            threshold = Some(probability);
        }
    }

    match threshold {
        Some(threshold) => records
            .into_iter()
            .filter(|r| r.probability >= threshold)
            .collect(),
        None => Vec::new(),
    }
}

/// Run every resolution step over the combined protein grouping, in order:
/// decoy promotion, razor assignment, probability filters, protein FDR.
///
/// Razor ownership is decided over the unfiltered grouping. If the winning
/// record loses its evidence for an ion to the peptide probability filter,
/// or is dropped entirely, that ion has no razor owner among the survivors.
pub fn resolve(mut records: Vec<ProteinGroupRecord>, settings: &Settings) -> Vec<ProteinGroupRecord> {
    let start = Instant::now();
    let input = records.len();
    let tag = &settings.decoy_tag;

    let promoted = promote_decoys(&mut records, tag);
    let razor = match settings.razor {
        true => assign_razor(&mut records),
        false => 0,
    };

    let mut records = filter(records, settings);
    let passing = records.len();
    if tag.is_enabled() {
        records = protein_fdr(records, tag, settings.protein_fdr);
    }
    records.sort_by(|a, b| a.key().cmp(&b.key()));

    let decoys = records.iter().filter(|r| r.is_decoy(tag)).count();
    info!(
        "resolved {} of {} protein group records ({} passed probability filters, {} decoys remaining, {} promoted, {} razor ions) in {}ms",
        records.len(),
        input,
        passing,
        decoys,
        promoted,
        razor,
        start.elapsed().as_millis()
    );
    records
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::protxml::PeptideIonEvidence;
    use quickcheck_macros::quickcheck;
    use std::collections::BTreeSet;

    fn record(
        name: &str,
        group_number: u32,
        sibling_id: &str,
        probability: f64,
        peptides: &[(&str, f64)],
    ) -> ProteinGroupRecord {
        ProteinGroupRecord {
            protein_name: name.into(),
            group_number,
            sibling_id: sibling_id.into(),
            probability,
            peptides: peptides
                .iter()
                .map(|&(sequence, probability)| PeptideIonEvidence {
                    sequence: sequence.into(),
                    charge: 2,
                    probability,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn razor_owners(records: &[ProteinGroupRecord], sequence: &str) -> Vec<String> {
        records
            .iter()
            .filter(|r| r.peptides.iter().any(|p| p.sequence == sequence && p.razor))
            .map(|r| r.protein_name.clone())
            .collect()
    }

    #[test]
    fn promote_decoy_with_target_alternative() {
        let tag = DecoyTag::from("rev_");
        let mut records = vec![
            record("rev_A", 1, "a", 0.9, &[("AAAK", 0.9)]),
            record("rev_B", 2, "a", 0.9, &[("BBBK", 0.9)]),
            record("rev_C", 3, "a", 0.9, &[("CCCK", 0.9)]),
        ];
        records[0].indistinguishable = vec!["rev_X".into(), "X".into(), "Y".into()];
        records[1].indistinguishable = vec!["rev_Y".into()];

        assert_eq!(promote_decoys(&mut records, &tag), 1);
        assert_eq!(records[0].protein_name, "X");
        assert_eq!(records[0].indistinguishable, vec!["rev_X", "rev_A", "Y"]);
        assert!(!records[0].is_decoy(&tag));
        // only decoy alternatives, or none at all
        assert!(records[1].is_decoy(&tag));
        assert!(records[2].is_decoy(&tag));
    }

    #[test]
    fn razor_prefers_probability() {
        let mut records = vec![
            record("A", 1, "a", 0.8, &[("SHARED", 0.9), ("AAAK", 0.9)]),
            record("B", 2, "a", 0.95, &[("SHARED", 0.9)]),
            record("C", 3, "a", 0.5, &[("SHARED", 0.9), ("CCCK", 0.9)]),
        ];
        assert_eq!(assign_razor(&mut records), 1);
        assert_eq!(razor_owners(&records, "SHARED"), vec!["B"]);
        // unique ions are never razor
        assert!(razor_owners(&records, "AAAK").is_empty());
        assert!(razor_owners(&records, "CCCK").is_empty());
    }

    #[test]
    fn razor_tie_breaks() {
        // same probability: more ions wins
        let mut records = vec![
            record("A", 1, "a", 0.9, &[("SHARED", 0.9)]),
            record("B", 2, "a", 0.9, &[("SHARED", 0.9), ("BBBK", 0.9)]),
        ];
        assign_razor(&mut records);
        assert_eq!(razor_owners(&records, "SHARED"), vec!["B"]);

        // same probability and size: smallest name wins
        let mut records = vec![
            record("Z", 1, "a", 0.9, &[("SHARED", 0.9)]),
            record("M", 2, "a", 0.9, &[("SHARED", 0.9)]),
        ];
        assign_razor(&mut records);
        assert_eq!(razor_owners(&records, "SHARED"), vec!["M"]);

        // identical names: smallest group/sibling wins
        let mut records = vec![
            record("M", 2, "b", 0.9, &[("SHARED", 0.9)]),
            record("M", 2, "a", 0.9, &[("SHARED", 0.9)]),
        ];
        assign_razor(&mut records);
        assert!(!records[0].peptides[0].razor);
        assert!(records[1].peptides[0].razor);
    }

    #[test]
    fn probability_filters() {
        let settings = Settings {
            min_protein_probability: 0.5,
            min_peptide_probability: 0.9,
            ..Default::default()
        };
        let records = vec![
            record("A", 1, "a", 0.4, &[("AAAK", 0.99)]),
            record("B", 2, "a", 0.6, &[("BBBK", 0.95), ("BBBR", 0.5)]),
            record("C", 3, "a", 0.99, &[("CCCK", 0.2)]),
        ];
        let records = filter(records, &settings);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].protein_name, "B");
        assert_eq!(records[0].ions().len(), 1);
    }

    #[test]
    fn fdr_threshold() {
        let tag = DecoyTag::from("rev_");
        let records = vec![
            record("A", 1, "a", 0.99, &[]),
            record("B", 2, "a", 0.98, &[]),
            record("rev_C", 3, "a", 0.97, &[]),
            record("D", 4, "a", 0.96, &[]),
            record("rev_E", 5, "a", 0.95, &[]),
        ];

        let kept = protein_fdr(records.clone(), &tag, 0.01);
        assert_eq!(kept.len(), 2);

        // 1 decoy / 3 targets at 0.96, 2 / 3 at 0.95
        let kept = protein_fdr(records.clone(), &tag, 0.4);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().any(|r| r.is_decoy(&tag)));

        let kept = protein_fdr(records, &tag, 1.0);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn fdr_ties_and_decoys_only() {
        let tag = DecoyTag::from("rev_");
        let records = vec![
            record("A", 1, "a", 0.9, &[]),
            record("rev_B", 2, "a", 0.9, &[]),
        ];
        assert!(protein_fdr(records.clone(), &tag, 0.5).is_empty());
        assert_eq!(protein_fdr(records, &tag, 1.0).len(), 2);

        let records = vec![record("rev_A", 1, "a", 0.9, &[])];
        assert!(protein_fdr(records, &tag, 1.0).is_empty());
    }

    #[test]
    fn resolve_sorts_and_filters() {
        let settings = Settings {
            decoy_tag: DecoyTag::from("rev_"),
            protein_fdr: 0.2,
            razor: true,
            ..Default::default()
        };
        let records = vec![
            record("B", 2, "a", 0.9, &[("SHARED", 0.9)]),
            record("rev_D", 3, "a", 0.1, &[("DDDK", 0.9)]),
            record("C", 1, "b", 0.99, &[("SHARED", 0.9), ("CCCK", 0.9)]),
            record("A", 1, "a", 0.99, &[("AAAK", 0.9)]),
        ];
        let resolved = resolve(records, &settings);
        let keys = resolved.iter().map(|r| r.key()).collect::<Vec<_>>();
        assert_eq!(keys, vec![(1, "a"), (1, "b"), (2, "a")]);
        assert_eq!(razor_owners(&resolved, "SHARED"), vec!["C"]);
    }

    #[test]
    fn razor_owner_lost_to_peptide_filter() {
        let settings = Settings {
            min_peptide_probability: 0.5,
            razor: true,
            ..Default::default()
        };
        let records = vec![
            record("A", 1, "a", 0.99, &[("SHARED", 0.2), ("AAAK", 0.9)]),
            record("B", 2, "a", 0.9, &[("SHARED", 0.9)]),
            record("C", 3, "a", 0.8, &[("SHARED", 0.9)]),
        ];
        let resolved = resolve(records, &settings);
        assert_eq!(resolved.len(), 3);
        assert!(!resolved[0].peptides.iter().any(|p| p.sequence == "SHARED"));
        // B and C still share the ion, but A won it before filtering
        assert!(razor_owners(&resolved, "SHARED").is_empty());
    }

    #[test]
    fn no_razor_unless_requested() {
        let records = vec![
            record("A", 1, "a", 0.9, &[("SHARED", 0.9)]),
            record("B", 2, "a", 0.8, &[("SHARED", 0.9)]),
        ];
        let resolved = resolve(records, &Settings::default());
        assert!(razor_owners(&resolved, "SHARED").is_empty());
    }

    #[quickcheck]
    fn razor_is_exclusive(groups: Vec<(u8, Vec<u8>)>) -> bool {
        let mut records = groups
            .iter()
            .enumerate()
            .map(|(ix, (probability, ions))| {
                let peptides = ions
                    .iter()
                    .map(|ion| (format!("PEP{}K", ion % 6), 1.0))
                    .collect::<Vec<_>>();
                let peptides = peptides
                    .iter()
                    .map(|(s, p)| (s.as_str(), *p))
                    .collect::<Vec<_>>();
                record(
                    &format!("P{}", ix % 3),
                    ix as u32,
                    "a",
                    (probability % 4) as f64 / 4.0,
                    &peptides,
                )
            })
            .collect::<Vec<_>>();
        assign_razor(&mut records);

        let sequences = records
            .iter()
            .flat_map(|r| r.peptides.iter().map(|p| p.sequence.clone()))
            .collect::<BTreeSet<_>>();
        sequences.iter().all(|sequence| {
            let holders = records
                .iter()
                .filter(|r| r.peptides.iter().any(|p| &p.sequence == sequence))
                .count();
            let owners = records
                .iter()
                .filter(|r| r.peptides.iter().any(|p| &p.sequence == sequence && p.razor))
                .count();
            match holders {
                1 => owners == 0,
                _ => owners == 1,
            }
        })
    }
}
