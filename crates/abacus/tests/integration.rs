use abacus_core::decoy::DecoyTag;
use abacus_core::experiment::{load_all, Experiment};
use abacus_core::index::GlobalPeptideIonIndex;
use abacus_core::ion::PeptideIon;
use abacus_core::protxml::read_protxml;
use abacus_core::resolver::resolve;
use abacus_core::{evidence, Error, Settings};

#[test]
fn load_experiment_directory() -> Result<(), Error> {
    let exp = Experiment::load("../../tests/data/exp1")?;
    assert_eq!(&*exp.name, "exp1");
    assert_eq!(exp.psms.len(), 6);
    assert_eq!(exp.database.len(), 7);
    assert_eq!(exp.exchange_files.len(), 1);
    assert_eq!(exp.decoys(&DecoyTag::from("rev_")), 1);
    Ok(())
}

#[test]
fn combined_pipeline() -> Result<(), Error> {
    let settings = Settings {
        decoy_tag: DecoyTag::from("rev_"),
        razor: true,
        ..Default::default()
    };
    let experiments = load_all(
        &["../../tests/data/exp2", "../../tests/data/exp1"],
        &settings.decoy_tag,
    )?;
    let names = experiments.iter().map(|e| e.name.to_string()).collect::<Vec<_>>();
    assert_eq!(names, vec!["exp1", "exp2"]);

    let index = GlobalPeptideIonIndex::build(&experiments, settings.min_peptide_probability);
    let shared = PeptideIon::new("SHAREDK", None, 2);
    assert_eq!(index.observations(&experiments[0].name, &shared), 2);
    assert_eq!(index.observations(&experiments[1].name, &shared), 1);

    let records = read_protxml("../../tests/data/combined.prot.xml")?;
    assert_eq!(records.len(), 5);
    let resolved = resolve(records, &settings);

    let combined = evidence::build(
        &resolved,
        &index,
        &experiments,
        &experiments[0].database,
        &settings.decoy_tag,
    );
    assert_eq!(combined.len(), 4);
    for e in &combined {
        assert_eq!(e.total_ion_count(), e.unique_ion_count() + e.shared_ion_count());
        assert!(e.razor_ion_count() <= e.total_ion_count());
        assert!(!e.is_decoy);
    }
    let razor = combined
        .iter()
        .filter(|e| e.razor_ions.contains(&shared))
        .map(|e| e.protein_group())
        .collect::<Vec<_>>();
    assert_eq!(razor, vec!["2-a"]);
    Ok(())
}
