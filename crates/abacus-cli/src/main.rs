use clap::{value_parser, Arg, Command, ValueHint};
use abacus_cli::input::Input;
use abacus_cli::runner::Runner;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ABACUS_LOG", "error,abacus=info"))
        .init();

    let matches = Command::new("abacus")
        .version(clap::crate_version!())
        .about("Combine protein identifications from many experiments into a single quantitative report")
        .arg(
            Arg::new("experiments")
                .num_args(1..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Experiment directories, each holding a `psm.tsv`, a FASTA database and \
                     `*.pep.xml` files. Overrides experiments listed in the parameter file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("parameters")
                .short('p')
                .long("parameters")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("decoy_tag")
                .long("tag")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Prefix of decoy protein names, e.g. `rev_`")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("peptide_probability")
                .long("peptide-probability")
                .value_parser(value_parser!(f64))
                .help("Minimum peptide probability (default = 0)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("protein_probability")
                .long("protein-probability")
                .value_parser(value_parser!(f64))
                .help("Minimum protein probability (default = 0)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("protein_fdr")
                .long("protein-fdr")
                .value_parser(value_parser!(f64))
                .help("Maximum protein-level FDR, applied when a decoy tag is set (default = 0.01)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("razor")
                .long("razor")
                .action(clap::ArgAction::SetTrue)
                .help("Assign each shared peptide ion to a single razor protein group"),
        )
        .arg(
            Arg::new("combined")
                .long("combined")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Pre-built combined protXML file. If absent, one is created by \
                     running the grouping program over every experiment's `*.pep.xml` files.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_directory")
                .short('o')
                .long("output_directory")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path where the combined report will be written. \
                     Overrides the directory specified in the configuration file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("grouping_program")
                .long("grouping-program")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Protein grouping program (default = ProteinProphet)")
                .value_hint(ValueHint::CommandName),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let input = Input::from_arguments(matches)?;

    let runner = input.build().and_then(Runner::new)?;
    runner.run()?;

    Ok(())
}
