use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use nucleaseq_design::barcode::{self, BarcodeFilter};
use nucleaseq_design::config::DesignParams;
use nucleaseq_design::interference::{CutSiteScreen, MotifScreen};
use nucleaseq_design::primer::{self, PrimerConstraints};
use nucleaseq_design::target::PamSide;
use nucleaseq_design::{dna, output, seqio, variant, DesignInputs};

/// NucleaSeq oligo library designer
#[derive(Parser)]
#[command(name = "nucleaseq-design")]
#[command(version)]
#[command(about = "Design NucleaSeq oligo libraries: target variants, barcodes and cut-site-aware primers", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand that needs a target.
#[derive(Args, Clone)]
struct TargetArgs {
    /// JSON parameter file; flags below override it
    #[arg(long, value_name = "PARAMS.JSON")]
    params: Option<PathBuf>,

    /// FASTA/FASTQ with reference targets (protospacer + PAM)
    #[arg(long, value_name = "REF.FA")]
    reference: Option<PathBuf>,

    /// Record in --reference to use as the on-target
    #[arg(long, requires = "reference")]
    target: Option<String>,

    /// Protospacer sequence (overrides the parameter file)
    #[arg(long)]
    protospacer: Option<String>,

    /// PAM sequence (overrides the parameter file)
    #[arg(long)]
    pam: Option<String>,

    /// PAM on the 5' side of the protospacer (Cas12a-like)
    #[arg(long)]
    pam_5prime: bool,

    /// Threads (0 = all)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the library
    Design {
        #[command(flatten)]
        common: TargetArgs,
        /// Barcode candidates (FASTA or one per line / CSV); generated when absent
        #[arg(long, value_name = "FILE")]
        barcodes: Option<PathBuf>,
        /// Add the other --reference records to the library unchanged
        #[arg(long)]
        include_references: bool,
        /// Pad every oligo to this length
        #[arg(long)]
        pad_to: Option<usize>,
        /// Fail when validation reports any violation
        #[arg(long)]
        strict: bool,
        /// Output CSV
        #[arg(short, long, value_name = "OUT.CSV")]
        out: PathBuf,
        /// Also write a FASTA of the oligos
        #[arg(long, value_name = "OUT.FA")]
        fasta: Option<PathBuf>,
        /// Write a JSON summary (counts, primers, violations)
        #[arg(long, value_name = "SUMMARY.JSON")]
        summary_json: Option<PathBuf>,
    },

    /// Print the variant table for the target
    Variants {
        #[command(flatten)]
        common: TargetArgs,
    },

    /// Select or generate barcodes and print them
    Barcodes {
        #[command(flatten)]
        common: TargetArgs,
        /// How many barcodes to produce
        #[arg(long)]
        count: usize,
        /// Candidate file; all words of the configured length when absent
        #[arg(long, value_name = "FILE")]
        candidates: Option<PathBuf>,
    },

    /// Run the primer search and print ranked candidates
    Primers {
        #[command(flatten)]
        common: TargetArgs,
    },

    /// List the built-in primer seeds, flanks, filler and forbidden sites
    Parts,

    /// Print the effective parameters as JSON
    Params {
        #[command(flatten)]
        common: TargetArgs,
    },
}

fn load_params(args: &TargetArgs) -> anyhow::Result<DesignParams> {
    let mut params = match &args.params {
        Some(p) => DesignParams::from_path(p).with_context(|| format!("reading {}", p.display()))?,
        None => DesignParams::default(),
    };
    if let Some(p) = &args.protospacer { params.target.protospacer = p.clone(); }
    if let Some(p) = &args.pam { params.target.pam = p.clone(); }
    if args.pam_5prime { params.target.pam_side = PamSide::FivePrime; }
    if let Some(t) = args.threads { params.threads = t; }
    params.validate()?;
    Ok(params)
}

fn load_target(args: &TargetArgs, params: &DesignParams) -> anyhow::Result<nucleaseq_design::target::Target> {
    let refs = match &args.reference {
        Some(p) => Some(seqio::read_references(p)?),
        None => None,
    };
    Ok(nucleaseq_design::resolve_target(params, refs.as_deref(), args.target.as_deref())?)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Design { common, barcodes, include_references, pad_to, strict, out, fasta, summary_json } => {
            let mut params = load_params(&common)?;
            if pad_to.is_some() { params.assembly.pad_to = pad_to; }
            if strict { params.assembly.strict = true; }
            let inputs = DesignInputs {
                reference: common.reference.clone(),
                target_name: common.target.clone(),
                include_references,
                barcodes,
            };
            let design = nucleaseq_design::design_library(&params, &inputs)?;

            output::write_csv(&out, &design.oligos)?;
            if let Some(p) = fasta { output::write_fasta(p, &design.oligos)?; }
            if let Some(p) = summary_json { output::write_summary_json(p, &design.summary)?; }

            print_table(output::summary_frame(&design.summary)?);
            println!("forward primer: {}", dna::as_str(&design.summary.primers.forward.sequence));
            println!("reverse primer: {}", dna::as_str(&design.summary.primers.reverse.sequence));
            println!(
                "oligos: {} ({}..{} nt), violations: {}",
                design.summary.total_oligos, design.summary.min_length, design.summary.max_length,
                design.summary.validation.violations.len()
            );
        }

        Commands::Variants { common } => {
            let params = load_params(&common)?;
            let target = load_target(&common, &params)?;
            let set = variant::generate(&target, &params.variants);
            for v in &set.variants {
                println!("{}\t{}\t{}", v.name, v.kind.as_str(), dna::as_str(&v.sequence(set.side)));
            }
            eprintln!("{} variants ({} duplicates dropped)", set.len(), set.duplicates_dropped);
        }

        Commands::Barcodes { common, count, candidates } => {
            let params = load_params(&common)?;
            let target = load_target(&common, &params)?;
            let region = target.cut_site_region(params.screen.window);
            let screen = CutSiteScreen::new(&region, params.screen.k, params.screen.max_edits)?;
            let forbidden = MotifScreen::new(params.screen.forbidden_motifs.as_slice())?;
            let filter = BarcodeFilter { params: &params.barcodes, cut_site: Some(&screen), forbidden: Some(&forbidden) };
            let picked = match candidates {
                Some(p) => barcode::select(seqio::read_barcodes(p)?, count, &filter),
                None => barcode::generate(count, &filter),
            };
            for bc in &picked { println!("{}", dna::as_str(bc)); }
            if picked.len() < count {
                bail!("only {} of {} barcodes passed the filters", picked.len(), count);
            }
        }

        Commands::Primers { common } => {
            let params = load_params(&common)?;
            let target = load_target(&common, &params)?;
            let region = target.cut_site_region(params.screen.window);
            let screen = CutSiteScreen::new(&region, params.screen.k, params.screen.max_edits)?;
            let forbidden = MotifScreen::new(params.screen.forbidden_motifs.as_slice())?;
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(nucleaseq_design::effective_threads(params.threads))
                .build()?;
            let pair = pool.install(|| primer::search_pair(&params.primers, &screen, Some(&forbidden)))?;

            println!("cut-site region: {}", dna::as_str(&region));
            let fwd_all = std::iter::once(&pair.forward).chain(pair.forward_alternatives.iter());
            for c in fwd_all {
                println!("forward\t{}\tradius={}\tgc={:.2}", dna::as_str(&c.sequence), c.radius, c.gc);
            }
            let rev_all = std::iter::once(&pair.reverse).chain(pair.reverse_alternatives.iter());
            for c in rev_all {
                println!("reverse\t{}\tradius={}\tgc={:.2}", dna::as_str(&c.sequence), c.radius, c.gc);
            }
            // Show why the seeds themselves needed changes, if they did.
            let c = PrimerConstraints { params: &params.primers, cut_site: &screen, forbidden: Some(&forbidden), avoid: Vec::new() };
            for (which, seed) in [("forward", &params.primers.forward_seed), ("reverse", &params.primers.reverse_seed)] {
                if !c.accepts(seed.as_bytes()) {
                    let why = screen.interferes(seed.as_bytes()).map(|i| i.to_string()).unwrap_or_else(|| "composition/motif".into());
                    eprintln!("{which} seed rejected: {why}");
                }
            }
        }

        Commands::Parts => {
            print_table(output::parts_frame(nucleaseq_design::data::primers::ALL_PARTS)?);
        }

        Commands::Params { common } => {
            let params = load_params(&common)?;
            println!("{}", params.to_json()?);
        }
    }

    Ok(())
}

fn print_table(df: polars::prelude::DataFrame) {
    std::env::set_var("POLARS_FMT_TABLE_FORMATTING", "UTF8_FULL");
    std::env::set_var("POLARS_FMT_MAX_COLS", "100");
    std::env::set_var("POLARS_FMT_MAX_ROWS", "1000");
    std::env::set_var("POLARS_FMT_STR_LEN", "200"); // sequences stay whole
    println!("{}", df);
}
