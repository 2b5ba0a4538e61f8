#![forbid(unsafe_code)]
//! # nucleaseq-design
//!
//! Oligo library designer for **NucleaSeq** nuclease-specificity experiments.
//! Starting from one target (protospacer + PAM) it enumerates mutational
//! **variants**, gives every variant a **barcode**, searches for **primers**
//! whose editable prefix keeps them clear of the canonical **cut site**, and
//! assembles and validates the final oligos.
//!
//! ## Pipeline
//! `params → target → variants → barcodes → primers → assembly → validation`
//!
//! Each stage lives in its own module and can be used on its own; the whole
//! pipeline is [`design_library`].
//!
//! ## Examples
//! ```rust
//! use nucleaseq_design::{config::DesignParams, variant::VariantParams, design_library, DesignInputs};
//! let mut params = DesignParams::default();
//! params.variants = VariantParams::mismatches_only();
//! params.barcodes.length = 8;
//! let design = design_library(&params, &DesignInputs::default()).unwrap();
//! assert_eq!(design.oligos.len(), 61);
//! assert_eq!(design.oligos[0].name, "WT");
//! ```

pub mod error;
pub mod dna;
pub mod part;
pub mod target;
pub mod variant;
pub mod interference;
pub mod barcode;
pub mod primer;
pub mod library;
pub mod config;
pub mod seqio;
pub mod output;
pub mod data { pub mod primers; }

use std::path::PathBuf;

use rayon::ThreadPoolBuilder;

use barcode::BarcodeFilter;
use config::DesignParams;
use error::{DesignError, Result};
use interference::{CutSiteScreen, MotifScreen};
use library::{Layout, Oligo};
use output::DesignSummary;
use target::Target;

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Files feeding a design run. Everything is optional.
#[derive(Clone, Debug, Default)]
pub struct DesignInputs {
    /// FASTA/FASTQ of reference targets.
    pub reference: Option<PathBuf>,
    /// Record in `reference` to use as the on-target; otherwise the target comes from the parameters.
    pub target_name: Option<String>,
    /// Add the other reference records to the library unchanged.
    pub include_references: bool,
    /// Barcode candidates; otherwise barcodes are generated.
    pub barcodes: Option<PathBuf>,
}

/// Result of a design run.
#[derive(Clone, Debug)]
pub struct Design {
    pub target: Target,
    pub oligos: Vec<Oligo>,
    pub summary: DesignSummary,
}

/// Effective worker count: `0` means every logical core.
pub fn effective_threads(threads: usize) -> usize {
    if threads == 0 { std::cmp::max(1, num_cpus::get()) } else { threads }
}

/// Run the whole pipeline on a dedicated rayon pool of `params.threads` workers.
pub fn design_library(params: &DesignParams, inputs: &DesignInputs) -> Result<Design> {
    params.validate()?;
    let n = effective_threads(params.threads);
    let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
    log::debug!("design: threads={}", n);
    pool.install(|| run_design(params, inputs))
}

/// Resolve the on-target from the reference file or the parameters.
pub fn resolve_target(params: &DesignParams, refs: Option<&[(String, Vec<u8>)]>, target_name: Option<&str>) -> Result<Target> {
    match (refs, target_name) {
        (Some(refs), Some(name)) => {
            let seq = seqio::find_reference(refs, name)?;
            let t = Target::from_reference(name, &seq, params.target.pam.len(), params.target.pam_side)?;
            match params.target.cut_offset {
                Some(c) => t.with_cut_offset(c),
                None => Ok(t),
            }
        }
        (None, Some(name)) => Err(DesignError::UnknownReference(name.to_string())),
        _ => params.target.build(),
    }
}

fn run_design(params: &DesignParams, inputs: &DesignInputs) -> Result<Design> {
    let refs = inputs.reference.as_ref().map(seqio::read_references).transpose()?;
    let target = resolve_target(params, refs.as_deref(), inputs.target_name.as_deref())?;
    log::info!("target: {}", target);

    let mut variants = variant::generate(&target, &params.variants);
    if inputs.include_references {
        for (id, seq) in refs.iter().flatten() {
            if *id != target.name && !variants.push_reference(id, seq) {
                log::warn!("reference {} duplicates an existing variant; skipped", id);
            }
        }
    }

    let region = target.cut_site_region(params.screen.window);
    let cut_screen = CutSiteScreen::new(&region, params.screen.k, params.screen.max_edits)?;
    let forbidden = MotifScreen::new(params.screen.forbidden_motifs.as_slice())?;
    log::info!("cut-site region: {}", dna::as_str(&region));

    let per_variant = params.barcodes.count_per_variant;
    let needed = variants.len() * per_variant;
    let filter = BarcodeFilter { params: &params.barcodes, cut_site: Some(&cut_screen), forbidden: Some(&forbidden) };
    let barcodes = match &inputs.barcodes {
        Some(path) => barcode::select(seqio::read_barcodes(path)?, needed, &filter),
        None => barcode::generate(needed, &filter),
    };
    log::info!("barcodes: {} selected for {} variants", barcodes.len(), variants.len());
    let assignments = barcode::assign(&variants.variants, &barcodes, per_variant)?;

    let primers = primer::search_pair(&params.primers, &cut_screen, Some(&forbidden))?;

    let a = &params.assembly;
    let layout = Layout::new(
        &primers.forward.sequence,
        &primers.reverse.sequence,
        a.left_flank.as_bytes(),
        a.right_flank.as_bytes(),
        a.filler.as_bytes(),
        a.pad_to,
    )?;
    let oligos = library::assemble(&assignments, variants.side, &layout)?;

    let region_screen = MotifScreen::new(&[&region])?;
    let report = library::validate(&oligos, &region_screen, &forbidden);
    for v in &report.violations {
        log::warn!("validation: {}", v);
    }
    if a.strict && !report.is_clean() {
        return Err(DesignError::ValidationFailed(report.violations.len()));
    }

    let summary = DesignSummary {
        target: target.to_string(),
        cut_site_region: region,
        categories: output::category_counts(&variants.counts(), &oligos),
        duplicates_dropped: variants.duplicates_dropped,
        total_oligos: oligos.len(),
        min_length: oligos.iter().map(Oligo::len).min().unwrap_or(0),
        max_length: oligos.iter().map(Oligo::len).max().unwrap_or(0),
        primers,
        validation: report,
    };
    Ok(Design { target, oligos, summary })
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::target::PamSide;
    use crate::variant::{VariantKind, VariantParams};
    use std::collections::HashSet;
    use std::io::Write;

    fn small_params() -> DesignParams {
        let mut p = DesignParams::default();
        p.variants = VariantParams::mismatches_only();
        p.barcodes.length = 8;
        p.threads = 2;
        p
    }

    #[test]
    fn every_oligo_is_unique_and_well_formed() {
        let params = small_params();
        let d = design_library(&params, &DesignInputs::default()).unwrap();
        assert_eq!(d.oligos.len(), 61);
        let seqs: HashSet<&[u8]> = d.oligos.iter().map(|o| o.sequence.as_slice()).collect();
        assert_eq!(seqs.len(), d.oligos.len());
        let barcodes: HashSet<&[u8]> = d.oligos.iter().map(|o| o.barcode.as_slice()).collect();
        assert_eq!(barcodes.len(), d.oligos.len());

        let fwd = &d.summary.primers.forward.sequence;
        let rev_site = dna::revcomp(&d.summary.primers.reverse.sequence);
        for o in &d.oligos {
            assert!(o.sequence.starts_with(fwd));
            assert!(o.sequence.ends_with(&rev_site));
            assert_eq!(&o.sequence[o.target_start..o.target_end], o.target.as_slice());
        }
        assert_eq!(d.summary.categories[0].category, "wild_type");
        assert_eq!(d.summary.validation.violations.len(), 0);
    }

    #[test]
    fn padding_equalises_lengths() {
        let mut params = small_params();
        params.variants.max_deletion = 2;
        params.variants.max_insertion = 1;
        params.assembly.pad_to = Some(120);
        let d = design_library(&params, &DesignInputs::default()).unwrap();
        assert!(d.oligos.iter().all(|o| o.len() == 120));
        assert_eq!((d.summary.min_length, d.summary.max_length), (120, 120));
    }

    #[test]
    fn pad_too_short_fails() {
        let mut params = small_params();
        params.assembly.pad_to = Some(50);
        let err = design_library(&params, &DesignInputs::default()).unwrap_err();
        assert!(matches!(err, DesignError::OligoTooLong { .. }));
    }

    fn flank_motif_params(strict: bool) -> DesignParams {
        let mut params = small_params();
        // Sits inside the default left flank, so every oligo carries it outside the target slot.
        params.screen.forbidden_motifs = vec!["ACTTGC".to_string()];
        params.assembly.strict = strict;
        params
    }

    #[test]
    fn strict_validation_fails_the_design() {
        match design_library(&flank_motif_params(true), &DesignInputs::default()) {
            Err(DesignError::ValidationFailed(n)) => assert!(n >= 61, "{n}"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn lenient_validation_reports_and_keeps_the_library() {
        let d = design_library(&flank_motif_params(false), &DesignInputs::default()).unwrap();
        assert_eq!(d.oligos.len(), 61);
        let v = &d.summary.validation.violations;
        assert!(!v.is_empty());
        assert!(v.iter().all(|x| matches!(x, library::Violation::ForbiddenMotif { motif, .. } if motif == "ACTTGC")));
    }

    #[test]
    fn five_prime_pam_end_to_end() {
        let mut params = small_params();
        params.target.name = "cas12a".to_string();
        params.target.protospacer = "GTCAGCTTACGGATCCTAGCAAT".to_string();
        params.target.pam = "TTTA".to_string();
        params.target.pam_side = PamSide::FivePrime;
        params.variants.pam_variants = true;
        let d = design_library(&params, &DesignInputs::default()).unwrap();
        assert_eq!(d.target.cut_position(), 22);
        assert_eq!(d.summary.cut_site_region, b"TCCTAGCAAT".to_vec());
        // WT + 255 PAMs + 69 mismatches
        assert_eq!(d.oligos.len(), 1 + 255 + 69);
        for o in &d.oligos {
            assert_eq!(o.target.len(), 27);
            if o.kind != VariantKind::Pam {
                assert!(o.target.starts_with(b"TTTA"), "{}", o.name);
            }
        }
        let mm1 = d.oligos.iter().find(|o| o.name == "MM_1A").unwrap();
        assert_eq!(dna::as_str(&mm1.target), "TTTAATCAGCTTACGGATCCTAGCAAT");
    }

    #[test]
    fn target_and_extra_references_from_fasta() {
        let mut f = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        write!(f, ">lambda1\nGACGCATAAAGATGAGACGCTGG\n>off1\nGACGCATAAAGATGAGACGGAGG\n>dup\nGACGCATAAAGATGAGACGCTGG\n").unwrap();
        f.flush().unwrap();
        let inputs = DesignInputs {
            reference: Some(f.path().to_path_buf()),
            target_name: Some("lambda1".to_string()),
            include_references: true,
            barcodes: None,
        };
        let d = design_library(&small_params(), &inputs).unwrap();
        assert_eq!(d.target.name, "lambda1");
        let refs: Vec<&Oligo> = d.oligos.iter().filter(|o| o.kind == VariantKind::Reference).collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "off1");
    }

    #[test]
    fn missing_reference_name() {
        let inputs = DesignInputs { target_name: Some("nope".into()), ..DesignInputs::default() };
        assert!(matches!(design_library(&small_params(), &inputs), Err(DesignError::UnknownReference(_))));
    }

    #[test]
    fn too_few_barcodes_from_file() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(f, "ACGTACGA\nTGCATGCA").unwrap();
        f.flush().unwrap();
        let inputs = DesignInputs { barcodes: Some(f.path().to_path_buf()), ..DesignInputs::default() };
        let err = design_library(&small_params(), &inputs).unwrap_err();
        assert!(matches!(err, DesignError::InsufficientBarcodes { needed: 61, .. }));
    }
}
