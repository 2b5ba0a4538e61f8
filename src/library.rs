//! Oligo assembly and library-level validation.
//!
//! Layout, 5'→3':
//!
//! ```text
//! fwd primer | barcode | left flank | TARGET | right flank | [filler] | revcomp(rev primer)
//! ```
//!
//! Each [`Oligo`] remembers the span of its target slot, so validation can
//! tell a cut site or forbidden motif that belongs to the designed substrate
//! from one created by the constant parts or their junctions.
use std::collections::hash_map::{Entry, HashMap};

use serde::Serialize;

use crate::barcode::Assignment;
use crate::dna;
use crate::error::{DesignError, Result};
use crate::interference::MotifScreen;
use crate::target::PamSide;
use crate::variant::VariantKind;

/// Constant parts, already validated.
#[derive(Clone, Debug)]
pub struct Layout {
    pub forward_primer: Vec<u8>,
    pub reverse_primer: Vec<u8>,
    pub left_flank: Vec<u8>,
    pub right_flank: Vec<u8>,
    pub filler: Vec<u8>,
    pub pad_to: Option<usize>,
}

impl Layout {
    pub fn new(
        forward_primer: &[u8],
        reverse_primer: &[u8],
        left_flank: &[u8],
        right_flank: &[u8],
        filler: &[u8],
        pad_to: Option<usize>,
    ) -> Result<Self> {
        let filler = dna::validate_optional("filler", filler)?;
        if pad_to.is_some() && filler.is_empty() {
            return Err(DesignError::InvalidParams("padding requested without a filler sequence".into()));
        }
        Ok(Layout {
            forward_primer: dna::validate("forward primer", forward_primer)?,
            reverse_primer: dna::validate("reverse primer", reverse_primer)?,
            left_flank: dna::validate_optional("left flank", left_flank)?,
            right_flank: dna::validate_optional("right flank", right_flank)?,
            filler,
            pad_to,
        })
    }
}

/// One finished library member.
#[derive(Clone, Debug, PartialEq)]
pub struct Oligo {
    pub name: String,
    pub kind: VariantKind,
    pub barcode: Vec<u8>,
    pub target: Vec<u8>,
    pub sequence: Vec<u8>,
    /// Half-open span of the target slot within `sequence`.
    pub target_start: usize,
    pub target_end: usize,
}

impl Oligo {
    pub fn len(&self) -> usize { self.sequence.len() }

    pub fn is_empty(&self) -> bool { self.sequence.is_empty() }
}

fn filler_of(filler: &[u8], n: usize) -> impl Iterator<Item = u8> + '_ {
    filler.iter().copied().cycle().take(n)
}

/// Build a single oligo.
pub fn assemble_one(name: String, kind: VariantKind, barcode: &[u8], target: &[u8], layout: &Layout) -> Result<Oligo> {
    let rev_site = dna::revcomp(&layout.reverse_primer);
    let mut seq = Vec::with_capacity(layout.pad_to.unwrap_or(0).max(
        layout.forward_primer.len() + barcode.len() + layout.left_flank.len() + target.len()
            + layout.right_flank.len() + rev_site.len(),
    ));
    seq.extend_from_slice(&layout.forward_primer);
    seq.extend_from_slice(barcode);
    seq.extend_from_slice(&layout.left_flank);
    let target_start = seq.len();
    seq.extend_from_slice(target);
    let target_end = seq.len();
    seq.extend_from_slice(&layout.right_flank);

    if let Some(max) = layout.pad_to {
        let len = seq.len() + rev_site.len();
        if len > max {
            return Err(DesignError::OligoTooLong { name, len, max });
        }
        seq.extend(filler_of(&layout.filler, max - len));
    }
    seq.extend_from_slice(&rev_site);

    Ok(Oligo { name, kind, barcode: barcode.to_vec(), target: target.to_vec(), sequence: seq, target_start, target_end })
}

/// Assemble every barcoded variant.
///
/// Names get a `_bc<k>` suffix when variants carry more than one barcode.
pub fn assemble(assignments: &[Assignment<'_>], side: PamSide, layout: &Layout) -> Result<Vec<Oligo>> {
    let mut out = Vec::with_capacity(assignments.iter().map(|a| a.barcodes.len()).sum());
    for a in assignments {
        let target = a.variant.sequence(side);
        let replicated = a.barcodes.len() > 1;
        for (k, bc) in a.barcodes.iter().enumerate() {
            let name = if replicated { format!("{}_bc{}", a.variant.name, k + 1) } else { a.variant.name.clone() };
            out.push(assemble_one(name, a.variant.kind, bc, &target, layout)?);
        }
    }
    log::info!("assembled {} oligos", out.len());
    Ok(out)
}

/// A single validation finding.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Violation {
    /// The cut-site region occurs outside the target slot.
    StrayCutSite { oligo: String, start: usize, reverse: bool },
    /// A forbidden motif occurs outside the target slot.
    ForbiddenMotif { oligo: String, motif: String, start: usize, reverse: bool },
    /// Two oligos share the same full sequence.
    DuplicateSequence { first: String, second: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::StrayCutSite { oligo, start, reverse } => {
                write!(f, "{oligo}: cut-site region at {start}{}", if *reverse { " (reverse strand)" } else { "" })
            }
            Violation::ForbiddenMotif { oligo, motif, start, reverse } => {
                write!(f, "{oligo}: forbidden motif {motif} at {start}{}", if *reverse { " (reverse strand)" } else { "" })
            }
            Violation::DuplicateSequence { first, second } => write!(f, "{second} duplicates {first}"),
        }
    }
}

/// Everything [`validate`] found.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool { self.violations.is_empty() }
}

/// Check the assembled library.
///
/// Hits fully inside an oligo's target slot are part of the designed
/// substrate and are not reported.
pub fn validate(oligos: &[Oligo], cut_site: &MotifScreen, forbidden: &MotifScreen) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashMap<&[u8], &str> = HashMap::with_capacity(oligos.len());

    for o in oligos {
        let inside = |start: usize, end: usize| start >= o.target_start && end <= o.target_end;
        for hit in cut_site.occurrences(&o.sequence) {
            if !inside(hit.start, hit.end) {
                report.violations.push(Violation::StrayCutSite { oligo: o.name.clone(), start: hit.start, reverse: hit.reverse });
            }
        }
        for hit in forbidden.occurrences(&o.sequence) {
            if !inside(hit.start, hit.end) {
                report.violations.push(Violation::ForbiddenMotif {
                    oligo: o.name.clone(), motif: hit.motif, start: hit.start, reverse: hit.reverse,
                });
            }
        }
        match seen.entry(o.sequence.as_slice()) {
            Entry::Occupied(first) => report.violations.push(Violation::DuplicateSequence {
                first: first.get().to_string(), second: o.name.clone(),
            }),
            Entry::Vacant(slot) => { slot.insert(o.name.as_str()); }
        }
    }
    report
}

#[cfg(test)]
mod library_tests {
    use super::*;
    use crate::barcode::assign;
    use crate::target::Target;
    use crate::variant::{generate, VariantParams};

    fn layout(pad_to: Option<usize>) -> Layout {
        Layout::new(b"GTTCAG", b"TGGAAT", b"ACT", b"TAC", b"ACAGT", pad_to).unwrap()
    }

    #[test]
    fn layout_order_and_target_span() {
        let o = assemble_one("WT".into(), VariantKind::WildType, b"CCAA", b"GACGTGG", &layout(None)).unwrap();
        assert_eq!(dna::as_str(&o.sequence), "GTTCAGCCAAACTGACGTGGTACATTCCA");
        assert_eq!(&o.sequence[o.target_start..o.target_end], b"GACGTGG");
        assert_eq!(o.target_start, 13);
    }

    #[test]
    fn padding_reaches_exact_length() {
        let o = assemble_one("x".into(), VariantKind::Mismatch, b"CCAA", b"GACG", &layout(Some(40))).unwrap();
        assert_eq!(o.len(), 40);
        assert!(o.sequence.ends_with(&dna::revcomp(b"TGGAAT")));
        // 6+4+3+4+3 = 20 before the filler, 6 after it: 14 filler bases
        assert_eq!(&o.sequence[20..34], b"ACAGTACAGTACAG");
    }

    #[test]
    fn too_long_is_an_error() {
        let err = assemble_one("big".into(), VariantKind::Insertion, b"CCAA", b"GACGTGG", &layout(Some(20))).unwrap_err();
        assert!(matches!(err, DesignError::OligoTooLong { len: 29, max: 20, .. }));
    }

    #[test]
    fn replicate_barcodes_get_suffixes() {
        let t = Target::new("t", b"ACG", b"TGG", PamSide::ThreePrime).unwrap();
        let set = generate(&t, &VariantParams::mismatches_only());
        let bcs: Vec<Vec<u8>> = dna::words(4).take(set.len() * 2).collect();
        let a = assign(&set.variants, &bcs, 2).unwrap();
        let oligos = assemble(&a, set.side, &layout(None)).unwrap();
        assert_eq!(oligos.len(), set.len() * 2);
        assert_eq!(oligos[0].name, "WT_bc1");
        assert_eq!(oligos[1].name, "WT_bc2");
    }

    #[test]
    fn validation_ignores_hits_inside_the_target() {
        let region = MotifScreen::new(&["GACGTG"]).unwrap();
        let forbidden = MotifScreen::new(&["GGTCTC"]).unwrap();
        let good = assemble_one("in".into(), VariantKind::WildType, b"CCAA", b"GACGTGG", &layout(None)).unwrap();
        // Barcode carries the region and a BsaI site on the reverse strand.
        let bad = assemble_one("out".into(), VariantKind::Mismatch, b"GACGTGGAGACC", b"AAAA", &layout(None)).unwrap();
        let report = validate(&[good.clone(), bad, good], &region, &forbidden);
        let kinds: Vec<&Violation> = report.violations.iter().collect();
        assert!(kinds.iter().any(|v| matches!(v, Violation::StrayCutSite { oligo, .. } if oligo == "out")));
        assert!(kinds.iter().any(|v| matches!(v, Violation::ForbiddenMotif { reverse: true, .. })));
        assert!(kinds.iter().any(|v| matches!(v, Violation::DuplicateSequence { .. })));
        assert!(!kinds.iter().any(|v| matches!(v, Violation::StrayCutSite { oligo, .. } if oligo == "in")));
    }
}
