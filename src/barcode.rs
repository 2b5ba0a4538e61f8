//! Barcode filtering, greedy selection and assignment to variants.
//!
//! Candidates come either from a file or from exhaustive enumeration of all
//! `4^length` words. Selection is greedy in input order: a candidate that
//! passes the sequence filters is accepted when it is at least
//! `min_distance` edits away from every barcode accepted before it.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dna;
use crate::error::{DesignError, Result};
use crate::interference::{CutSiteScreen, MotifScreen};
use crate::variant::Variant;

/// Barcode constraints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeParams {
    pub length: usize,
    /// Independent barcodes per variant (technical replicates).
    pub count_per_variant: usize,
    /// Minimum Levenshtein distance between any two selected barcodes.
    pub min_distance: usize,
    pub gc_min: f64,
    pub gc_max: f64,
    pub max_homopolymer: usize,
}

impl Default for BarcodeParams {
    fn default() -> Self {
        BarcodeParams {
            length: 12,
            count_per_variant: 1,
            min_distance: 3,
            gc_min: 0.4,
            gc_max: 0.6,
            max_homopolymer: 3,
        }
    }
}

/// Filters shared by every barcode candidate.
pub struct BarcodeFilter<'a> {
    pub params: &'a BarcodeParams,
    pub cut_site: Option<&'a CutSiteScreen>,
    pub forbidden: Option<&'a MotifScreen>,
}

impl BarcodeFilter<'_> {
    /// Sequence-level checks only; pairwise distance is handled by [`select`].
    pub fn passes(&self, bc: &[u8]) -> bool {
        let p = self.params;
        if bc.len() != p.length { return false; }
        if !bc.iter().all(|b| dna::BASES.contains(b)) { return false; }
        let gc = dna::gc_fraction(bc);
        if gc < p.gc_min || gc > p.gc_max { return false; }
        if dna::max_homopolymer(bc) > p.max_homopolymer { return false; }
        if let Some(screen) = self.cut_site {
            if let Some(why) = screen.interferes(bc) {
                log::trace!("barcode {} rejected: {}", dna::as_str(bc), why);
                return false;
            }
        }
        if let Some(forbidden) = self.forbidden {
            if forbidden.contains_any(bc) { return false; }
        }
        true
    }
}

fn far_enough(candidate: &[u8], accepted: &[Vec<u8>], min_distance: usize) -> bool {
    if min_distance == 0 { return true; }
    // Edit distance never exceeds Hamming distance; recent picks are the likeliest neighbours.
    if accepted.iter().rev().any(|a| dna::hamming(a, candidate).is_some_and(|h| h < min_distance)) {
        return false;
    }
    !accepted.par_iter().any(|a| dna::edit_distance(a, candidate) < min_distance)
}

/// Greedily pick up to `needed` barcodes from `candidates`, in order.
pub fn select<I>(candidates: I, needed: usize, filter: &BarcodeFilter<'_>) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut accepted: Vec<Vec<u8>> = Vec::with_capacity(needed);
    let mut seen = 0usize;
    for c in candidates {
        if accepted.len() >= needed { break; }
        seen += 1;
        let c = dna::normalize(&c);
        if !filter.passes(&c) { continue; }
        if far_enough(&c, &accepted, filter.params.min_distance) {
            accepted.push(c);
        }
    }
    log::debug!("barcodes: accepted {} of {} candidates examined", accepted.len(), seen);
    accepted
}

/// Enumerate all words of `params.length` and select greedily.
///
/// # Examples
/// ```
/// use nucleaseq_design::barcode::{generate, BarcodeFilter, BarcodeParams};
/// let params = BarcodeParams { length: 6, ..BarcodeParams::default() };
/// let filter = BarcodeFilter { params: &params, cut_site: None, forbidden: None };
/// let bcs = generate(10, &filter);
/// assert_eq!(bcs.len(), 10);
/// ```
pub fn generate(needed: usize, filter: &BarcodeFilter<'_>) -> Vec<Vec<u8>> {
    select(dna::words(filter.params.length), needed, filter)
}

/// A variant with the barcodes it was given.
#[derive(Clone, Debug)]
pub struct Assignment<'a> {
    pub variant: &'a Variant,
    pub barcodes: Vec<Vec<u8>>,
}

/// Hand out barcodes to variants in order, `per_variant` each.
pub fn assign<'a>(variants: &'a [Variant], barcodes: &[Vec<u8>], per_variant: usize) -> Result<Vec<Assignment<'a>>> {
    let per_variant = per_variant.max(1);
    let needed = variants.len() * per_variant;
    if barcodes.len() < needed {
        return Err(DesignError::InsufficientBarcodes { needed, available: barcodes.len() });
    }
    Ok(variants
        .iter()
        .zip(barcodes.chunks(per_variant))
        .map(|(variant, chunk)| Assignment { variant, barcodes: chunk.to_vec() })
        .collect())
}

#[cfg(test)]
mod barcode_tests {
    use super::*;
    use crate::target::PamSide;
    use crate::variant::{generate as generate_variants, VariantParams};
    use crate::target::Target;

    fn loose(length: usize) -> BarcodeParams {
        BarcodeParams { length, min_distance: 0, gc_min: 0.0, gc_max: 1.0, max_homopolymer: length, ..BarcodeParams::default() }
    }

    #[test]
    fn filters_apply_gc_homopolymer_and_length() {
        let params = BarcodeParams { length: 6, ..BarcodeParams::default() };
        let f = BarcodeFilter { params: &params, cut_site: None, forbidden: None };
        assert!(f.passes(b"ACGTCA"));
        assert!(!f.passes(b"AAAAGC"), "homopolymer of 4");
        assert!(!f.passes(b"GCGCGC"), "GC 1.0");
        assert!(!f.passes(b"ACGTC"), "wrong length");
    }

    #[test]
    fn forbidden_and_cut_site_filters() {
        let params = loose(8);
        let forbidden = MotifScreen::new(&["GGTCTC"]).unwrap();
        let screen = CutSiteScreen::new(b"TGAGACGCTG", 6, 0).unwrap();
        let f = BarcodeFilter { params: &params, cut_site: Some(&screen), forbidden: Some(&forbidden) };
        assert!(!f.passes(b"AGGTCTCA"));
        assert!(!f.passes(b"ATGAGACA"));
        assert!(f.passes(b"ACACACAC"));
    }

    #[test]
    fn selection_respects_min_distance() {
        let params = BarcodeParams { min_distance: 3, ..loose(6) };
        let f = BarcodeFilter { params: &params, cut_site: None, forbidden: None };
        let picked = select(dna::words(6), 40, &f);
        assert_eq!(picked.len(), 40);
        for (i, a) in picked.iter().enumerate() {
            for b in &picked[i + 1..] {
                assert!(dna::edit_distance(a, b) >= 3);
            }
        }
        assert_eq!(picked[0], b"AAAAAA".to_vec());
    }

    #[test]
    fn selection_stops_when_candidates_run_out() {
        let params = loose(2);
        let f = BarcodeFilter { params: &params, cut_site: None, forbidden: None };
        assert_eq!(select(dna::words(2), 100, &f).len(), 16);
    }

    #[test]
    fn assign_in_chunks() {
        let t = Target::new("t", b"ACG", b"TGG", PamSide::ThreePrime).unwrap();
        let set = generate_variants(&t, &VariantParams::mismatches_only());
        let params = loose(4);
        let f = BarcodeFilter { params: &params, cut_site: None, forbidden: None };
        let bcs = generate(set.len() * 2, &f);
        let a = assign(&set.variants, &bcs, 2).unwrap();
        assert_eq!(a.len(), set.len());
        assert_eq!(a[1].barcodes, bcs[2..4].to_vec());

        match assign(&set.variants, &bcs[..3], 1) {
            Err(DesignError::InsufficientBarcodes { needed, available }) => {
                assert_eq!((needed, available), (10, 3));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
