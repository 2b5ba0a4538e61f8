//! Constrained local search for primers whose **prefix** keeps them clear
//! of the canonical cut-site region.
//!
//! Only the first `prefix_len` bases of a seed primer may change; the rest
//! of the seed (the part that matches the sequencing chemistry) is kept.
//! The search walks Hamming shells around the seed prefix, radius 0 first,
//! checks every candidate of a shell in parallel and stops at the first
//! shell that produces a valid primer.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::primers::{DEFAULT_FORWARD, DEFAULT_REVERSE};
use crate::dna;
use crate::error::{DesignError, Result};
use crate::interference::{CutSiteScreen, MotifScreen};

/// Search settings for the forward and reverse primers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimerParams {
    pub forward_seed: String,
    pub reverse_seed: String,
    /// Number of leading bases the search may change.
    pub prefix_len: usize,
    /// Largest number of prefix substitutions tried.
    pub max_radius: usize,
    /// Minimum edit distance to every primer in the avoid list.
    pub min_distance: usize,
    pub gc_min: f64,
    pub gc_max: f64,
    pub max_homopolymer: usize,
    /// How many ranked candidates to keep per primer.
    pub max_candidates: usize,
}

impl Default for PrimerParams {
    fn default() -> Self {
        PrimerParams {
            forward_seed: DEFAULT_FORWARD.sequence.to_string(),
            reverse_seed: DEFAULT_REVERSE.sequence.to_string(),
            prefix_len: 6,
            max_radius: 3,
            min_distance: 6,
            gc_min: 0.35,
            gc_max: 0.65,
            max_homopolymer: 4,
            max_candidates: 5,
        }
    }
}

/// A primer that passed every constraint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrimerCandidate {
    #[serde(serialize_with = "crate::output::ser_seq")]
    pub sequence: Vec<u8>,
    /// Substitutions relative to the seed prefix.
    pub radius: usize,
    pub gc: f64,
}

impl PrimerCandidate {
    fn new(sequence: Vec<u8>, radius: usize) -> Self {
        let gc = dna::gc_fraction(&sequence);
        PrimerCandidate { sequence, radius, gc }
    }
}

/// The chosen pair, plus the runners-up of each search.
#[derive(Clone, Debug, Serialize)]
pub struct PrimerPair {
    pub forward: PrimerCandidate,
    pub reverse: PrimerCandidate,
    pub forward_alternatives: Vec<PrimerCandidate>,
    pub reverse_alternatives: Vec<PrimerCandidate>,
}

/// Everything a candidate primer is checked against.
pub struct PrimerConstraints<'a> {
    pub params: &'a PrimerParams,
    pub cut_site: &'a CutSiteScreen,
    pub forbidden: Option<&'a MotifScreen>,
    /// Sequences the primer must stay `min_distance` edits away from.
    pub avoid: Vec<Vec<u8>>,
}

impl PrimerConstraints<'_> {
    pub fn accepts(&self, primer: &[u8]) -> bool {
        let p = self.params;
        let gc = dna::gc_fraction(primer);
        if gc < p.gc_min || gc > p.gc_max { return false; }
        if dna::max_homopolymer(primer) > p.max_homopolymer { return false; }
        if self.cut_site.interferes(primer).is_some() { return false; }
        if let Some(f) = self.forbidden {
            if f.contains_any(primer) { return false; }
        }
        self.avoid.iter().all(|a| dna::edit_distance(a, primer) >= p.min_distance)
    }
}

/// All sequences that differ from `seed` in exactly `radius` of its first `prefix_len` bases.
pub fn shell(seed: &[u8], prefix_len: usize, radius: usize) -> Vec<Vec<u8>> {
    let prefix_len = prefix_len.min(seed.len());
    if radius > prefix_len { return Vec::new(); }
    let mut out = Vec::new();
    let mut positions: Vec<usize> = (0..radius).collect();
    loop {
        // Substitutions at the chosen positions, odometer over the 3 alternatives each.
        let alts: Vec<Vec<u8>> = positions.iter().map(|&i| dna::alternatives(seed[i]).collect()).collect();
        let mut digits = vec![0usize; radius];
        loop {
            let mut s = seed.to_vec();
            for (k, &i) in positions.iter().enumerate() {
                s[i] = alts[k][digits[k]];
            }
            out.push(s);
            let mut carry = true;
            for d in digits.iter_mut().rev() {
                *d += 1;
                if *d == 3 { *d = 0; } else { carry = false; break; }
            }
            if carry { break; }
        }
        // Next combination of positions in lexicographic order.
        let mut i = radius;
        loop {
            if i == 0 { return out; }
            i -= 1;
            if positions[i] < prefix_len - radius + i { break; }
        }
        positions[i] += 1;
        for j in i + 1..radius {
            positions[j] = positions[j - 1] + 1;
        }
    }
}

fn rank(cands: &mut [PrimerCandidate]) {
    cands.sort_by(|a, b| {
        let da = (a.gc - 0.5).abs();
        let db = (b.gc - 0.5).abs();
        da.partial_cmp(&db)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
}

/// Search the neighbourhood of `seed` for primers that satisfy `constraints`.
///
/// Returns the ranked candidates of the first non-empty shell.
pub fn search(which: &str, seed: &[u8], constraints: &PrimerConstraints<'_>) -> Result<Vec<PrimerCandidate>> {
    let seed = dna::validate(&format!("{which} primer seed"), seed)?;
    let p = constraints.params;
    for radius in 0..=p.max_radius {
        let shell = shell(&seed, p.prefix_len, radius);
        if shell.is_empty() { break; }
        let mut found: Vec<PrimerCandidate> = shell
            .into_par_iter()
            .filter(|c| constraints.accepts(c))
            .map(|c| PrimerCandidate::new(c, radius))
            .collect();
        log::debug!("primers: {} radius {} -> {} valid", which, radius, found.len());
        if !found.is_empty() {
            rank(&mut found);
            found.truncate(p.max_candidates.max(1));
            return Ok(found);
        }
    }
    Err(DesignError::NoPrimerFound { which: which.to_string(), radius: p.max_radius })
}

/// Forward primer first, then the reverse primer kept away from it.
pub fn search_pair(params: &PrimerParams, cut_site: &CutSiteScreen, forbidden: Option<&MotifScreen>) -> Result<PrimerPair> {
    let fwd_constraints = PrimerConstraints { params, cut_site, forbidden, avoid: Vec::new() };
    let mut fwd = search("forward", params.forward_seed.as_bytes(), &fwd_constraints)?;
    let forward = fwd.remove(0);

    let avoid = vec![forward.sequence.clone(), dna::revcomp(&forward.sequence)];
    let rev_constraints = PrimerConstraints { params, cut_site, forbidden, avoid };
    let mut rev = search("reverse", params.reverse_seed.as_bytes(), &rev_constraints)?;
    let reverse = rev.remove(0);

    log::info!(
        "primers: forward {} (radius {}), reverse {} (radius {})",
        dna::as_str(&forward.sequence), forward.radius, dna::as_str(&reverse.sequence), reverse.radius
    );
    Ok(PrimerPair { forward, reverse, forward_alternatives: fwd, reverse_alternatives: rev })
}

#[cfg(test)]
mod primer_tests {
    use super::*;

    fn screen() -> CutSiteScreen {
        CutSiteScreen::new(b"TGAGACGCTG", 6, 1).unwrap()
    }

    #[test]
    fn shell_sizes_match_binomials() {
        let seed = b"ACGTACGTAC";
        assert_eq!(shell(seed, 6, 0), vec![seed.to_vec()]);
        assert_eq!(shell(seed, 6, 1).len(), 6 * 3);
        assert_eq!(shell(seed, 6, 2).len(), 15 * 9);
        assert_eq!(shell(seed, 6, 3).len(), 20 * 27);
        assert!(shell(seed, 2, 3).is_empty());
        for s in shell(seed, 4, 2) {
            assert_eq!(dna::hamming(&s[..4], &seed[..4]), Some(2));
            assert_eq!(&s[4..], &seed[4..]);
        }
    }

    #[test]
    fn clean_seed_is_returned_at_radius_zero() {
        let params = PrimerParams::default();
        let sc = screen();
        let c = PrimerConstraints { params: &params, cut_site: &sc, forbidden: None, avoid: Vec::new() };
        let found = search("forward", b"GTTCAGAGTTCTACAGTCCGACGATC", &c).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].radius, 0);
    }

    #[test]
    fn interfering_prefix_is_repaired() {
        // Seed starts with a cut-site 6-mer; one substitution in the prefix breaks it.
        let params = PrimerParams { prefix_len: 6, max_radius: 2, ..PrimerParams::default() };
        let sc = screen();
        let c = PrimerConstraints { params: &params, cut_site: &sc, forbidden: None, avoid: Vec::new() };
        let seed = b"GAGACGTTCTACAGTCCGACGATC";
        assert!(sc.interferes(seed).is_some());
        let found = search("forward", seed, &c).unwrap();
        assert!(found.iter().all(|p| p.radius == 1));
        assert!(found.iter().all(|p| sc.interferes(&p.sequence).is_none()));
        assert!(found.len() <= params.max_candidates);
        for w in found.windows(2) {
            assert!((w[0].gc - 0.5).abs() <= (w[1].gc - 0.5).abs());
        }
    }

    #[test]
    fn forbidden_site_in_prefix_is_repaired() {
        // BsaI on the reverse strand inside the editable prefix.
        let seed = b"GAGACCAGTTCTACAGTCCGACGATC";
        let params = PrimerParams::default();
        let sc = screen();
        let bsai = MotifScreen::new(&["GGTCTC"]).unwrap();

        let open = PrimerConstraints { params: &params, cut_site: &sc, forbidden: None, avoid: Vec::new() };
        assert!(open.accepts(seed));

        let c = PrimerConstraints { params: &params, cut_site: &sc, forbidden: Some(&bsai), avoid: Vec::new() };
        assert!(!c.accepts(seed));
        let found = search("forward", seed, &c).unwrap();
        assert!(found.iter().all(|p| p.radius == 1));
        assert!(found.iter().all(|p| !bsai.contains_any(&p.sequence)));
        assert_eq!(dna::as_str(&found[0].sequence), "AAGACCAGTTCTACAGTCCGACGATC");
    }

    #[test]
    fn exhausted_neighbourhood_is_an_error() {
        let params = PrimerParams { prefix_len: 2, max_radius: 1, ..PrimerParams::default() };
        let sc = screen();
        let c = PrimerConstraints { params: &params, cut_site: &sc, forbidden: None, avoid: Vec::new() };
        // The cut-site k-mer sits beyond the editable prefix.
        let err = search("reverse", b"ACACTGAGACGCACAC", &c).unwrap_err();
        assert!(matches!(err, DesignError::NoPrimerFound { radius: 1, .. }));
    }

    #[test]
    fn pair_keeps_reverse_away_from_forward() {
        let params = PrimerParams {
            reverse_seed: "GTTCAGAGTTCTACAGTCCGACGATC".to_string(),
            min_distance: 3,
            ..PrimerParams::default()
        };
        let sc = screen();
        let pair = search_pair(&params, &sc, None).unwrap();
        assert_eq!(pair.forward.radius, 0);
        assert_eq!(pair.reverse.radius, 3);
        assert!(dna::edit_distance(&pair.forward.sequence, &pair.reverse.sequence) >= 3);
    }
}
