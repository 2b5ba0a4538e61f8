//! Screens that decide whether a sequence could be mistaken for the
//! canonical cut site, or carries a forbidden motif.
//!
//! [`CutSiteScreen`] combines two tests on both strands:
//! - **shared k-mer**: an Aho–Corasick automaton over every `k`-mer of the
//!   cut-site region and its reverse complement;
//! - **approximate site**: an infix (HW) edlib alignment of the region
//!   against the sequence, accepting up to `max_edits` edits.
//!
//! [`MotifScreen`] reports exact motif occurrences with positions so callers
//! can ignore hits that sit inside the designed target slot.
use aho_corasick::{AhoCorasick, AhoCorasickKind, MatchKind};

use crate::dna;
use crate::error::Result;

mod edwrap {
    use edlib_rs::edlibrs::{edlibAlignRs, EdlibAlignConfigRs, EdlibAlignModeRs, EdlibAlignTaskRs, EdlibEqualityPairRs};
    pub struct Hit { pub start: usize, pub end: usize, pub edits: usize }
    pub fn locate(pattern: &[u8], text: &[u8], max_edits: usize) -> Option<Hit> {
        let empty: &[EdlibEqualityPairRs] = &[];
        let cfg = EdlibAlignConfigRs {
            k: max_edits as i32,
            mode: EdlibAlignModeRs::EDLIB_MODE_HW,
            task: EdlibAlignTaskRs::EDLIB_TASK_LOC,
            additionalequalities: empty,
        };
        let res = edlibAlignRs(pattern, text, &cfg);
        if res.editDistance < 0 { return None; }
        let start = res.startLocations.as_ref()?.first().copied()?;
        let end = res.endLocations.as_ref()?.first().copied()?;
        Some(Hit { start: start.max(0) as usize, end: end.max(0) as usize + 1, edits: res.editDistance as usize })
    }
}

/// Why a sequence was judged to interfere with the cut site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Interference {
    /// A `k`-mer of the region (or its reverse complement) occurs at `position`.
    SharedKmer { position: usize, kmer: String },
    /// The region (or its reverse complement) aligns to `start..end` with `edits` edits.
    ApproximateSite { start: usize, end: usize, edits: usize, reverse: bool },
}

impl std::fmt::Display for Interference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interference::SharedKmer { position, kmer } => write!(f, "shares {kmer} at {position}"),
            Interference::ApproximateSite { start, end, edits, reverse } => write!(
                f, "cut-site {}match at {start}..{end} with {edits} edit(s)",
                if *reverse { "reverse-complement " } else { "" }
            ),
        }
    }
}

/// Strand-symmetric test against one cut-site region.
#[derive(Clone, Debug)]
pub struct CutSiteScreen {
    region: Vec<u8>,
    region_rc: Vec<u8>,
    k: usize,
    max_edits: usize,
    kmers: Vec<Vec<u8>>,
    ac: AhoCorasick,
}

impl CutSiteScreen {
    /// Index `region` for `k`-mer and approximate lookups. `k` is clipped to the region length.
    ///
    /// # Examples
    /// ```
    /// use nucleaseq_design::interference::CutSiteScreen;
    /// let screen = CutSiteScreen::new(b"TGAGACGCTG", 6, 1).unwrap();
    /// assert!(screen.interferes(b"AAAAGAGACGAAAA").is_some());
    /// assert!(screen.interferes(b"ATATATATATATAT").is_none());
    /// ```
    pub fn new(region: &[u8], k: usize, max_edits: usize) -> Result<Self> {
        let region = dna::normalize(region);
        let region_rc = dna::revcomp(&region);
        let k = k.clamp(1, region.len().max(1));
        let mut kmers: Vec<Vec<u8>> = Vec::new();
        for strand in [&region, &region_rc] {
            for w in strand.windows(k) {
                if !kmers.iter().any(|m| m == w) { kmers.push(w.to_vec()); }
            }
        }
        let ac = AhoCorasick::builder()
            .kind(Some(AhoCorasickKind::DFA))
            .match_kind(MatchKind::LeftmostFirst)
            .build(&kmers)?;
        Ok(CutSiteScreen { region, region_rc, k, max_edits, kmers, ac })
    }

    pub fn region(&self) -> &[u8] { &self.region }

    pub fn k(&self) -> usize { self.k }

    /// First reason `seq` interferes with the cut site, if any.
    pub fn interferes(&self, seq: &[u8]) -> Option<Interference> {
        if self.region.is_empty() { return None; }
        let s = dna::normalize(seq);
        if let Some(m) = self.ac.find(s.as_slice()) {
            let kmer = dna::as_str(&self.kmers[m.pattern().as_usize()]).to_string();
            return Some(Interference::SharedKmer { position: m.start(), kmer });
        }
        // An approximate hit needs at least region_len - max_edits bases of text.
        if s.len() + self.max_edits < self.region.len() { return None; }
        for (pattern, reverse) in [(&self.region, false), (&self.region_rc, true)] {
            if let Some(hit) = edwrap::locate(pattern, &s, self.max_edits) {
                return Some(Interference::ApproximateSite { start: hit.start, end: hit.end, edits: hit.edits, reverse });
            }
        }
        None
    }
}

/// A motif occurrence found by [`MotifScreen::occurrences`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MotifHit {
    pub motif: String,
    pub start: usize,
    pub end: usize,
    /// Matched as the reverse complement of the motif.
    pub reverse: bool,
}

/// Exact, overlapping search for a set of motifs on both strands.
#[derive(Clone, Debug)]
pub struct MotifScreen {
    patterns: Vec<(String, bool)>,
    ac: Option<AhoCorasick>,
}

impl MotifScreen {
    pub fn new<S: AsRef<[u8]>>(motifs: &[S]) -> Result<Self> {
        let mut patterns: Vec<(String, bool)> = Vec::new();
        let mut seqs: Vec<Vec<u8>> = Vec::new();
        for m in motifs {
            let fwd = dna::normalize(m.as_ref());
            if fwd.is_empty() { continue; }
            let rc = dna::revcomp(&fwd);
            let name = dna::as_str(&fwd).to_string();
            seqs.push(fwd.clone());
            patterns.push((name.clone(), false));
            // Palindromic sites are reported once.
            if rc != fwd {
                seqs.push(rc);
                patterns.push((name, true));
            }
        }
        let ac = if seqs.is_empty() { None } else { Some(AhoCorasick::new(&seqs)?) };
        Ok(MotifScreen { patterns, ac })
    }

    pub fn is_empty(&self) -> bool { self.ac.is_none() }

    pub fn contains_any(&self, seq: &[u8]) -> bool {
        match &self.ac {
            Some(ac) => ac.is_match(dna::normalize(seq).as_slice()),
            None => false,
        }
    }

    /// Every occurrence, including overlapping ones, in order of end position.
    pub fn occurrences(&self, seq: &[u8]) -> Vec<MotifHit> {
        let Some(ac) = &self.ac else { return Vec::new() };
        let s = dna::normalize(seq);
        ac.find_overlapping_iter(s.as_slice())
            .map(|m| {
                let (motif, reverse) = &self.patterns[m.pattern().as_usize()];
                MotifHit { motif: motif.clone(), start: m.start(), end: m.end(), reverse: *reverse }
            })
            .collect()
    }
}
