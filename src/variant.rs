//! Enumeration of **target variants**: PAM changes, mismatches, insertions,
//! deletions and complement stretches of the protospacer.
//!
//! Families are generated in a fixed order (wild type, PAM, single mismatch,
//! double mismatch, insertion, deletion, complement stretch) and the set
//! keeps only the first variant for any assembled target sequence, so the
//! library never carries two oligos that test the same substrate.
//!
//! Positions in variant names are 1-based from the 5' end of the protospacer.
//!
//! # Examples
//! ```
//! use nucleaseq_design::target::{PamSide, Target};
//! use nucleaseq_design::variant::{VariantParams, VariantKind, generate};
//! let t = Target::new("t", b"ACGT", b"TGG", PamSide::ThreePrime).unwrap();
//! let set = generate(&t, &VariantParams::mismatches_only());
//! assert_eq!(set.count(VariantKind::Mismatch), 12);
//! assert_eq!(set.variants[0].name, "WT");
//! ```
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dna;
use crate::target::{PamSide, Target};

/// Variant families.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    WildType,
    Pam,
    Mismatch,
    DoubleMismatch,
    Insertion,
    Deletion,
    ComplementStretch,
    /// Unmodified sequence loaded from a reference file.
    Reference,
}

impl VariantKind {
    pub const ALL: [VariantKind; 8] = [
        VariantKind::WildType, VariantKind::Pam, VariantKind::Mismatch, VariantKind::DoubleMismatch,
        VariantKind::Insertion, VariantKind::Deletion, VariantKind::ComplementStretch, VariantKind::Reference,
    ];

    /// Stable lowercase label used in CSV output.
    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::WildType => "wild_type",
            VariantKind::Pam => "pam",
            VariantKind::Mismatch => "mismatch",
            VariantKind::DoubleMismatch => "double_mismatch",
            VariantKind::Insertion => "insertion",
            VariantKind::Deletion => "deletion",
            VariantKind::ComplementStretch => "complement_stretch",
            VariantKind::Reference => "reference",
        }
    }
}

/// Which families to generate and how far each one reaches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantParams {
    pub pam_variants: bool,
    pub mismatches: bool,
    pub double_mismatches: bool,
    /// Longest inserted string; `0` disables insertions.
    pub max_insertion: usize,
    /// Longest contiguous deletion; `0` disables deletions.
    pub max_deletion: usize,
    /// Shortest complement stretch; `0` disables complement stretches.
    pub complement_min: usize,
    /// Longest complement stretch; `None` means the whole protospacer.
    pub complement_max: Option<usize>,
}

impl Default for VariantParams {
    fn default() -> Self {
        VariantParams {
            pam_variants: true,
            mismatches: true,
            double_mismatches: true,
            max_insertion: 1,
            max_deletion: 2,
            complement_min: 2,
            complement_max: None,
        }
    }
}

impl VariantParams {
    /// Wild type plus single mismatches, nothing else.
    pub fn mismatches_only() -> Self {
        VariantParams {
            pam_variants: false,
            mismatches: true,
            double_mismatches: false,
            max_insertion: 0,
            max_deletion: 0,
            complement_min: 0,
            complement_max: None,
        }
    }
}

/// One library member before barcodes and primers are attached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variant {
    pub name: String,
    pub kind: VariantKind,
    pub protospacer: Vec<u8>,
    /// Empty for [`VariantKind::Reference`], whose full sequence lives in `protospacer`.
    pub pam: Vec<u8>,
}

impl Variant {
    /// Assembled target sequence, 5'→3'.
    pub fn sequence(&self, side: PamSide) -> Vec<u8> {
        side.join(&self.protospacer, &self.pam)
    }
}

/// Deduplicated, ordered variants of one target.
#[derive(Clone, Debug)]
pub struct VariantSet {
    pub side: PamSide,
    pub variants: Vec<Variant>,
    /// Variants dropped because an earlier one had the same sequence.
    pub duplicates_dropped: usize,
    seen: HashSet<Vec<u8>>,
}

impl VariantSet {
    pub fn new(side: PamSide) -> Self {
        VariantSet { side, variants: Vec::new(), duplicates_dropped: 0, seen: HashSet::new() }
    }

    /// Add `v` unless its sequence is already present. Returns whether it was kept.
    pub fn push(&mut self, v: Variant) -> bool {
        let seq = v.sequence(self.side);
        if self.seen.insert(seq) {
            self.variants.push(v);
            true
        } else {
            log::trace!("dropping duplicate variant {}", v.name);
            self.duplicates_dropped += 1;
            false
        }
    }

    /// Add an unmodified reference sequence.
    pub fn push_reference(&mut self, name: &str, seq: &[u8]) -> bool {
        self.push(Variant {
            name: name.to_string(),
            kind: VariantKind::Reference,
            protospacer: seq.to_vec(),
            pam: Vec::new(),
        })
    }

    pub fn len(&self) -> usize { self.variants.len() }

    pub fn is_empty(&self) -> bool { self.variants.is_empty() }

    pub fn count(&self, kind: VariantKind) -> usize {
        self.variants.iter().filter(|v| v.kind == kind).count()
    }

    /// `(kind, count)` for every family present, in generation order.
    pub fn counts(&self) -> Vec<(VariantKind, usize)> {
        VariantKind::ALL.iter().map(|&k| (k, self.count(k))).filter(|(_, n)| *n > 0).collect()
    }
}

fn variant(name: String, kind: VariantKind, protospacer: Vec<u8>, pam: &[u8]) -> Variant {
    Variant { name, kind, protospacer, pam: pam.to_vec() }
}

fn push_family<I: IntoIterator<Item = Variant>>(set: &mut VariantSet, kind: VariantKind, family: I) {
    let before = set.duplicates_dropped;
    let mut kept = 0usize;
    for v in family {
        if set.push(v) { kept += 1; }
    }
    log::debug!(
        "variants: {} kept={} duplicates={}",
        kind.as_str(), kept, set.duplicates_dropped - before
    );
}

/// Every PAM of the same length except the wild-type one.
pub fn pam_variants(target: &Target) -> impl Iterator<Item = Variant> + '_ {
    dna::words(target.pam.len())
        .filter(move |pam| *pam != target.pam)
        .map(move |pam| {
            let name = format!("PAM_{}", dna::as_str(&pam));
            variant(name, VariantKind::Pam, target.protospacer.clone(), &pam)
        })
}

/// Each protospacer position replaced by each of the three other bases.
pub fn single_mismatches(target: &Target) -> Vec<Variant> {
    let p = &target.protospacer;
    let mut out = Vec::with_capacity(p.len() * 3);
    for (i, &b) in p.iter().enumerate() {
        for alt in dna::alternatives(b) {
            let mut s = p.clone();
            s[i] = alt;
            out.push(variant(format!("MM_{}{}", i + 1, alt as char), VariantKind::Mismatch, s, &target.pam));
        }
    }
    out
}

/// Every pair of positions `i < j`, each replaced by each alternative base.
pub fn double_mismatches(target: &Target) -> Vec<Variant> {
    let p = &target.protospacer;
    let n = p.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2 * 9);
    for i in 0..n {
        for j in (i + 1)..n {
            for a in dna::alternatives(p[i]) {
                for b in dna::alternatives(p[j]) {
                    let mut s = p.clone();
                    s[i] = a;
                    s[j] = b;
                    let name = format!("MM_{}{}_{}{}", i + 1, a as char, j + 1, b as char);
                    out.push(variant(name, VariantKind::DoubleMismatch, s, &target.pam));
                }
            }
        }
    }
    out
}

/// Every string of length `1..=max_len` inserted into every internal gap.
pub fn insertions(target: &Target, max_len: usize) -> Vec<Variant> {
    let p = &target.protospacer;
    let mut out = Vec::new();
    for after in 1..p.len() {
        for len in 1..=max_len {
            for ins in dna::words(len) {
                let mut s = Vec::with_capacity(p.len() + len);
                s.extend_from_slice(&p[..after]);
                s.extend_from_slice(&ins);
                s.extend_from_slice(&p[after..]);
                let name = format!("INS_{}_{}", after, dna::as_str(&ins));
                out.push(variant(name, VariantKind::Insertion, s, &target.pam));
            }
        }
    }
    out
}

/// Every contiguous deletion of length `1..=max_len`; never the whole protospacer.
pub fn deletions(target: &Target, max_len: usize) -> Vec<Variant> {
    let p = &target.protospacer;
    let max_len = max_len.min(p.len().saturating_sub(1));
    let mut out = Vec::new();
    for len in 1..=max_len {
        for start in 0..=(p.len() - len) {
            let mut s = Vec::with_capacity(p.len() - len);
            s.extend_from_slice(&p[..start]);
            s.extend_from_slice(&p[start + len..]);
            let name = if len == 1 {
                format!("DEL_{}", start + 1)
            } else {
                format!("DEL_{}_{}", start + 1, start + len)
            };
            out.push(variant(name, VariantKind::Deletion, s, &target.pam));
        }
    }
    out
}

/// Every contiguous window of length `min_len..=max_len` replaced by its complement.
pub fn complement_stretches(target: &Target, min_len: usize, max_len: Option<usize>) -> Vec<Variant> {
    let p = &target.protospacer;
    let max_len = max_len.unwrap_or(p.len()).min(p.len());
    let mut out = Vec::new();
    for len in min_len.max(1)..=max_len {
        for start in 0..=(p.len() - len) {
            let mut s = p.clone();
            let comp = dna::complement(&p[start..start + len]);
            s[start..start + len].copy_from_slice(&comp);
            let name = format!("CS_{}_{}", start + 1, start + len);
            out.push(variant(name, VariantKind::ComplementStretch, s, &target.pam));
        }
    }
    out
}

/// Build the full deduplicated variant set for `target`.
pub fn generate(target: &Target, params: &VariantParams) -> VariantSet {
    let mut set = VariantSet::new(target.pam_side);
    set.push(variant("WT".to_string(), VariantKind::WildType, target.protospacer.clone(), &target.pam));

    if params.pam_variants {
        push_family(&mut set, VariantKind::Pam, pam_variants(target));
    }
    if params.mismatches {
        push_family(&mut set, VariantKind::Mismatch, single_mismatches(target));
    }
    if params.double_mismatches {
        push_family(&mut set, VariantKind::DoubleMismatch, double_mismatches(target));
    }
    if params.max_insertion > 0 {
        push_family(&mut set, VariantKind::Insertion, insertions(target, params.max_insertion));
    }
    if params.max_deletion > 0 {
        push_family(&mut set, VariantKind::Deletion, deletions(target, params.max_deletion));
    }
    if params.complement_min > 0 {
        push_family(
            &mut set,
            VariantKind::ComplementStretch,
            complement_stretches(target, params.complement_min, params.complement_max),
        );
    }

    log::info!(
        "variants: {} unique for {} ({} duplicates dropped)",
        set.len(), target.name, set.duplicates_dropped
    );
    set
}
