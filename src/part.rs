//! Core types for the **constant parts** of an oligo (primers, flanks,
//! filler, forbidden sites) and their provenance.
//!
//! Parts are `&'static str` constants so that the defaults live in the
//! binary; see [`crate::data`].
use core::fmt;

/// Role of a constant part in the oligo layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PartKind {
    /// Seed for a primer binding site.
    Primer,
    /// Constant context around the target slot.
    Flank,
    /// Repeated to pad oligos to a fixed length.
    Filler,
    /// Motif that must not appear outside the target slot (e.g. a Type IIS site).
    Forbidden,
    /// A reference target (protospacer + PAM).
    Target,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PartKind::Primer => "primer",
            PartKind::Flank => "flank",
            PartKind::Filler => "filler",
            PartKind::Forbidden => "forbidden",
            PartKind::Target => "target",
        };
        f.write_str(s)
    }
}

/// Where a sequence string came from.
#[derive(Clone, Copy, Debug)]
pub struct Provenance {
    /// Human-readable source.
    pub source: &'static str,
    /// Any helpful notes.
    pub notes: &'static str,
}

/// A named constant sequence.
#[derive(Clone, Copy, Debug)]
pub struct SequencePart {
    /// Short stable name (e.g. `"fwd_seed"`, `"BsaI"`).
    pub name: &'static str,
    pub kind: PartKind,
    /// Uppercase `ACGT` string.
    pub sequence: &'static str,
    pub provenance: Provenance,
}

impl SequencePart {
    pub fn bytes(&self) -> &'static [u8] { self.sequence.as_bytes() }
}
