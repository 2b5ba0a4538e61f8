//! Default constant parts of the oligo layout.
//!
//! - Primer seeds: Illumina small-RNA 5' adapter (forward) and 3' adapter
//!   (reverse), so the designed library stays compatible with standard
//!   small-RNA sequencing primers once the editable prefix is fixed.
//! - Flanks and filler: arbitrary low-complexity-free context with balanced
//!   GC and no run longer than 2.
//! - Forbidden sites: BsaI, the Type IIS enzyme commonly used to clone the
//!   pool (the reverse strand is screened automatically).
use crate::part::{PartKind, Provenance, SequencePart};

const ILLUMINA_SMALL_RNA: Provenance = Provenance {
    source: "Illumina Adapter Sequences (TruSeq Small RNA)",
    notes: "RNA 5' adapter / RNA 3' adapter, written as DNA.",
};

const DESIGN_DEFAULT: Provenance = Provenance {
    source: "nucleaseq-design defaults",
    notes: "Chosen to avoid homopolymers and the default target.",
};

/// Forward primer seed (RA5 as DNA).
pub const DEFAULT_FORWARD: SequencePart = SequencePart {
    name: "fwd_seed",
    kind: PartKind::Primer,
    sequence: "GTTCAGAGTTCTACAGTCCGACGATC",
    provenance: ILLUMINA_SMALL_RNA,
};

/// Reverse primer seed (RA3 as DNA). Lands on the oligo as its reverse complement.
pub const DEFAULT_REVERSE: SequencePart = SequencePart {
    name: "rev_seed",
    kind: PartKind::Primer,
    sequence: "TGGAATTCTCGGGTGCCAAGG",
    provenance: ILLUMINA_SMALL_RNA,
};

pub const LEFT_FLANK: SequencePart = SequencePart {
    name: "left_flank",
    kind: PartKind::Flank,
    sequence: "ACTTGCATCAGT",
    provenance: DESIGN_DEFAULT,
};

pub const RIGHT_FLANK: SequencePart = SequencePart {
    name: "right_flank",
    kind: PartKind::Flank,
    sequence: "TACTCGAGTAGC",
    provenance: DESIGN_DEFAULT,
};

pub const FILLER: SequencePart = SequencePart {
    name: "filler",
    kind: PartKind::Filler,
    sequence: "ACAGTTCAGT",
    provenance: DESIGN_DEFAULT,
};

/// BsaI recognition site.
pub const BSAI: SequencePart = SequencePart {
    name: "BsaI",
    kind: PartKind::Forbidden,
    sequence: "GGTCTC",
    provenance: Provenance { source: "REBASE", notes: "GGTCTC(N1/N5)" },
};

/// Forbidden motifs screened by default.
pub const DEFAULT_FORBIDDEN: &[SequencePart] = &[BSAI];

/// λ1 SpCas9 target: protospacer and PAM.
pub const LAMBDA1_PROTOSPACER: SequencePart = SequencePart {
    name: "lambda1",
    kind: PartKind::Target,
    sequence: "GACGCATAAAGATGAGACGC",
    provenance: Provenance { source: "bacteriophage λ genome", notes: "Widely used SpCas9 model target." },
};

pub const LAMBDA1_PAM: SequencePart = SequencePart {
    name: "lambda1_pam",
    kind: PartKind::Target,
    sequence: "TGG",
    provenance: LAMBDA1_PROTOSPACER.provenance,
};

/// All embedded parts, for listing.
pub const ALL_PARTS: &[SequencePart] = &[
    DEFAULT_FORWARD, DEFAULT_REVERSE, LEFT_FLANK, RIGHT_FLANK, FILLER, BSAI, LAMBDA1_PROTOSPACER, LAMBDA1_PAM,
];

#[cfg(test)]
mod parts_tests {
    use super::*;
    use crate::dna;

    #[test]
    fn parts_are_valid_dna() {
        for p in ALL_PARTS {
            assert!(dna::validate(p.name, p.bytes()).is_ok(), "{}", p.name);
        }
    }

    #[test]
    fn constant_parts_avoid_bsai() {
        for p in [DEFAULT_FORWARD, DEFAULT_REVERSE, LEFT_FLANK, RIGHT_FLANK, FILLER] {
            let s = p.sequence;
            assert!(!s.contains("GGTCTC") && !s.contains("GAGACC"), "{}", p.name);
        }
    }
}
