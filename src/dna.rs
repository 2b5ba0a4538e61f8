//! DNA primitives used by every design stage.
//!
//! Complement, reverse complement and edit distance are delegated to the
//! [`bio`] crate; this module adds the small predicates the filters need
//! (GC fraction, homopolymer runs) and strict validation of designed bases.
//!
//! # Examples
//! ```
//! use nucleaseq_design::dna;
//! assert_eq!(dna::revcomp(b"AACG"), b"CGTT".to_vec());
//! assert_eq!(dna::complement(b"AACG"), b"TTGC".to_vec());
//! assert_eq!(dna::max_homopolymer(b"ACCCGT"), 3);
//! assert_eq!(dna::edit_distance(b"ACGT", b"AGT"), 1);
//! ```
use bio::alignment::distance;
use bio::alphabets::dna as bio_dna;

use crate::error::{DesignError, Result};

/// The designable alphabet, in the order used for every enumeration.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Uppercase a sequence; non-letters are kept as-is.
pub fn normalize(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| match b { b'a'..=b'z' => b.to_ascii_uppercase(), _ => b }).collect()
}

/// Normalize and check that `seq` is a non-empty `ACGT` string.
///
/// `what` names the sequence in the error (e.g. `"protospacer"`).
pub fn validate(what: &str, seq: &[u8]) -> Result<Vec<u8>> {
    let s = normalize(seq);
    if s.is_empty() {
        return Err(DesignError::EmptySequence { what: what.to_string() });
    }
    if let Some((position, &b)) = s.iter().enumerate().find(|(_, b)| !BASES.contains(b)) {
        return Err(DesignError::InvalidBase { what: what.to_string(), position, base: b as char });
    }
    Ok(s)
}

/// Like [`validate`] but allows the empty string (flanks, padding).
pub fn validate_optional(what: &str, seq: &[u8]) -> Result<Vec<u8>> {
    if seq.is_empty() { Ok(Vec::new()) } else { validate(what, seq) }
}

/// Base-wise complement, same orientation.
pub fn complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| bio_dna::complement(b)).collect()
}

/// Reverse complement.
pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    bio_dna::revcomp(seq)
}

/// The three bases other than `base`, in `ACGT` order.
pub fn alternatives(base: u8) -> impl Iterator<Item = u8> {
    BASES.into_iter().filter(move |&b| b != base)
}

/// Fraction of G/C bases; `0.0` for an empty sequence.
pub fn gc_fraction(seq: &[u8]) -> f64 {
    if seq.is_empty() { return 0.0; }
    let gc = seq.iter().filter(|&&b| matches!(b, b'G' | b'C' | b'g' | b'c')).count();
    gc as f64 / seq.len() as f64
}

/// Length of the longest run of a single base.
pub fn max_homopolymer(seq: &[u8]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<u8> = None;
    for &b in seq {
        run = if prev == Some(b) { run + 1 } else { 1 };
        best = best.max(run);
        prev = Some(b);
    }
    best
}

/// Levenshtein distance.
#[inline]
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    distance::levenshtein(a, b) as usize
}

/// Hamming distance, or `None` when the lengths differ.
#[inline]
pub fn hamming(a: &[u8], b: &[u8]) -> Option<usize> {
    if a.len() != b.len() { return None; }
    Some(distance::hamming(a, b) as usize)
}

/// Every `ACGT` word of length `len`, in lexicographic (odometer) order.
///
/// `len == 0` yields a single empty word.
pub fn words(len: usize) -> Words {
    Words { digits: vec![0; len], done: false }
}

/// Iterator returned by [`words`].
#[derive(Clone, Debug)]
pub struct Words {
    digits: Vec<usize>,
    done: bool,
}

impl Iterator for Words {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.done { return None; }
        let current = self.digits.iter().map(|&d| BASES[d]).collect();
        let mut carry = true;
        for d in self.digits.iter_mut().rev() {
            *d += 1;
            if *d == BASES.len() { *d = 0; } else { carry = false; break; }
        }
        if carry { self.done = true; }
        Some(current)
    }
}

/// Lossless view of a validated sequence as `&str`.
pub fn as_str(seq: &[u8]) -> &str {
    std::str::from_utf8(seq).unwrap_or("")
}

#[cfg(test)]
mod dna_tests {
    use super::*;

    #[test]
    fn validate_uppercases_and_rejects_n() {
        assert_eq!(validate("x", b"acgT").unwrap(), b"ACGT".to_vec());
        match validate("probe", b"ACNT") {
            Err(DesignError::InvalidBase { position, base, .. }) => {
                assert_eq!(position, 2);
                assert_eq!(base, 'N');
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(validate("x", b""), Err(DesignError::EmptySequence { .. })));
        assert!(validate_optional("flank", b"").unwrap().is_empty());
    }

    #[test]
    fn gc_and_homopolymer() {
        assert_eq!(gc_fraction(b"GCAT"), 0.5);
        assert_eq!(gc_fraction(b""), 0.0);
        assert_eq!(max_homopolymer(b""), 0);
        assert_eq!(max_homopolymer(b"AAAAT"), 4);
        assert_eq!(max_homopolymer(b"ACGT"), 1);
    }

    #[test]
    fn alternatives_skip_the_base() {
        let alts: Vec<u8> = alternatives(b'G').collect();
        assert_eq!(alts, vec![b'A', b'C', b'T']);
    }

    #[test]
    fn words_enumerate_in_odometer_order() {
        let w: Vec<Vec<u8>> = words(2).collect();
        assert_eq!(w.len(), 16);
        assert_eq!(w[0], b"AA".to_vec());
        assert_eq!(w[1], b"AC".to_vec());
        assert_eq!(w[4], b"CA".to_vec());
        assert_eq!(w[15], b"TT".to_vec());
        assert_eq!(words(0).count(), 1);
    }

    #[test]
    fn hamming_requires_equal_length() {
        assert_eq!(hamming(b"ACGT", b"ACGA"), Some(1));
        assert_eq!(hamming(b"ACGT", b"ACG"), None);
    }
}
