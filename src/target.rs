//! The reference **target**: protospacer, PAM and the canonical cut site.
//!
//! A target is held as two validated byte strings. The PAM side decides how
//! they are joined (`protospacer + PAM` for Cas9-like nucleases, `PAM +
//! protospacer` for Cas12a-like ones) and where the default cut falls.
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::dna;
use crate::error::{DesignError, Result};

/// Which end of the protospacer carries the PAM.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PamSide {
    /// `protospacer + PAM` (SpCas9 and relatives).
    #[default]
    ThreePrime,
    /// `PAM + protospacer` (Cas12a and relatives).
    FivePrime,
}

impl fmt::Display for PamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PamSide::ThreePrime => write!(f, "3'"),
            PamSide::FivePrime => write!(f, "5'"),
        }
    }
}

impl PamSide {
    /// Join a protospacer and a PAM in 5'→3' order.
    pub fn join(self, protospacer: &[u8], pam: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(protospacer.len() + pam.len());
        match self {
            PamSide::ThreePrime => { out.extend_from_slice(protospacer); out.extend_from_slice(pam); }
            PamSide::FivePrime => { out.extend_from_slice(pam); out.extend_from_slice(protospacer); }
        }
        out
    }
}

/// A validated nuclease target.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    /// Label used for the wild-type oligo and in logs.
    pub name: String,
    pub protospacer: Vec<u8>,
    pub pam: Vec<u8>,
    pub pam_side: PamSide,
    /// Explicit cut position, counted from the start of [`Target::sequence`].
    pub cut_offset: Option<usize>,
}

impl Target {
    /// Validate and build a target.
    ///
    /// # Examples
    /// ```
    /// use nucleaseq_design::target::{PamSide, Target};
    /// let t = Target::new("lambda1", b"GACGCATAAAGATGAGACGC", b"tgg", PamSide::ThreePrime).unwrap();
    /// assert_eq!(t.sequence(), b"GACGCATAAAGATGAGACGCTGG".to_vec());
    /// assert_eq!(t.cut_position(), 17);
    /// ```
    pub fn new(name: &str, protospacer: &[u8], pam: &[u8], pam_side: PamSide) -> Result<Self> {
        let protospacer = dna::validate("protospacer", protospacer)?;
        let pam = dna::validate("PAM", pam)?;
        Ok(Target { name: name.to_string(), protospacer, pam, pam_side, cut_offset: None })
    }

    /// Override the cut position. Must fall inside the target.
    pub fn with_cut_offset(mut self, offset: usize) -> Result<Self> {
        if offset > self.len() {
            return Err(DesignError::InvalidParams(format!(
                "cut offset {offset} is outside the {}-nt target", self.len()
            )));
        }
        self.cut_offset = Some(offset);
        Ok(self)
    }

    /// Split a reference record (protospacer and PAM already joined) into a target.
    pub fn from_reference(name: &str, seq: &[u8], pam_len: usize, pam_side: PamSide) -> Result<Self> {
        let seq = dna::validate(name, seq)?;
        if pam_len == 0 || pam_len >= seq.len() {
            return Err(DesignError::InvalidParams(format!(
                "reference {name} ({} nt) cannot hold a {pam_len}-nt PAM and a protospacer", seq.len()
            )));
        }
        let (protospacer, pam) = match pam_side {
            PamSide::ThreePrime => { let (p, m) = seq.split_at(seq.len() - pam_len); (p, m) }
            PamSide::FivePrime => { let (m, p) = seq.split_at(pam_len); (p, m) }
        };
        Target::new(name, protospacer, pam, pam_side)
    }

    /// Full target in 5'→3' order.
    pub fn sequence(&self) -> Vec<u8> {
        self.pam_side.join(&self.protospacer, &self.pam)
    }

    pub fn len(&self) -> usize { self.protospacer.len() + self.pam.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Number of bases before the cut on the non-target strand, never past the end.
    pub fn cut_position(&self) -> usize {
        if let Some(c) = self.cut_offset { return c.min(self.len()); }
        match self.pam_side {
            PamSide::ThreePrime => self.protospacer.len().saturating_sub(3),
            PamSide::FivePrime => (self.pam.len() + 18).min(self.len()),
        }
    }

    /// `window` bases on each side of the cut, clipped to the target.
    ///
    /// # Examples
    /// ```
    /// use nucleaseq_design::target::{PamSide, Target};
    /// let t = Target::new("t", b"GACGCATAAAGATGAGACGC", b"TGG", PamSide::ThreePrime).unwrap();
    /// assert_eq!(t.cut_site_region(5), b"TGAGACGCTG".to_vec());
    /// ```
    pub fn cut_site_region(&self, window: usize) -> Vec<u8> {
        let seq = self.sequence();
        let cut = self.cut_position().min(seq.len());
        let start = cut.saturating_sub(window);
        let end = (cut + window).min(seq.len());
        seq[start..end].to_vec()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "{} {}+{} (PAM {}, cut after {})",
            self.name, dna::as_str(&self.protospacer), dna::as_str(&self.pam), self.pam_side, self.cut_position()
        )
    }
}
