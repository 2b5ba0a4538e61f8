//! Design parameters.
//!
//! Every struct is `#[serde(default)]`, so a JSON parameter file only needs
//! the fields it changes:
//!
//! ```
//! let p = nucleaseq_design::config::DesignParams::from_json(r#"{
//!     "target": { "protospacer": "GACGCATAAAGATGAGACGC", "pam": "AGG" },
//!     "barcodes": { "length": 10 }
//! }"#).unwrap();
//! assert_eq!(p.target.pam, "AGG");
//! assert_eq!(p.barcodes.length, 10);
//! assert_eq!(p.barcodes.min_distance, 3);
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::barcode::BarcodeParams;
use crate::data::primers::{DEFAULT_FORBIDDEN, FILLER, LAMBDA1_PAM, LAMBDA1_PROTOSPACER, LEFT_FLANK, RIGHT_FLANK};
use crate::error::{DesignError, Result};
use crate::primer::PrimerParams;
use crate::target::{PamSide, Target};
use crate::variant::VariantParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    pub name: String,
    pub protospacer: String,
    pub pam: String,
    pub pam_side: PamSide,
    /// Cut position from the start of the joined target; `None` uses the nuclease default.
    pub cut_offset: Option<usize>,
}

impl Default for TargetParams {
    fn default() -> Self {
        TargetParams {
            name: LAMBDA1_PROTOSPACER.name.to_string(),
            protospacer: LAMBDA1_PROTOSPACER.sequence.to_string(),
            pam: LAMBDA1_PAM.sequence.to_string(),
            pam_side: PamSide::ThreePrime,
            cut_offset: None,
        }
    }
}

impl TargetParams {
    pub fn build(&self) -> Result<Target> {
        let t = Target::new(&self.name, self.protospacer.as_bytes(), self.pam.as_bytes(), self.pam_side)?;
        match self.cut_offset {
            Some(c) => t.with_cut_offset(c),
            None => Ok(t),
        }
    }
}

/// Cut-site interference screen and forbidden motifs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    /// Bases on each side of the cut that form the canonical cut-site region.
    pub window: usize,
    /// Shared k-mer length that counts as interference.
    pub k: usize,
    /// Edits allowed for an approximate cut-site occurrence.
    pub max_edits: usize,
    pub forbidden_motifs: Vec<String>,
}

impl Default for ScreenParams {
    fn default() -> Self {
        ScreenParams {
            window: 5,
            k: 8,
            max_edits: 2,
            forbidden_motifs: DEFAULT_FORBIDDEN.iter().map(|p| p.sequence.to_string()).collect(),
        }
    }
}

/// Constant parts around the target slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyParams {
    pub left_flank: String,
    pub right_flank: String,
    /// Pad every oligo to exactly this length with `filler`.
    pub pad_to: Option<usize>,
    pub filler: String,
    /// Fail instead of warning when validation finds violations.
    pub strict: bool,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        AssemblyParams {
            left_flank: LEFT_FLANK.sequence.to_string(),
            right_flank: RIGHT_FLANK.sequence.to_string(),
            pad_to: None,
            filler: FILLER.sequence.to_string(),
            strict: false,
        }
    }
}

/// Everything the pipeline needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignParams {
    pub target: TargetParams,
    pub variants: VariantParams,
    pub barcodes: BarcodeParams,
    pub primers: PrimerParams,
    pub assembly: AssemblyParams,
    pub screen: ScreenParams,
    /// Worker threads; `0` uses every logical core.
    pub threads: usize,
}

fn check_range(what: &str, lo: f64, hi: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
        return Err(DesignError::InvalidParams(format!("{what}: GC range {lo}..{hi} is not within 0..1")));
    }
    Ok(())
}

impl DesignParams {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings no design could satisfy.
    pub fn validate(&self) -> Result<()> {
        let b = &self.barcodes;
        if b.length == 0 {
            return Err(DesignError::InvalidParams("barcode length must be > 0".into()));
        }
        if b.count_per_variant == 0 {
            return Err(DesignError::InvalidParams("barcodes.count_per_variant must be > 0".into()));
        }
        check_range("barcodes", b.gc_min, b.gc_max)?;

        let p = &self.primers;
        check_range("primers", p.gc_min, p.gc_max)?;
        for (which, seed) in [("forward", &p.forward_seed), ("reverse", &p.reverse_seed)] {
            if p.prefix_len > seed.len() {
                return Err(DesignError::InvalidParams(format!(
                    "primers.prefix_len {} exceeds the {}-nt {which} seed", p.prefix_len, seed.len()
                )));
            }
        }

        let v = &self.variants;
        if let Some(max) = v.complement_max {
            if v.complement_min > 0 && max < v.complement_min {
                return Err(DesignError::InvalidParams(format!(
                    "variants.complement_max {max} is below complement_min {}", v.complement_min
                )));
            }
        }

        if self.screen.window == 0 || self.screen.k == 0 {
            return Err(DesignError::InvalidParams("screen.window and screen.k must be > 0".into()));
        }
        // An infix alignment with that many edits matches any text.
        if self.screen.max_edits >= 2 * self.screen.window {
            return Err(DesignError::InvalidParams(format!(
                "screen.max_edits {} must be below the {}-nt cut-site region",
                self.screen.max_edits, 2 * self.screen.window
            )));
        }
        if let Some(0) = self.assembly.pad_to {
            return Err(DesignError::InvalidParams("assembly.pad_to must be > 0".into()));
        }
        if self.assembly.pad_to.is_some() && self.assembly.filler.is_empty() {
            return Err(DesignError::InvalidParams("assembly.pad_to needs a non-empty filler".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DesignParams::default().validate().unwrap();
    }

    #[test]
    fn json_round_trip_preserves_overrides() {
        let mut p = DesignParams::default();
        p.target.pam_side = PamSide::FivePrime;
        p.assembly.pad_to = Some(170);
        let back = DesignParams::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(back, p);
        assert!(p.to_json().unwrap().contains("five_prime"));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut p = DesignParams::default();
        p.barcodes.gc_min = 0.7;
        assert!(matches!(p.validate(), Err(DesignError::InvalidParams(_))));

        let mut p = DesignParams::default();
        p.primers.prefix_len = 40;
        assert!(p.validate().is_err());

        let mut p = DesignParams::default();
        p.variants.complement_min = 5;
        p.variants.complement_max = Some(3);
        assert!(p.validate().is_err());
    }

    #[test]
    fn edits_must_be_shorter_than_the_region() {
        let mut p = DesignParams::default();
        p.screen.window = 1;
        p.screen.max_edits = 2;
        assert!(matches!(p.validate(), Err(DesignError::InvalidParams(m)) if m.contains("max_edits")));
        p.screen.max_edits = 1;
        p.validate().unwrap();
    }

    #[test]
    fn unknown_json_is_an_error() {
        assert!(matches!(DesignParams::from_json("{ not json"), Err(DesignError::Json(_))));
    }

    #[test]
    fn target_params_build() {
        let t = TargetParams { cut_offset: Some(5), ..TargetParams::default() }.build().unwrap();
        assert_eq!(t.cut_position(), 5);
    }
}
