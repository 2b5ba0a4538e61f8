//! Writing designed libraries: CSV table, FASTA, JSON summary, and a
//! `polars` frame for the terminal.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::*;
use serde::{Serialize, Serializer};

use crate::dna;
use crate::error::Result;
use crate::library::{Oligo, ValidationReport};
use crate::part::SequencePart;
use crate::primer::PrimerPair;
use crate::variant::VariantKind;

/// Serialize a byte sequence as a string.
pub fn ser_seq<S: Serializer>(seq: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(dna::as_str(seq))
}

/// One CSV row.
#[derive(Debug, Serialize)]
struct OligoRow<'a> {
    name: &'a str,
    category: &'static str,
    barcode: &'a str,
    target: &'a str,
    oligo: &'a str,
    length: usize,
}

impl<'a> From<&'a Oligo> for OligoRow<'a> {
    fn from(o: &'a Oligo) -> Self {
        OligoRow {
            name: &o.name,
            category: o.kind.as_str(),
            barcode: dna::as_str(&o.barcode),
            target: dna::as_str(&o.target),
            oligo: dna::as_str(&o.sequence),
            length: o.len(),
        }
    }
}

/// Write `name,category,barcode,target,oligo,length` rows.
pub fn write_csv_to<W: Write>(w: W, oligos: &[Oligo]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    for o in oligos {
        wtr.serialize(OligoRow::from(o))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(path: P, oligos: &[Oligo]) -> Result<()> {
    write_csv_to(BufWriter::new(File::create(path.as_ref())?), oligos)?;
    log::info!("wrote {} oligos to {}", oligos.len(), path.as_ref().display());
    Ok(())
}

fn write_fasta_record<W: Write>(w: &mut W, id: &str, seq: &[u8]) -> std::io::Result<()> {
    w.write_all(b">")?;
    w.write_all(id.as_bytes())?;
    w.write_all(b"\n")?;
    w.write_all(seq)?;
    w.write_all(b"\n")?;
    Ok(())
}

pub fn write_fasta_to<W: Write>(mut w: W, oligos: &[Oligo]) -> Result<()> {
    for o in oligos {
        write_fasta_record(&mut w, &o.name, &o.sequence)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_fasta<P: AsRef<Path>>(path: P, oligos: &[Oligo]) -> Result<()> {
    write_fasta_to(BufWriter::new(File::create(path.as_ref())?), oligos)?;
    log::info!("wrote FASTA to {}", path.as_ref().display());
    Ok(())
}

/// Count of one variant family.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryCount {
    pub category: &'static str,
    pub variants: usize,
    pub oligos: usize,
}

/// What a design run produced, for the JSON report and the terminal table.
#[derive(Clone, Debug, Serialize)]
pub struct DesignSummary {
    pub target: String,
    #[serde(serialize_with = "ser_seq")]
    pub cut_site_region: Vec<u8>,
    pub categories: Vec<CategoryCount>,
    pub duplicates_dropped: usize,
    pub total_oligos: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub primers: PrimerPair,
    pub validation: ValidationReport,
}

/// Per-family counts for `oligos`, in generation order.
pub fn category_counts(variant_counts: &[(VariantKind, usize)], oligos: &[Oligo]) -> Vec<CategoryCount> {
    variant_counts
        .iter()
        .map(|&(kind, variants)| CategoryCount {
            category: kind.as_str(),
            variants,
            oligos: oligos.iter().filter(|o| o.kind == kind).count(),
        })
        .collect()
}

pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &DesignSummary) -> Result<()> {
    let f = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(f, summary)?;
    log::info!("wrote summary to {}", path.as_ref().display());
    Ok(())
}

/// Counts per category as a `DataFrame` (`category`, `variants`, `oligos`).
pub fn summary_frame(summary: &DesignSummary) -> PolarsResult<DataFrame> {
    let cats: Vec<String> = summary.categories.iter().map(|c| c.category.to_string()).collect();
    let variants: Vec<u64> = summary.categories.iter().map(|c| c.variants as u64).collect();
    let oligos: Vec<u64> = summary.categories.iter().map(|c| c.oligos as u64).collect();
    df!(
        "category" => cats,
        "variants" => variants,
        "oligos"   => oligos,
    )
}

/// Built-in constant parts as a `DataFrame` (`name`, `kind`, `sequence`, `length`, `source`).
pub fn parts_frame(parts: &[SequencePart]) -> PolarsResult<DataFrame> {
    df!(
        "name"     => parts.iter().map(|p| p.name).collect::<Vec<_>>(),
        "kind"     => parts.iter().map(|p| p.kind.to_string()).collect::<Vec<_>>(),
        "sequence" => parts.iter().map(|p| p.sequence).collect::<Vec<_>>(),
        "length"   => parts.iter().map(|p| p.sequence.len() as u64).collect::<Vec<_>>(),
        "source"   => parts.iter().map(|p| p.provenance.source).collect::<Vec<_>>(),
    )
}
