//! Input: reference targets and barcode candidates.
//!
//! ### Design
//! - **FASTA/FASTQ (optionally gzipped)** parsed with `needletail`
//! - **Plain / delimited barcode lists** parsed with `csv` (flexible rows,
//!   `#` comments, comma or tab separated)
//!
//! ### Errors
//! Parse errors are converted into [`DesignError`] and bubbled to the caller.
use std::path::Path;

use needletail::parse_fastx_file;

use crate::dna;
use crate::error::{DesignError, Result};

/// Input format detected from path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat { Fastx, Delimited }

/// Guess the barcode list format from the file name.
pub fn detect_format<P: AsRef<Path>>(path: P) -> ListFormat {
    let name = path.as_ref().to_string_lossy().to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let fastx = [".fa", ".fasta", ".fna", ".fq", ".fastq"].iter().any(|ext| name.ends_with(ext));
    if fastx { ListFormat::Fastx } else { ListFormat::Delimited }
}

/// Read every record of a FASTA/FASTQ file as `(id, sequence)`.
///
/// Ids are cut at the first whitespace; sequences are validated as `ACGT`.
pub fn read_references<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<u8>)>> {
    let mut reader = parse_fastx_file(path.as_ref())?;
    let mut out = Vec::new();
    while let Some(record) = reader.next() {
        let rec = record?;
        let id = String::from_utf8_lossy(rec.id()).split_whitespace().next().unwrap_or("").to_string();
        let seq = dna::validate(&id, &rec.seq())?;
        out.push((id, seq));
    }
    log::info!("read {} reference record(s) from {}", out.len(), path.as_ref().display());
    Ok(out)
}

/// Find one record by id.
pub fn find_reference(records: &[(String, Vec<u8>)], id: &str) -> Result<Vec<u8>> {
    records
        .iter()
        .find(|(rid, _)| rid == id)
        .map(|(_, s)| s.clone())
        .ok_or_else(|| DesignError::UnknownReference(id.to_string()))
}

fn is_header(fields: &[&str]) -> bool {
    fields.iter().any(|f| {
        let f = f.trim().to_ascii_lowercase();
        f == "sequence" || f == "barcode" || f == "seq"
    })
}

/// 1-based file line of a record. The reader reports where the previous
/// record ended, so skipped blank and `#` lines are counted here.
fn record_line(text: &str, pos: &csv::Position) -> u64 {
    let mut line = pos.line();
    let rest = usize::try_from(pos.byte()).ok().and_then(|b| text.get(b..)).unwrap_or("");
    for l in rest.split('\n') {
        let l = l.strip_suffix('\r').unwrap_or(l);
        if l.is_empty() || l.starts_with('#') { line += 1; } else { break; }
    }
    line
}

/// Read barcode candidates from FASTA/FASTQ or a delimited text file.
///
/// For delimited files the `sequence`/`barcode` column is used when a header
/// names one; otherwise the last field of each row.
pub fn read_barcodes<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    if detect_format(path) == ListFormat::Fastx {
        return Ok(read_references(path)?.into_iter().map(|(_, s)| s).collect());
    }

    let text = std::fs::read_to_string(path)?;
    let delimiter = if text.contains('\t') { b'\t' } else { b',' };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut column: Option<usize> = None;
    let mut out = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let rec = result?;
        let fields: Vec<&str> = rec.iter().collect();
        if fields.iter().all(|f| f.is_empty()) { continue; }
        if row == 0 && is_header(&fields) {
            column = fields.iter().position(|f| {
                let f = f.to_ascii_lowercase();
                f == "sequence" || f == "barcode" || f == "seq"
            });
            continue;
        }
        let idx = column.unwrap_or(fields.len() - 1);
        let field = fields.get(idx).copied().unwrap_or("");
        let line = rec.position().map_or(row as u64 + 1, |pos| record_line(&text, pos));
        let seq = dna::validate(&format!("barcode on line {line}"), field.as_bytes())?;
        out.push(seq);
    }
    log::info!("read {} barcode candidate(s) from {}", out.len(), path.display());
    Ok(out)
}

#[cfg(test)]
mod seqio_tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(detect_format("bc.fasta.gz"), ListFormat::Fastx);
        assert_eq!(detect_format("BC.FA"), ListFormat::Fastx);
        assert_eq!(detect_format("bc.csv"), ListFormat::Delimited);
        assert_eq!(detect_format("bc.txt"), ListFormat::Delimited);
    }

    #[test]
    fn references_from_fasta() {
        let f = write_tmp(".fa", ">lambda1 on-target\nGACGCATAAAGATGAGACGCTGG\n>off1\ngacgcataaagatgagacggagg\n");
        let refs = read_references(f.path()).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].0, "lambda1");
        assert_eq!(refs[1].1, b"GACGCATAAAGATGAGACGGAGG".to_vec());
        assert!(find_reference(&refs, "off1").is_ok());
        assert!(matches!(find_reference(&refs, "nope"), Err(DesignError::UnknownReference(_))));
    }

    #[test]
    fn barcodes_from_plain_list_and_csv() {
        let f = write_tmp(".txt", "# candidates\nACGTACGT\n\nttggccaa\n");
        assert_eq!(read_barcodes(f.path()).unwrap(), vec![b"ACGTACGT".to_vec(), b"TTGGCCAA".to_vec()]);

        let f = write_tmp(".csv", "id,sequence,note\nbc1,ACGTACGT,x\nbc2,TTGGCCAA,y\n");
        assert_eq!(read_barcodes(f.path()).unwrap(), vec![b"ACGTACGT".to_vec(), b"TTGGCCAA".to_vec()]);

        let f = write_tmp(".tsv", "bc1\tACGTACGT\nbc2\tTTGGCCAA\n");
        assert_eq!(read_barcodes(f.path()).unwrap().len(), 2);
    }

    #[test]
    fn invalid_barcode_reports_line() {
        let f = write_tmp(".txt", "ACGT\nACNT\n");
        let err = read_barcodes(f.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn line_numbers_count_comments_and_blanks() {
        let f = write_tmp(".txt", "# pool A\nACGTACGT\n\n# pool B\nTTGGCCAA\nACGTNCGT\n");
        let err = read_barcodes(f.path()).unwrap_err();
        assert!(err.to_string().contains("line 6"), "{err}");

        let f = write_tmp(".csv", "# exported\r\nid,sequence\r\nbc1,ACGTACGT\r\n\r\nbc2,ACGNACGT\r\n");
        let err = read_barcodes(f.path()).unwrap_err();
        assert!(err.to_string().contains("line 5"), "{err}");
    }
}
