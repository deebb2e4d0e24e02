// ==============================================================================
// parsers/vcf.rs - VCF record parser
// ==============================================================================
// Description: Lenient line-oriented parser for single-sample pre-called VCFs
// Author: Matt Barham
// Created: 2026-02-02
// Modified: 2026-02-06
// Version: 1.0.0
// ==============================================================================
// References:
// - VCF 4.2 Spec: https://samtools.github.io/hts-specs/VCFv4.2.pdf
// ==============================================================================
// Column layout (tab-delimited, 10 columns minimum):
//   CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO  FORMAT  SAMPLE
// Malformed lines are dropped, never fatal. Only undecodable bytes fail.
// ==============================================================================

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::models::{Genotype, VariantRecord};

/// Prefix of catalogued reference SNP identifiers
pub const RSID_PREFIX: &str = "rs";

const COMMENT_MARKER: char = '#';
const MIN_FIELDS: usize = 10;
const UTF8_BOM: &str = "\u{feff}";

// Column indices
const COL_ID: usize = 2;
const COL_REF: usize = 3;
const COL_ALT: usize = 4;
const COL_QUAL: usize = 5;
const COL_FILTER: usize = 6;
const COL_FORMAT: usize = 8;
const COL_SAMPLE: usize = 9;

/// VCF parsing errors
#[derive(Error, Debug)]
pub enum VcfParseError {
    #[error("Variant file is not valid UTF-8 text: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

/// Lenient VCF parser with per-parse counters
#[derive(Debug, Default)]
pub struct VcfParser {
    /// Comment, short, or non-rsID lines skipped during the last parse
    pub skipped_count: usize,

    /// Data lines without a GT value in the last parse
    pub no_genotype_count: usize,
}

impl VcfParser {
    /// Create new VCF parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw upload bytes and parse them
    ///
    /// # Returns
    /// * `Ok(records)` - Parsed records (possibly empty)
    /// * `Err(VcfParseError::Decode)` - Bytes are not UTF-8 text
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<Vec<VariantRecord>, VcfParseError> {
        let text = decode_text(bytes)?;
        Ok(self.parse_str(text))
    }

    /// Parse decoded VCF text into normalized records
    ///
    /// # Example
    /// ```
    /// use pgx_processor::parsers::VcfParser;
    ///
    /// let vcf = "10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT:DP:GQ\t0|1:35:99\n";
    /// let mut parser = VcfParser::new();
    /// let records = parser.parse_str(vcf);
    /// assert_eq!(records.len(), 1);
    /// assert_eq!(records[0].genotype_call, "0/1");
    /// ```
    pub fn parse_str(&mut self, text: &str) -> Vec<VariantRecord> {
        self.skipped_count = 0;
        self.no_genotype_count = 0;

        let mut records = Vec::new();

        for line in text.lines() {
            if line.starts_with(COMMENT_MARKER) {
                self.skipped_count += 1;
                continue;
            }

            match self.parse_line(line) {
                Some(record) => records.push(record),
                None => continue,
            }
        }

        debug!(
            "Parsed {} variant records ({} lines skipped, {} without genotype)",
            records.len(),
            self.skipped_count,
            self.no_genotype_count
        );

        records
    }

    /// Parse a single data line, returning None if it should be omitted
    fn parse_line(&mut self, line: &str) -> Option<VariantRecord> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() < MIN_FIELDS {
            self.skipped_count += 1;
            return None;
        }

        let sample = zip_format_fields(fields[COL_FORMAT], fields[COL_SAMPLE]);

        let genotype_call = match sample.get("GT") {
            Some(gt) => gt.replace('|', "/"),
            None => {
                self.no_genotype_count += 1;
                return None;
            }
        };

        let rsid = fields[COL_ID];
        if !rsid.starts_with(RSID_PREFIX) {
            self.skipped_count += 1;
            return None;
        }

        Some(VariantRecord {
            rsid: rsid.to_string(),
            genotype: Genotype::from_call(&genotype_call),
            genotype_call,
            ref_allele: fields[COL_REF].to_string(),
            alt_allele: fields[COL_ALT].to_string(),
            quality: parse_quality(fields[COL_QUAL]),
            filter: fields[COL_FILTER].to_string(),
            depth: parse_count(sample.get("DP").copied()),
            genotype_quality: parse_count(sample.get("GQ").copied()),
        })
    }
}

/// Decode upload bytes as UTF-8, stripping a leading byte-order mark
pub fn decode_text(bytes: &[u8]) -> Result<&str, VcfParseError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// Zip FORMAT keys with sample values by position
fn zip_format_fields<'a>(format: &'a str, sample: &'a str) -> HashMap<&'a str, &'a str> {
    format.split(':').zip(sample.split(':')).collect()
}

/// QUAL column: ".", unparsable or non-finite → 0.0
fn parse_quality(qual: &str) -> f64 {
    qual.parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
        .unwrap_or(0.0)
}

/// DP/GQ values: absent or non-numeric → 0
fn parse_count(value: Option<&str>) -> u32 {
    value.and_then(|v| v.parse::<u32>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE
";

    fn vcf(body: &str) -> String {
        format!("{}{}", HEADER, body)
    }

    #[test]
    fn test_parse_valid_lines() {
        let text = vcf("\
10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT:DP:GQ\t0/1:35:99
22\t42130692\trs3892097\tC\tT\t61.5\tPASS\t.\tGT:GQ:DP\t1|1:80:20
");
        let mut parser = VcfParser::new();
        let records = parser.parse_str(&text);

        assert_eq!(records.len(), 2);

        assert_eq!(records[0].rsid, "rs4244285");
        assert_eq!(records[0].genotype, Genotype::Het);
        assert_eq!(records[0].ref_allele, "G");
        assert_eq!(records[0].alt_allele, "A");
        assert_eq!(records[0].quality, 50.0);
        assert_eq!(records[0].depth, 35);
        assert_eq!(records[0].genotype_quality, 99);
        assert!(records[0].is_pass());

        // FORMAT order is honored, phasing is discarded
        assert_eq!(records[1].genotype_call, "1/1");
        assert_eq!(records[1].genotype, Genotype::HomAlt);
        assert_eq!(records[1].genotype_quality, 80);
        assert_eq!(records[1].depth, 20);
        assert_eq!(records[1].quality, 61.5);
    }

    #[test]
    fn test_skips_short_and_comment_lines() {
        let text = vcf("\
10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT
# trailing comment
\n
10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT\t0/1
");
        let mut parser = VcfParser::new();
        let records = parser.parse_str(&text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].genotype, Genotype::Het);
        assert!(parser.skipped_count >= 4);
    }

    #[test]
    fn test_requires_rsid_and_genotype() {
        let text = vcf("\
1\t1000\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
1\t2000\tchr1:2000:A:G\tA\tG\t50\tPASS\t.\tGT\t0/1
1\t3000\trs111\tA\tG\t50\tPASS\t.\tDP:GQ\t30:99
1\t4000\trs222\tA\tG\t50\tPASS\t.\tGT\t0/0
");
        let mut parser = VcfParser::new();
        let records = parser.parse_str(&text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rsid, "rs222");
        assert_eq!(records[0].genotype, Genotype::HomRef);
        assert_eq!(parser.no_genotype_count, 1);
    }

    #[test]
    fn test_defaults_for_missing_values() {
        let text = vcf("\
1\t1000\trs1\tA\tG\t.\t.\t.\tGT:DP:GQ\t0/1:.:high
1\t2000\trs2\tA\tG\tlow\t\t.\tGT\t./.
");
        let mut parser = VcfParser::new();
        let records = parser.parse_str(&text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quality, 0.0);
        assert_eq!(records[0].depth, 0);
        assert_eq!(records[0].genotype_quality, 0);
        assert!(!records[0].is_pass());

        assert_eq!(records[1].quality, 0.0);
        assert_eq!(records[1].genotype, Genotype::Unknown);
        assert!(!records[1].is_pass());
    }

    #[test]
    fn test_non_finite_quality_defaults_to_zero() {
        let text = vcf("\
1\t1000\trs1\tA\tG\tNaN\tPASS\t.\tGT\t0/1
1\t2000\trs2\tA\tG\tinf\tPASS\t.\tGT\t0/1
1\t3000\trs3\tA\tG\t-Infinity\tPASS\t.\tGT\t0/1
");
        let mut parser = VcfParser::new();
        let records = parser.parse_str(&text);

        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.quality, 0.0, "{}", record.rsid);
        }
    }

    #[test]
    fn test_sample_shorter_than_format() {
        // Trailing FORMAT keys without values are dropped by the zip
        let text = "1\t1000\trs1\tA\tG\t40\tPASS\t.\tGT:DP:GQ\t1/1\n";
        let mut parser = VcfParser::new();
        let records = parser.parse_str(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].genotype, Genotype::HomAlt);
        assert_eq!(records[0].depth, 0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "1\t1000\trs1\tA\tG\t40\tPASS\t.\tGT:DP\t0/1:31\r\n";
        let mut parser = VcfParser::new();
        let records = parser.parse_str(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].depth, 31);
    }

    #[test]
    fn test_parse_bytes_rejects_binary() {
        let mut parser = VcfParser::new();
        let result = parser.parse_bytes(&[0x00, 0x9f, 0x92, 0x96, 0xff]);
        assert!(matches!(result, Err(VcfParseError::Decode(_))));
    }

    #[test]
    fn test_parse_bytes_strips_bom() {
        let mut bytes = UTF8_BOM.as_bytes().to_vec();
        bytes.extend_from_slice(b"1\t1000\trs1\tA\tG\t40\tPASS\t.\tGT\t0/1\n");

        let mut parser = VcfParser::new();
        let records = parser.parse_bytes(&bytes).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let mut parser = VcfParser::new();
        let records = parser.parse_bytes(HEADER.as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
