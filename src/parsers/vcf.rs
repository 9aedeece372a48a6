// ==============================================================================
// parsers/vcf.rs - Annotated VCF stream reader
// ==============================================================================
// Description: Reads VEP/genmod annotated VCF files into raw call records
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-07
// Version: 2.0.0
// ==============================================================================
// References:
// - VCF 4.2 Spec: https://samtools.github.io/hts-specs/VCFv4.2.pdf
// - noodles-vcf: https://docs.rs/noodles-vcf/0.81.0/noodles_vcf/
// - genmod annotations: RankScore, GeneticModels, Compounds
// ==============================================================================
// Records are split as text (tab/semicolon/comma) after the header has been
// validated by noodles. Multi-allelic lines yield one record per ALT allele.
// ==============================================================================

use flate2::read::MultiGzDecoder;
use noodles_vcf as vcf;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// INFO key carrying VEP consequence entries
pub const CSQ_KEY: &str = "CSQ";
/// genmod per-case rank score, `case:score`
pub const RANK_SCORE_KEY: &str = "RankScore";
/// genmod per-case inheritance models, `case:AR_hom|AD`
pub const GENETIC_MODELS_KEY: &str = "GeneticModels";
/// genmod per-case compounds, `case:1_880086_T_C>23|...`
pub const COMPOUNDS_KEY: &str = "Compounds";

/// One VEP consequence entry, keyed by the CSQ format field names
pub type VepEntry = BTreeMap<String, String>;

/// Compound partner as written by genmod
#[derive(Debug, Clone, PartialEq)]
pub struct RawCompound {
    /// `chrom_pos_ref_alt` of the partner
    pub variant_name: String,
    /// Unparsed combined score, absent when genmod wrote no `>score`
    pub compound_score: Option<String>,
}

/// Raw FORMAT values of one sample, keyed by FORMAT key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGenotype {
    fields: BTreeMap<String, String>,
}

impl RawGenotype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw value for a FORMAT key; missing values (`.` or empty) read as None
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty() && *v != ".")
    }
}

/// One variant allele as read from the VCF, before any annotation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCallRecord {
    pub chromosome: String,
    pub position: u64,
    /// Raw ID column, `;`-joined
    pub ids: String,
    pub reference: String,
    pub alternative: String,
    pub quality: Option<f64>,
    pub filters: Vec<String>,
    /// INFO key -> comma separated values (flags map to an empty list)
    pub info: BTreeMap<String, Vec<String>>,
    /// VEP entries for this allele, in file order
    pub transcripts: Vec<VepEntry>,
    /// Sample id -> FORMAT values
    pub genotypes: HashMap<String, RawGenotype>,
    /// Case display name -> rank score
    pub rank_scores: HashMap<String, f64>,
    /// Case display name -> inheritance models
    pub genetic_models: HashMap<String, Vec<String>>,
    /// Case display name -> compound partners
    pub compounds: HashMap<String, Vec<RawCompound>>,
}

impl RawCallRecord {
    /// Values of an INFO key, if present
    pub fn info_values(&self, key: &str) -> Option<&[String]> {
        self.info.get(key).map(Vec::as_slice)
    }

    /// Rank score of this variant for a case (0.0 when the case has none)
    pub fn rank_score(&self, case_name: &str) -> f64 {
        self.rank_scores.get(case_name).copied().unwrap_or(0.0)
    }
}

/// VCF parsing errors
#[derive(Error, Debug)]
pub enum VcfParseError {
    #[error("Failed to open VCF file: {0}")]
    FileOpenError(String),

    #[error("Failed to read VCF header: {0}")]
    HeaderError(String),

    #[error("Failed to parse VCF record at line {line}: {details}")]
    RecordError { line: usize, details: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Header facts the record splitter needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VcfHeader {
    /// Sample columns, in file order
    pub sample_names: Vec<String>,
    /// Field names of a CSQ entry, taken from the CSQ description
    pub csq_fields: Vec<String>,
}

/// Streaming reader over an annotated VCF
pub struct VcfReader<R: BufRead> {
    lines: Lines<R>,
    header: VcfHeader,
    line_number: usize,
    pending: VecDeque<RawCallRecord>,
}

impl VcfReader<Box<dyn BufRead>> {
    /// Open a `.vcf` or `.vcf.gz` file
    ///
    /// BGZF files are read with a multi-member gzip decoder.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VcfParseError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| VcfParseError::FileOpenError(format!("{}: {}", path.display(), e)))?;

        let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Self::new(reader)
    }
}

impl<R: BufRead> VcfReader<R> {
    /// Read the header and position the reader on the first record
    pub fn new(reader: R) -> Result<Self, VcfParseError> {
        let mut lines = reader.lines();
        let mut raw_header = String::new();
        let mut line_number = 0;

        loop {
            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    return Err(VcfParseError::HeaderError(
                        "missing #CHROM header line".to_string(),
                    ))
                }
            };
            line_number += 1;

            if !line.starts_with('#') {
                return Err(VcfParseError::HeaderError(format!(
                    "expected header line at line {}",
                    line_number
                )));
            }

            raw_header.push_str(&line);
            raw_header.push('\n');

            if line.starts_with("#CHROM") {
                break;
            }
        }

        let header = parse_header(&raw_header)?;
        debug!(
            "VCF header: {} samples, {} CSQ fields",
            header.sample_names.len(),
            header.csq_fields.len()
        );

        Ok(Self {
            lines,
            header,
            line_number,
            pending: VecDeque::new(),
        })
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    pub fn sample_names(&self) -> &[String] {
        &self.header.sample_names
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<RawCallRecord, VcfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(VcfParseError::IoError(e))),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, self.line_number, &self.header) {
                Ok(records) => self.pending.extend(records),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn parse_header(raw_header: &str) -> Result<VcfHeader, VcfParseError> {
    let header: vcf::Header = raw_header
        .parse()
        .map_err(|e| VcfParseError::HeaderError(format!("{}", e)))?;

    let sample_names = header.sample_names().iter().cloned().collect();

    let csq_fields = header
        .infos()
        .get(CSQ_KEY)
        .map(|info| csq_fields_from_description(info.description()))
        .unwrap_or_default();

    Ok(VcfHeader {
        sample_names,
        csq_fields,
    })
}

/// Field names from a VEP description such as `"... Format: Allele|Consequence|SYMBOL"`
fn csq_fields_from_description(description: &str) -> Vec<String> {
    match description.split_once("Format:") {
        Some((_, format)) => format
            .trim()
            .trim_matches('"')
            .split('|')
            .map(|f| f.trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}

fn parse_line(
    line: &str,
    line_number: usize,
    header: &VcfHeader,
) -> Result<Vec<RawCallRecord>, VcfParseError> {
    let record_error = |details: String| VcfParseError::RecordError {
        line: line_number,
        details,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(record_error(format!(
            "expected at least 8 columns, found {}",
            fields.len()
        )));
    }

    let chromosome = fields[0].to_string();
    let position = fields[1]
        .parse::<u64>()
        .map_err(|_| record_error(format!("invalid position '{}'", fields[1])))?;
    let ids = fields[2].to_string();
    let reference = fields[3].to_string();
    let alternatives: Vec<&str> = fields[4].split(',').collect();

    // '.' means missing; an unparsable or non-finite QUAL is treated the same way
    let quality = match fields[5] {
        "." => None,
        raw => raw.parse::<f64>().ok().filter(|q| q.is_finite()),
    };

    let filters: Vec<String> = fields[6].split(';').map(str::to_string).collect();
    let info = parse_info(fields[7]);

    let rank_scores = parse_rank_scores(info.get(RANK_SCORE_KEY));
    let genetic_models = parse_genetic_models(info.get(GENETIC_MODELS_KEY));
    let compounds = parse_compounds(info.get(COMPOUNDS_KEY));

    let vep_entries: Vec<VepEntry> = info
        .get(CSQ_KEY)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    header
                        .csq_fields
                        .iter()
                        .cloned()
                        .zip(entry.split('|').map(str::to_string))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();

    let format_keys: Vec<&str> = fields.get(8).map(|f| f.split(':').collect()).unwrap_or_default();
    let sample_columns = fields.get(9..).unwrap_or(&[]);
    if !sample_columns.is_empty() && sample_columns.len() != header.sample_names.len() {
        return Err(record_error(format!(
            "expected {} sample columns, found {}",
            header.sample_names.len(),
            sample_columns.len()
        )));
    }

    let has_allele_field = header.csq_fields.iter().any(|f| f == "Allele");
    let multi_allelic = alternatives.len() > 1;

    let mut records = Vec::with_capacity(alternatives.len());
    for (alt_index, alternative) in alternatives.iter().enumerate() {
        let allele = vep_allele(&reference, alternative);
        let transcripts = vep_entries
            .iter()
            .filter(|entry| {
                !has_allele_field
                    || entry
                        .get("Allele")
                        .map(|a| *a == allele || a == alternative)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();

        let mut genotypes = HashMap::with_capacity(sample_columns.len());
        for (sample_name, column) in header.sample_names.iter().zip(sample_columns) {
            let mut genotype = RawGenotype::new();
            for (key, value) in format_keys.iter().zip(column.split(':')) {
                let value = if *key == "AD" && multi_allelic {
                    allele_depths_for(value, alt_index)
                } else {
                    value.to_string()
                };
                genotype.insert(*key, value);
            }
            genotypes.insert(sample_name.clone(), genotype);
        }

        records.push(RawCallRecord {
            chromosome: chromosome.clone(),
            position,
            ids: ids.clone(),
            reference: reference.clone(),
            alternative: alternative.to_string(),
            quality,
            filters: filters.clone(),
            info: info.clone(),
            transcripts,
            genotypes,
            rank_scores: rank_scores.clone(),
            genetic_models: genetic_models.clone(),
            compounds: compounds.clone(),
        });
    }

    Ok(records)
}

fn parse_info(raw: &str) -> BTreeMap<String, Vec<String>> {
    let mut info = BTreeMap::new();
    if raw == "." {
        return info;
    }

    for part in raw.split(';').filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((key, value)) => {
                info.insert(
                    key.to_string(),
                    value.split(',').map(str::to_string).collect(),
                );
            }
            None => {
                info.insert(part.to_string(), Vec::new());
            }
        }
    }

    info
}

fn parse_rank_scores(values: Option<&Vec<String>>) -> HashMap<String, f64> {
    let mut scores = HashMap::new();
    for value in values.into_iter().flatten() {
        let Some((case_name, score)) = value.split_once(':') else {
            continue;
        };
        match score.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => {
                scores.insert(case_name.to_string(), parsed);
            }
            _ => warn!("Ignoring non-numeric rank score '{}' for {}", score, case_name),
        }
    }
    scores
}

fn parse_genetic_models(values: Option<&Vec<String>>) -> HashMap<String, Vec<String>> {
    values
        .into_iter()
        .flatten()
        .filter_map(|value| value.split_once(':'))
        .map(|(case_name, models)| {
            (
                case_name.to_string(),
                models
                    .split('|')
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        })
        .collect()
}

fn parse_compounds(values: Option<&Vec<String>>) -> HashMap<String, Vec<RawCompound>> {
    values
        .into_iter()
        .flatten()
        .filter_map(|value| value.split_once(':'))
        .map(|(case_name, entries)| {
            let compounds = entries
                .split('|')
                .filter(|e| !e.is_empty())
                .map(|entry| match entry.split_once('>') {
                    Some((name, score)) => RawCompound {
                        variant_name: name.to_string(),
                        compound_score: Some(score.to_string()),
                    },
                    None => RawCompound {
                        variant_name: entry.to_string(),
                        compound_score: None,
                    },
                })
                .collect();
            (case_name.to_string(), compounds)
        })
        .collect()
}

/// Allele as VEP reports it: indels drop the shared leading base, deletions become "-"
fn vep_allele(reference: &str, alternative: &str) -> String {
    if reference.len() == 1 && alternative.len() == 1 {
        return alternative.to_string();
    }

    match (reference.chars().next(), alternative.chars().next()) {
        (Some(r), Some(a)) if r == a => {
            let trimmed = &alternative[a.len_utf8()..];
            if trimmed.is_empty() {
                "-".to_string()
            } else {
                trimmed.to_string()
            }
        }
        _ => alternative.to_string(),
    }
}

/// Reduce an AD value (`ref,alt1,alt2,...`) to `ref,alt` for one split allele
fn allele_depths_for(raw: &str, alt_index: usize) -> String {
    let depths: Vec<&str> = raw.split(',').collect();
    match (depths.first(), depths.get(alt_index + 1)) {
        (Some(ref_depth), Some(alt_depth)) => format!("{},{}", ref_depth, alt_depth),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "##fileformat=VCFv4.2
##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequence annotations from Ensembl VEP. Format: Allele|Consequence|SYMBOL|Feature|STRAND\">
##INFO=<ID=RankScore,Number=.,Type=String,Description=\"The rank score for this variant in this family. family_id:rank_score.\">
##INFO=<ID=GeneticModels,Number=.,Type=String,Description=\"The genetic models for this variant.\">
##INFO=<ID=Compounds,Number=.,Type=String,Description=\"List of compounding variants.\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tproband\tmother
";

    fn reader(body: &str) -> VcfReader<Cursor<Vec<u8>>> {
        let text = format!("{}{}", HEADER, body);
        VcfReader::new(Cursor::new(text.into_bytes())).unwrap()
    }

    #[test]
    fn test_header_samples_and_csq_format() {
        let reader = reader("");
        assert_eq!(reader.sample_names(), &["proband", "mother"]);
        assert_eq!(
            reader.header().csq_fields,
            vec!["Allele", "Consequence", "SYMBOL", "Feature", "STRAND"]
        );
    }

    #[test]
    fn test_single_record() {
        let body = "1\t880086\trs1;rs2\tT\tC\t100.5\tPASS\tCSQ=C|missense_variant|ABC1|ENST01|1;RankScore=fam1:23;GeneticModels=fam1:AR_hom|AR_comp;Compounds=fam1:1_880087_A_G>30|1_880090_G_T\tGT:AD:DP\t0/1:10,5:15\t0/0:20,0:20\n";
        let records: Vec<_> = reader(body).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.chromosome, "1");
        assert_eq!(record.position, 880086);
        assert_eq!(record.ids, "rs1;rs2");
        assert_eq!(record.quality, Some(100.5));
        assert_eq!(record.filters, vec!["PASS"]);
        assert_eq!(record.rank_score("fam1"), 23.0);
        assert_eq!(record.rank_score("fam2"), 0.0);
        assert_eq!(record.genetic_models["fam1"], vec!["AR_hom", "AR_comp"]);

        let compounds = &record.compounds["fam1"];
        assert_eq!(compounds.len(), 2);
        assert_eq!(compounds[0].variant_name, "1_880087_A_G");
        assert_eq!(compounds[0].compound_score.as_deref(), Some("30"));
        assert_eq!(compounds[1].compound_score, None);

        assert_eq!(record.transcripts.len(), 1);
        assert_eq!(record.transcripts[0]["Consequence"], "missense_variant");
        assert_eq!(record.transcripts[0]["SYMBOL"], "ABC1");

        assert_eq!(record.genotypes["proband"].get("GT"), Some("0/1"));
        assert_eq!(record.genotypes["proband"].get("AD"), Some("10,5"));
        assert_eq!(record.genotypes["mother"].get("DP"), Some("20"));
    }

    #[test]
    fn test_multi_allelic_split() {
        let body = "2\t500\t.\tAT\tA,ATT\t.\tPASS\tCSQ=-|frameshift_variant|XYZ|ENST9|-1,TT|inframe_insertion|XYZ|ENST9|-1\tGT:AD\t1/2:4,6,8\t0/1:9,3,0\n";
        let records: Vec<_> = reader(body).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].alternative, "A");
        assert_eq!(records[0].quality, None);
        assert_eq!(records[0].transcripts.len(), 1);
        assert_eq!(records[0].transcripts[0]["Consequence"], "frameshift_variant");
        assert_eq!(records[0].genotypes["proband"].get("AD"), Some("4,6"));

        assert_eq!(records[1].alternative, "ATT");
        assert_eq!(records[1].transcripts[0]["Consequence"], "inframe_insertion");
        assert_eq!(records[1].genotypes["proband"].get("AD"), Some("4,8"));
        assert_eq!(records[1].genotypes["mother"].get("AD"), Some("9,0"));
    }

    #[test]
    fn test_info_flags_and_missing_values() {
        let info = parse_info("DB;AF=0.1,0.2;EMPTY=");
        assert_eq!(info["DB"], Vec::<String>::new());
        assert_eq!(info["AF"], vec!["0.1", "0.2"]);
        assert_eq!(info["EMPTY"], vec![""]);
        assert!(parse_info(".").is_empty());

        let mut genotype = RawGenotype::new();
        genotype.insert("DP", ".");
        assert_eq!(genotype.get("DP"), None);
        assert_eq!(genotype.get("GQ"), None);
    }

    #[test]
    fn test_non_numeric_rank_score_is_dropped() {
        let values = vec!["fam1:high".to_string(), "fam2:7.5".to_string()];
        let scores = parse_rank_scores(Some(&values));
        assert!(!scores.contains_key("fam1"));
        assert_eq!(scores["fam2"], 7.5);
    }

    #[test]
    fn test_non_finite_scores_are_dropped() {
        let values = vec![
            "fam1:nan".to_string(),
            "fam2:inf".to_string(),
            "fam3:-Infinity".to_string(),
        ];
        assert!(parse_rank_scores(Some(&values)).is_empty());

        let body = "1	100	.	T	C	inf	PASS	RankScore=fam1:NaN	GT	0/1	0/0\n";
        let records: Vec<_> = reader(body).collect::<Result<_, _>>().unwrap();
        assert_eq!(records[0].quality, None);
        assert_eq!(records[0].rank_score("fam1"), 0.0);
    }

    #[test]
    fn test_vep_allele() {
        assert_eq!(vep_allele("T", "C"), "C");
        assert_eq!(vep_allele("AT", "A"), "-");
        assert_eq!(vep_allele("A", "ATT"), "TT");
        assert_eq!(vep_allele("AG", "CT"), "CT");
    }

    #[test]
    fn test_bad_position_is_record_error() {
        let body = "1\tabc\t.\tT\tC\t50\tPASS\t.\tGT\t0/1\t0/0\n";
        let result: Result<Vec<_>, _> = reader(body).collect();
        assert!(matches!(result, Err(VcfParseError::RecordError { line: 10, .. })));
    }

    #[test]
    fn test_missing_chrom_line() {
        let text = "##fileformat=VCFv4.2\n";
        assert!(matches!(
            VcfReader::new(Cursor::new(text.as_bytes().to_vec())),
            Err(VcfParseError::HeaderError(_))
        ));
    }
}
