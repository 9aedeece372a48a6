// ==============================================================================
// ped.rs - Pedigree (PED) Parser
// ==============================================================================
// Description: Parser for PED and cmms-style pedigree files
// Author: Matt Barham
// Created: 2026-09-12
// Modified: 2026-09-30
// Version: 1.0.0
// ==============================================================================
// Format: tab-separated, six fixed columns, optional extra columns
// Example:
//   #FamilyID  SampleID  Father  Mother  Sex  Phenotype  Clinical_db
//   fam1       proband   father  mother  1    2          IEM,EP
//   fam1       father    0       0       1    1          IEM
// The leading '#' line is optional; it names any extra columns.
// ==============================================================================

use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One line of a pedigree file
#[derive(Debug, Clone, PartialEq)]
pub struct PedRecord {
    pub family_id: String,
    pub individual_id: String,
    /// "0" when unknown
    pub father: String,
    /// "0" when unknown
    pub mother: String,
    /// 1 = male, 2 = female, other = unknown
    pub sex: String,
    /// 1 = unaffected, 2 = affected, other = unknown
    pub phenotype: String,
    /// Extra columns keyed by header name
    pub extra: BTreeMap<String, String>,
}

/// The single family described by a pedigree file
#[derive(Debug, Clone, PartialEq)]
pub struct PedFamily {
    pub family_id: String,
    pub individuals: Vec<PedRecord>,
}

/// Errors that can occur during pedigree parsing
#[derive(Error, Debug)]
pub enum PedParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Line {line}: expected at least 6 columns, found {found}")]
    MissingColumns { line: u64, found: usize },

    #[error("Only one family per pedigree file is supported, found: {}", .0.join(", "))]
    MultipleFamilies(Vec<String>),

    #[error("Pedigree file contains no individuals")]
    EmptyFile,
}

/// Pedigree file parser
pub struct PedParser;

impl PedParser {
    /// Parse a pedigree file
    ///
    /// # Returns
    /// * `Ok(PedFamily)` - The family and its individuals in file order
    /// * `Err(PedParseError::MultipleFamilies)` - More than one family id
    pub fn parse(path: impl AsRef<Path>) -> Result<PedFamily, PedParseError> {
        let file = File::open(path.as_ref())?;
        Self::parse_reader(file)
    }

    pub fn parse_reader<R: Read>(reader: R) -> Result<PedFamily, PedParseError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut extra_columns: Vec<String> = Vec::new();
        let mut individuals = Vec::new();
        let mut family_ids: Vec<String> = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);

            let first = record.get(0).unwrap_or("");
            if first.starts_with('#') {
                if idx == 0 {
                    extra_columns = record.iter().skip(6).map(str::to_string).collect();
                }
                continue;
            }
            if record.iter().all(str::is_empty) {
                continue;
            }

            let ped = Self::parse_record(&record, &extra_columns, line)?;
            if !family_ids.contains(&ped.family_id) {
                family_ids.push(ped.family_id.clone());
            }
            individuals.push(ped);
        }

        match family_ids.len() {
            0 => Err(PedParseError::EmptyFile),
            1 => Ok(PedFamily {
                family_id: family_ids.remove(0),
                individuals,
            }),
            _ => Err(PedParseError::MultipleFamilies(family_ids)),
        }
    }

    fn parse_record(
        record: &StringRecord,
        extra_columns: &[String],
        line: u64,
    ) -> Result<PedRecord, PedParseError> {
        if record.len() < 6 {
            return Err(PedParseError::MissingColumns {
                line,
                found: record.len(),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or("").to_string();

        let extra = extra_columns
            .iter()
            .zip(record.iter().skip(6))
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();

        Ok(PedRecord {
            family_id: field(0),
            individual_id: field(1),
            father: field(2),
            mother: field(3),
            sex: field(4),
            phenotype: field(5),
            extra,
        })
    }
}
