// ==============================================================================
// frequency.rs - Frequency and Conservation Annotator
// ==============================================================================
// Description: Population frequencies, CADD and conservation terms from INFO
// Author: Matt Barham
// Created: 2026-09-09
// Modified: 2026-09-09
// Version: 1.0.0
// ==============================================================================

use crate::config::InfoKeys;
use crate::parsers::vcf::RawCallRecord;

/// Scores read from the INFO column of one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyAnnotation {
    pub thousand_genomes_frequency: Option<f64>,
    pub exac_frequency: Option<f64>,
    pub cadd_score: f64,
    pub gerp_conservation: Vec<String>,
    pub phast_conservation: Vec<String>,
    pub phylop_conservation: Vec<String>,
}

/// First value of an INFO key as a number
///
/// An absent key reads as "0". A present key whose first value is missing,
/// not a number or not finite gives None.
fn first_number(record: &RawCallRecord, key: &str) -> Option<f64> {
    match record.info_values(key) {
        None => Some(0.0),
        Some(values) => values
            .first()?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite()),
    }
}

fn raw_list(record: &RawCallRecord, key: &str) -> Vec<String> {
    record.info_values(key).map(<[String]>::to_vec).unwrap_or_default()
}

pub fn annotate_frequencies(record: &RawCallRecord, keys: &InfoKeys) -> FrequencyAnnotation {
    FrequencyAnnotation {
        thousand_genomes_frequency: first_number(record, &keys.thousand_genomes),
        exac_frequency: first_number(record, &keys.exac),
        cadd_score: first_number(record, &keys.cadd).unwrap_or(0.0),
        gerp_conservation: raw_list(record, &keys.gerp),
        phast_conservation: raw_list(record, &keys.phast_cons),
        phylop_conservation: raw_list(record, &keys.phylop_cons),
    }
}
