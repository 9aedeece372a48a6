// ==============================================================================
// genotype.rs - Genotype Extractor
// ==============================================================================
// Description: Builds one GenotypeCall per individual from FORMAT values
// Author: Matt Barham
// Created: 2026-09-08
// Modified: 2026-09-08
// Version: 1.0.0
// ==============================================================================

use crate::config::FormatField;
use crate::models::GenotypeCall;
use crate::parsers::vcf::RawCallRecord;

/// Parse an AD value of the form `ref,alt`
fn parse_allele_depths(raw: &str) -> Option<(u32, u32)> {
    let (ref_depth, alt_depth) = raw.split_once(',')?;
    Some((ref_depth.trim().parse().ok()?, alt_depth.trim().parse().ok()?))
}

/// Extract the configured fields for one individual
///
/// Missing or unparsable values leave the field unset; an individual with
/// no column in the record yields a call with only `sample` filled.
pub fn extract_genotype(
    record: &RawCallRecord,
    individual: &str,
    fields: &[FormatField],
) -> GenotypeCall {
    let mut call = GenotypeCall {
        sample: individual.to_string(),
        ..Default::default()
    };

    let Some(raw) = record.genotypes.get(individual) else {
        return call;
    };

    for field in fields {
        let value = raw.get(field.key());
        match field {
            FormatField::Genotype => call.genotype_call = value.map(str::to_string),
            FormatField::ReadDepth => call.read_depth = value.and_then(|v| v.parse().ok()),
            FormatField::AlleleDepths => call.allele_depths = value.and_then(parse_allele_depths),
            FormatField::GenotypeQuality => {
                call.genotype_quality = value.and_then(|v| v.parse().ok())
            }
        }
    }

    call
}

/// Calls for every individual, in the given order
pub fn extract_genotypes(
    record: &RawCallRecord,
    individuals: &[String],
    fields: &[FormatField],
) -> Vec<GenotypeCall> {
    individuals
        .iter()
        .map(|individual| extract_genotype(record, individual, fields))
        .collect()
}
