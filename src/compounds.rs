// ==============================================================================
// compounds.rs - Compound Linker
// ==============================================================================
// Description: Links a variant to its compound partners within a case
// Author: Matt Barham
// Created: 2026-09-08
// Modified: 2026-09-21
// Version: 1.0.0
// ==============================================================================

use crate::error::LoaderResult;
use crate::identity;
use crate::models::{Compound, VariantType};
use crate::parsers::vcf::RawCallRecord;

/// Compounds of this variant for one case
///
/// `rank_score` of each compound is the combined score minus the variant's
/// own rank score. A missing or non-numeric combined score counts as 0.0.
pub fn link_compounds(
    record: &RawCallRecord,
    case_name: &str,
    case_id: &str,
    variant_type: VariantType,
    own_rank_score: f64,
) -> LoaderResult<Vec<Compound>> {
    let Some(partners) = record.compounds.get(case_name) else {
        return Ok(Vec::new());
    };

    partners
        .iter()
        .map(|partner| {
            let combined_score = partner
                .compound_score
                .as_deref()
                .and_then(|score| score.parse::<f64>().ok())
                .filter(|score| score.is_finite())
                .unwrap_or(0.0);

            Ok(Compound {
                variant: identity::compound_id(&partner.variant_name, variant_type, case_id)?,
                display_name: partner.variant_name.clone(),
                rank_score: combined_score - own_rank_score,
                combined_score,
            })
        })
        .collect()
}
