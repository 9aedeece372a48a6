// ==============================================================================
// omim.rs - OMIM Merger
// ==============================================================================
// Description: Attaches OMIM gene entries and phenotypes to aggregated genes
// Author: Matt Barham
// Created: 2026-09-06
// Modified: 2026-09-06
// Version: 1.0.0
// ==============================================================================
// INFO formats:
//   OMIM_morbid              = ABC1:154700,XYZ:600001
//   Phenotypic_disease_model = ABC1:154700>AR/AD|154701
// Genes not hit by the variant are ignored.
// ==============================================================================

use tracing::debug;

use crate::genes::GeneTable;
use crate::models::OmimPhenotype;

pub const OMIM_MORBID_KEY: &str = "OMIM_morbid";
pub const DISEASE_MODEL_KEY: &str = "Phenotypic_disease_model";

/// Set `omim_gene_entry` from `symbol:id` values
pub fn merge_gene_entries(genes: &mut GeneTable, values: Option<&[String]>) {
    for value in values.unwrap_or(&[]) {
        let Some((symbol, id)) = value.split_once(':') else {
            continue;
        };
        let Ok(id) = id.parse::<u32>() else {
            debug!("Ignoring non-numeric OMIM id '{}' for {}", id, symbol);
            continue;
        };
        if let Some(gene) = genes.get_mut(symbol) {
            gene.omim_gene_entry = Some(id);
        }
    }
}

/// Append phenotypes from `symbol:id>model/model|id` values
pub fn merge_phenotypes(genes: &mut GeneTable, values: Option<&[String]>) {
    for value in values.unwrap_or(&[]) {
        let Some((symbol, entries)) = value.split_once(':') else {
            continue;
        };
        let Some(gene) = genes.get_mut(symbol) else {
            continue;
        };

        for entry in entries.split('|') {
            let (id, models) = match entry.split_once('>') {
                Some((id, models)) => (id, models.split('/').map(str::to_string).collect()),
                None => (entry, Vec::new()),
            };
            match id.parse::<u32>() {
                Ok(omim_id) => gene.omim_phenotypes.push(OmimPhenotype {
                    omim_id,
                    disease_models: models,
                }),
                Err(_) => debug!("Ignoring non-numeric OMIM phenotype '{}' for {}", id, symbol),
            }
        }
    }
}
