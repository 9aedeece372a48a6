// ==============================================================================
// genes.rs - Gene Aggregator
// ==============================================================================
// Description: Groups transcripts by gene and tracks the most severe consequence
// Author: Matt Barham
// Created: 2026-09-04
// Modified: 2026-10-01
// Version: 1.0.0
// ==============================================================================
// Rules:
//   - transcripts are visited in annotator order
//   - a gene starts at SENTINEL_RANK; best_rank only ever decreases
//   - only a strictly lower rank moves the most severe pointer (ties keep
//     the first transcript seen)
// ==============================================================================

use indexmap::IndexMap;
use tracing::debug;

use crate::error::LoaderResult;
use crate::models::{GeneAnnotation, TranscriptAnnotation};
use crate::severity::{self, SENTINEL_RANK};

/// Genes of one variant keyed by symbol, in first-appearance order
pub type GeneTable = IndexMap<String, GeneAnnotation>;

fn new_gene(hgnc_symbol: &str, first_transcript: &str) -> GeneAnnotation {
    GeneAnnotation {
        hgnc_symbol: hgnc_symbol.to_string(),
        transcripts: IndexMap::new(),
        most_severe_transcript: first_transcript.to_string(),
        best_rank: SENTINEL_RANK,
        functional_annotation: None,
        region_annotation: None,
        sift_prediction: None,
        polyphen_prediction: None,
        omim_gene_entry: None,
        omim_phenotypes: Vec::new(),
    }
}

/// Group transcripts into genes
///
/// Transcripts without a gene symbol are dropped. A transcript id seen twice
/// for the same gene replaces the earlier entry.
pub fn aggregate_genes(transcripts: Vec<TranscriptAnnotation>) -> LoaderResult<GeneTable> {
    let mut genes = GeneTable::new();

    for transcript in transcripts {
        if transcript.hgnc_symbol.is_empty() {
            debug!("Skipping transcript {} without gene symbol", transcript.transcript_id);
            continue;
        }

        let gene = genes
            .entry(transcript.hgnc_symbol.clone())
            .or_insert_with(|| new_gene(&transcript.hgnc_symbol, &transcript.transcript_id));

        for term in &transcript.functional_annotations {
            let rank = severity::lookup(term)?.rank;
            if rank < gene.best_rank {
                gene.best_rank = rank;
                gene.most_severe_transcript = transcript.transcript_id.clone();
                gene.functional_annotation = Some(term.clone());
            }
        }

        gene.transcripts
            .insert(transcript.transcript_id.clone(), transcript);
    }

    Ok(genes)
}

/// Fill the fields derived from the most severe transcript and emit genes in order
pub fn finalize_genes(genes: GeneTable) -> LoaderResult<Vec<GeneAnnotation>> {
    genes
        .into_values()
        .map(|mut gene| {
            if let Some(term) = &gene.functional_annotation {
                gene.region_annotation = Some(severity::lookup(term)?.region);
            }
            let predictions = gene
                .most_severe()
                .map(|t| (t.sift_prediction.clone(), t.polyphen_prediction.clone()));
            if let Some((sift, polyphen)) = predictions {
                gene.sift_prediction = sift;
                gene.polyphen_prediction = polyphen;
            }
            Ok(gene)
        })
        .collect()
}
