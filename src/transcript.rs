// ==============================================================================
// transcript.rs - Transcript Annotator
// ==============================================================================
// Description: Converts one VEP consequence entry into a TranscriptAnnotation
// Author: Matt Barham
// Created: 2026-09-04
// Modified: 2026-09-29
// Version: 1.0.1
// ==============================================================================

use std::collections::HashMap;

use crate::error::LoaderResult;
use crate::models::TranscriptAnnotation;
use crate::parsers::vcf::VepEntry;
use crate::severity;

/// INFO key holding the Ensembl -> RefSeq transcript mapping
pub const REFSEQ_INFO_KEY: &str = "Ensembl_transcript_to_refseq_transcript";

/// Ensembl transcript id -> RefSeq ids
pub type RefSeqTable = HashMap<String, Vec<String>>;

/// Build the RefSeq lookup from the mapping INFO values
///
/// Values look like `ABC1:ENST01>NM_001/NM_002|ENST02>NM_003`; the
/// `gene:` prefix is optional. Entries without `>` are skipped.
pub fn refseq_table(values: Option<&[String]>) -> RefSeqTable {
    let mut table = RefSeqTable::new();

    for value in values.unwrap_or(&[]) {
        let body = match value.split_once(':') {
            Some((_, body)) => body,
            None => value.as_str(),
        };

        for entry in body.split('|') {
            if let Some((ensembl_id, refseq_ids)) = entry.split_once('>') {
                table.insert(
                    ensembl_id.to_string(),
                    refseq_ids.split('/').map(str::to_string).collect(),
                );
            }
        }
    }

    table
}

fn non_empty(entry: &VepEntry, key: &str) -> Option<String> {
    entry
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
}

/// `ENST01.1:c.123A>G` -> `c.123A>G`; values without `:` give nothing
fn sequence_name(entry: &VepEntry, key: &str) -> Option<String> {
    let value = entry.get(key)?;
    let segments: Vec<&str> = value.split(':').collect();
    match segments.as_slice() {
        [_, .., last] if !last.is_empty() => Some(last.to_string()),
        _ => None,
    }
}

/// Annotate a single transcript
///
/// Fails with `UnknownConsequenceTerm` when any consequence term is outside
/// the severity table; an absent or empty Consequence counts as the term "".
pub fn annotate_transcript(
    entry: &VepEntry,
    refseq: &RefSeqTable,
) -> LoaderResult<TranscriptAnnotation> {
    let transcript_id = entry
        .get("Feature")
        .and_then(|feature| feature.split(':').next())
        .unwrap_or_default()
        .to_string();

    let hgnc_symbol = entry
        .get("SYMBOL")
        .and_then(|symbol| symbol.split('.').next())
        .unwrap_or_default()
        .to_string();

    let mut transcript = TranscriptAnnotation {
        refseq_ids: refseq.get(&transcript_id).cloned().unwrap_or_default(),
        transcript_id,
        hgnc_symbol,
        protein_id: non_empty(entry, "ENSP"),
        sift_prediction: non_empty(entry, "SIFT"),
        polyphen_prediction: non_empty(entry, "PolyPhen"),
        swiss_prot: non_empty(entry, "SWISSPROT"),
        coding_sequence_name: sequence_name(entry, "HGVSc"),
        protein_sequence_name: sequence_name(entry, "HGVSp"),
        biotype: non_empty(entry, "BIOTYPE"),
        exon: non_empty(entry, "EXON"),
        intron: non_empty(entry, "INTRON"),
        ..Default::default()
    };

    if let Some(domains) = non_empty(entry, "DOMAINS") {
        for domain in domains.split('&') {
            let Some((name, id)) = domain.split_once(':') else {
                continue;
            };
            match name {
                "Pfam_domain" => transcript.pfam_domain = Some(id.to_string()),
                "PROSITE_profiles" => transcript.prosite_profile = Some(id.to_string()),
                "SMART_domains" => transcript.smart_domain = Some(id.to_string()),
                _ => {}
            }
        }
    }

    transcript.strand = match entry.get("STRAND").map(String::as_str) {
        Some("1") => Some("+".to_string()),
        Some("-1") => Some("-".to_string()),
        _ => None,
    };

    let consequence = entry.get("Consequence").map(String::as_str).unwrap_or("");
    for term in consequence.split('&') {
        let severity = severity::lookup(term)?;
        transcript.functional_annotations.push(term.to_string());
        transcript.region_annotations.push(severity.region);
    }

    Ok(transcript)
}
