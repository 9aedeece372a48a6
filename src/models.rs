// ==============================================================================
// models.rs - Variant Document Models
// ==============================================================================
// Description: Canonical variant, gene, transcript and case documents
// Author: Matt Barham
// Created: 2025-11-12
// Modified: 2026-10-09
// Version: 3.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::severity::Region;

/// Which analysis a set of variants belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    /// Variants restricted to the clinical gene panels
    Clinical,
    /// Full research set
    Research,
}

impl VariantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Clinical => "clinical",
            VariantType::Research => "research",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clinical" => Ok(VariantType::Clinical),
            "research" => Ok(VariantType::Research),
            other => Err(format!(
                "invalid variant type '{}' (expected clinical or research)",
                other
            )),
        }
    }
}

/// OMIM phenotype linked to a gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmimPhenotype {
    /// OMIM phenotype number
    pub omim_id: u32,
    /// Inheritance patterns, e.g. "AR", "AD", "XR"
    pub disease_models: Vec<String>,
}

/// Per-transcript consequence annotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAnnotation {
    pub transcript_id: String,
    pub hgnc_symbol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refseq_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sift_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyphen_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swiss_prot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pfam_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prosite_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding_sequence_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_sequence_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biotype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intron: Option<String>,
    /// "+" or "-"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strand: Option<String>,
    /// Consequence terms in annotator order
    pub functional_annotations: Vec<String>,
    /// One region per consequence term
    pub region_annotations: Vec<Region>,
}

/// All transcripts of one gene hit by a variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneAnnotation {
    pub hgnc_symbol: String,
    /// Keyed by transcript id, in first-seen order
    pub transcripts: IndexMap<String, TranscriptAnnotation>,
    /// Key into `transcripts`
    pub most_severe_transcript: String,
    /// Lowest severity rank seen across all transcripts
    pub best_rank: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functional_annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_annotation: Option<Region>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sift_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyphen_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omim_gene_entry: Option<u32>,
    #[serde(default)]
    pub omim_phenotypes: Vec<OmimPhenotype>,
}

impl GeneAnnotation {
    /// The transcript `most_severe_transcript` points at
    pub fn most_severe(&self) -> Option<&TranscriptAnnotation> {
        self.transcripts.get(&self.most_severe_transcript)
    }
}

/// Genotype call for one individual at a variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenotypeCall {
    pub sample: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genotype_call: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_depth: Option<u32>,
    /// (reference depth, alternative depth)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allele_depths: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genotype_quality: Option<f64>,
}

/// Reference to a variant that co-segregates with this one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    /// `document_id` of the partner variant
    pub variant: String,
    pub display_name: String,
    /// combined_score minus this variant's own rank score
    pub rank_score: f64,
    pub combined_score: f64,
}

/// Canonical variant document, one per case, variant and type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub document_id: String,
    pub variant_id: String,
    pub variant_type: VariantType,
    pub case_id: String,
    pub display_name: String,

    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternative: String,

    /// 1-based order within the case
    pub variant_rank: usize,
    pub quality: Option<f64>,
    pub filters: Vec<String>,
    pub gene_lists: Option<Vec<String>>,
    pub rank_score: f64,

    pub samples: Vec<GenotypeCall>,
    pub compounds: Vec<Compound>,
    pub genetic_models: Vec<String>,

    pub genes: Vec<GeneAnnotation>,
    pub hgnc_symbols: Vec<String>,
    pub ensembl_gene_ids: Vec<String>,
    pub db_snp_ids: Vec<String>,

    pub thousand_genomes_frequency: Option<f64>,
    pub exac_frequency: Option<f64>,
    pub cadd_score: f64,
    pub gerp_conservation: Vec<String>,
    pub phast_conservation: Vec<String>,
    pub phylop_conservation: Vec<String>,

    /// Share of cases carrying this `variant_id`; set by the maintenance pass
    #[serde(default)]
    pub local_frequency: Option<f64>,
}

/// Individual of a case, as read from the pedigree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub individual_id: String,
    pub display_name: String,
    pub father: String,
    pub mother: String,
    pub sex: String,
    pub phenotype: String,
}

/// A family analysed by one or more institutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    pub display_name: String,
    pub institutes: Vec<String>,
    pub individuals: Vec<Individual>,
    pub default_gene_lists: Vec<String>,
    pub is_research: bool,
    pub vcf_file: Option<String>,
    pub vcf_checksum: Option<String>,
    pub updated_at: DateTime<Utc>,
}
