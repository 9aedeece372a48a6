// ==============================================================================
// severity.rs - Consequence Severity Table
// ==============================================================================
// Description: Sequence Ontology consequence terms ranked by severity
// Author: Matt Barham
// Created: 2026-09-03
// Modified: 2026-09-03
// Version: 1.0.0
// ==============================================================================
// References:
// - Ensembl VEP calculated consequences:
//   https://www.ensembl.org/info/genome/variation/prediction/predicted_data.html
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LoaderError, LoaderResult};

/// Best rank a gene starts from before any transcript is seen
pub const SENTINEL_RANK: u8 = 40;

/// Genomic region category derived from a consequence term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "exonic")]
    Exonic,
    #[serde(rename = "splicing")]
    Splicing,
    #[serde(rename = "ncRNA_exonic")]
    NcRnaExonic,
    #[serde(rename = "intronic")]
    Intronic,
    #[serde(rename = "ncRNA")]
    NcRna,
    #[serde(rename = "upstream")]
    Upstream,
    #[serde(rename = "downstream")]
    Downstream,
    #[serde(rename = "5UTR")]
    FivePrimeUtr,
    #[serde(rename = "3UTR")]
    ThreePrimeUtr,
    #[serde(rename = "TFBS")]
    Tfbs,
    #[serde(rename = "regulatory_region")]
    RegulatoryRegion,
    #[serde(rename = "genomic_feature")]
    GenomicFeature,
    #[serde(rename = "intergenic_variant")]
    Intergenic,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Exonic => "exonic",
            Region::Splicing => "splicing",
            Region::NcRnaExonic => "ncRNA_exonic",
            Region::Intronic => "intronic",
            Region::NcRna => "ncRNA",
            Region::Upstream => "upstream",
            Region::Downstream => "downstream",
            Region::FivePrimeUtr => "5UTR",
            Region::ThreePrimeUtr => "3UTR",
            Region::Tfbs => "TFBS",
            Region::RegulatoryRegion => "regulatory_region",
            Region::GenomicFeature => "genomic_feature",
            Region::Intergenic => "intergenic_variant",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single consequence term (lower rank = more severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Severity {
    pub rank: u8,
    pub region: Region,
}

const fn sev(rank: u8, region: Region) -> Severity {
    Severity { rank, region }
}

/// Every term the upstream annotator can emit
pub const SO_TERMS: &[(&str, Severity)] = &[
    ("transcript_ablation", sev(1, Region::Exonic)),
    ("splice_donor_variant", sev(2, Region::Splicing)),
    ("splice_acceptor_variant", sev(3, Region::Splicing)),
    ("stop_gained", sev(4, Region::Exonic)),
    ("frameshift_variant", sev(5, Region::Exonic)),
    ("stop_lost", sev(6, Region::Exonic)),
    ("initiator_codon_variant", sev(7, Region::Exonic)),
    ("inframe_insertion", sev(8, Region::Exonic)),
    ("inframe_deletion", sev(9, Region::Exonic)),
    ("missense_variant", sev(10, Region::Exonic)),
    ("transcript_amplification", sev(11, Region::Exonic)),
    ("splice_region_variant", sev(12, Region::Splicing)),
    ("incomplete_terminal_codon_variant", sev(13, Region::Exonic)),
    ("synonymous_variant", sev(14, Region::Exonic)),
    ("stop_retained_variant", sev(15, Region::Exonic)),
    ("coding_sequence_variant", sev(17, Region::Exonic)),
    ("mature_miRNA_variant", sev(18, Region::NcRnaExonic)),
    ("5_prime_UTR_variant", sev(19, Region::FivePrimeUtr)),
    ("3_prime_UTR_variant", sev(20, Region::ThreePrimeUtr)),
    ("non_coding_transcript_exon_variant", sev(21, Region::NcRnaExonic)),
    ("non_coding_exon_variant", sev(21, Region::NcRnaExonic)),
    ("non_coding_transcript_variant", sev(22, Region::NcRnaExonic)),
    ("nc_transcript_variant", sev(22, Region::NcRnaExonic)),
    ("intron_variant", sev(23, Region::Intronic)),
    ("NMD_transcript_variant", sev(24, Region::NcRna)),
    ("upstream_gene_variant", sev(25, Region::Upstream)),
    ("downstream_gene_variant", sev(26, Region::Downstream)),
    ("TFBS_ablation", sev(27, Region::Tfbs)),
    ("TFBS_amplification", sev(28, Region::Tfbs)),
    ("TF_binding_site_variant", sev(29, Region::Tfbs)),
    ("regulatory_region_ablation", sev(30, Region::RegulatoryRegion)),
    ("regulatory_region_amplification", sev(31, Region::RegulatoryRegion)),
    ("regulatory_region_variant", sev(33, Region::RegulatoryRegion)),
    ("feature_elongation", sev(34, Region::GenomicFeature)),
    ("feature_truncation", sev(35, Region::GenomicFeature)),
    ("intergenic_variant", sev(36, Region::Intergenic)),
];

/// Look up a consequence term
///
/// The vocabulary is closed: a term missing from [`SO_TERMS`] is an error,
/// not a default.
pub fn lookup(term: &str) -> LoaderResult<Severity> {
    SO_TERMS
        .iter()
        .find(|(name, _)| *name == term)
        .map(|(_, severity)| *severity)
        .ok_or_else(|| LoaderError::UnknownConsequenceTerm(term.to_string()))
}
