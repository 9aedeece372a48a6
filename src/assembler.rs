// ==============================================================================
// assembler.rs - Variant Assembler
// ==============================================================================
// Description: Builds one canonical Variant from one raw call record
// Author: Matt Barham
// Created: 2026-09-10
// Modified: 2026-10-06
// Version: 1.1.0
// ==============================================================================
// Steps per record:
//   1. identities (variant_id, document_id, display name)
//   2. transcripts -> genes -> OMIM -> derived gene fields
//   3. genotypes, compounds, genetic models
//   4. frequencies, CADD, conservation
// ==============================================================================

use crate::compounds::link_compounds;
use crate::config::{FormatField, InfoKeys, LoaderConfig};
use crate::error::{LoaderError, LoaderResult};
use crate::frequency::annotate_frequencies;
use crate::genes::{aggregate_genes, finalize_genes};
use crate::genotype::extract_genotypes;
use crate::identity;
use crate::models::{Case, Variant, VariantType};
use crate::omim::{self, DISEASE_MODEL_KEY, OMIM_MORBID_KEY};
use crate::parsers::vcf::RawCallRecord;
use crate::transcript::{annotate_transcript, refseq_table, REFSEQ_INFO_KEY};

/// Per-run inputs shared by every record of one load
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    pub case_id: String,
    /// Case display name, the key of genmod's per-case annotations
    pub case_name: String,
    pub variant_type: VariantType,
    /// Individuals present in both the pedigree and the VCF
    pub individuals: Vec<String>,
    pub info_keys: InfoKeys,
    pub genotype_fields: Vec<FormatField>,
}

impl AssemblyContext {
    pub fn new(
        case: &Case,
        variant_type: VariantType,
        individuals: Vec<String>,
        config: &LoaderConfig,
    ) -> LoaderResult<Self> {
        if case.case_id.is_empty() {
            return Err(LoaderError::InvalidArgument("case id is empty".to_string()));
        }

        Ok(Self {
            case_id: case.case_id.clone(),
            case_name: case.display_name.clone(),
            variant_type,
            individuals,
            info_keys: config.info.clone(),
            genotype_fields: config.genotype_fields(),
        })
    }
}

/// Assemble the variant at `variant_rank` (1-based) from a record
pub fn assemble_variant(
    record: &RawCallRecord,
    ctx: &AssemblyContext,
    variant_rank: usize,
) -> LoaderResult<Variant> {
    let id_fields = identity::variant_fields(
        &record.chromosome,
        record.position,
        &record.reference,
        &record.alternative,
        ctx.variant_type,
    );
    let variant_id = identity::variant_id(&id_fields)?;
    let document_id = identity::document_id(&id_fields, &ctx.case_id)?;
    let display_name = id_fields.join("_");

    let rank_score = record.rank_score(&ctx.case_name);

    let refseq = refseq_table(record.info_values(REFSEQ_INFO_KEY));
    let transcripts = record
        .transcripts
        .iter()
        .map(|entry| annotate_transcript(entry, &refseq))
        .collect::<LoaderResult<Vec<_>>>()?;

    let mut gene_table = aggregate_genes(transcripts)?;
    omim::merge_gene_entries(&mut gene_table, record.info_values(OMIM_MORBID_KEY));
    omim::merge_phenotypes(&mut gene_table, record.info_values(DISEASE_MODEL_KEY));
    let genes = finalize_genes(gene_table)?;
    let hgnc_symbols = genes.iter().map(|g| g.hgnc_symbol.clone()).collect();

    let scores = annotate_frequencies(record, &ctx.info_keys);

    Ok(Variant {
        document_id,
        variant_id,
        variant_type: ctx.variant_type,
        case_id: ctx.case_id.clone(),
        display_name,
        chromosome: record.chromosome.clone(),
        position: record.position,
        reference: record.reference.clone(),
        alternative: record.alternative.clone(),
        variant_rank,
        quality: record.quality,
        filters: record.filters.clone(),
        gene_lists: record
            .info_values(&ctx.info_keys.gene_lists)
            .map(<[String]>::to_vec),
        rank_score,
        samples: extract_genotypes(record, &ctx.individuals, &ctx.genotype_fields),
        compounds: link_compounds(
            record,
            &ctx.case_name,
            &ctx.case_id,
            ctx.variant_type,
            rank_score,
        )?,
        genetic_models: record
            .genetic_models
            .get(&ctx.case_name)
            .cloned()
            .unwrap_or_default(),
        genes,
        hgnc_symbols,
        ensembl_gene_ids: record
            .info_values(&ctx.info_keys.ensembl_gene_id)
            .map(<[String]>::to_vec)
            .unwrap_or_default(),
        db_snp_ids: record.ids.split(';').map(str::to_string).collect(),
        thousand_genomes_frequency: scores.thousand_genomes_frequency,
        exac_frequency: scores.exac_frequency,
        cadd_score: scores.cadd_score,
        gerp_conservation: scores.gerp_conservation,
        phast_conservation: scores.phast_conservation,
        phylop_conservation: scores.phylop_conservation,
        local_frequency: None,
    })
}
