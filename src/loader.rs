// ==============================================================================
// loader.rs - Variant Load Job
// ==============================================================================
// Description: End-to-end load of one case: pedigree, VCF, assembly, store
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-10
// Version: 3.0.0
// ==============================================================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::assembler::AssemblyContext;
use crate::case::{build_case, vcf_individuals};
use crate::config::LoaderConfig;
use crate::models::VariantType;
use crate::parsers::{PedParser, VcfReader};
use crate::pipeline::{LoadSummary, PipelineDriver};
use crate::store::{ensure_indexes, VariantStore};
use crate::validator::FileValidator;

/// Inputs of one load
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub vcf: PathBuf,
    pub ped: PathBuf,
    /// Field mapping config (TOML); keys it leaves out take their defaults
    pub config: PathBuf,
    pub institutes: Vec<String>,
    pub variant_type: VariantType,
    /// Records with a rank score at or below this end the load
    pub threshold: f64,
}

/// What a load did
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub case_id: String,
    pub individuals: Vec<String>,
    pub summary: LoadSummary,
    pub indexes: Vec<String>,
}

pub struct VariantLoader {
    request: LoadRequest,
    validator: FileValidator,
}

impl VariantLoader {
    pub fn new(request: LoadRequest) -> Self {
        Self {
            request,
            validator: FileValidator::new(),
        }
    }

    /// Run the load against a store
    pub fn load<S: VariantStore + ?Sized>(&self, store: &mut S) -> Result<LoadReport> {
        let request = &self.request;
        info!(
            "Loading {} variants from {:?} for institutes {}",
            request.variant_type,
            request.vcf,
            request.institutes.join(",")
        );

        // 1. Validate inputs
        let vcf_file = self
            .validator
            .validate_vcf(&request.vcf)
            .context("VCF validation failed")?;
        self.validator.require_file(&request.ped, "Pedigree")?;
        self.validator.require_file(&request.config, "Config")?;

        // 2. Field mapping
        let config = LoaderConfig::from_path(&request.config)
            .with_context(|| format!("Failed to load config {:?}", request.config))?;
        debug!("Config: {:?}", config);

        // 3. Case from pedigree
        let family = PedParser::parse(&request.ped)
            .with_context(|| format!("Failed to parse pedigree {:?}", request.ped))?;
        let case = build_case(
            &family,
            &request.institutes,
            request.variant_type,
            Some(request.vcf.display().to_string()),
            Some(vcf_file.hash_sha256.clone()),
        )?;
        info!("Case found in {:?}: {}", request.ped, case.display_name);

        store.save_case(&case).context("Failed to save case")?;

        // 4. Variants
        let reader = VcfReader::from_path(&request.vcf).context("Failed to open VCF")?;
        let individuals = vcf_individuals(&case, reader.sample_names());
        let ctx = AssemblyContext::new(&case, request.variant_type, individuals.clone(), &config)?;

        let started = Instant::now();
        let summary = PipelineDriver::new(request.threshold)
            .run(reader, &ctx, store)
            .context("Variant load aborted")?;
        info!(
            "{} variants inserted in {:.1?} (stopped early: {}, ordering violations: {})",
            summary.emitted,
            started.elapsed(),
            summary.stopped_early,
            summary.ordering_violations
        );

        // 5. Indexes
        info!("Updating indexes...");
        let indexes = ensure_indexes(store).context("Failed to create indexes")?;

        Ok(LoadReport {
            case_id: case.case_id,
            individuals,
            summary,
            indexes,
        })
    }
}
