// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for annotated VCF and pedigree files
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-09-12
// Version: 2.0.0
// ==============================================================================

pub mod ped;
pub mod vcf;

pub use ped::{PedFamily, PedParseError, PedParser, PedRecord};
pub use vcf::{RawCallRecord, RawCompound, RawGenotype, VcfHeader, VcfParseError, VcfReader};
