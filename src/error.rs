// ==============================================================================
// error.rs - Loader Error Kinds
// ==============================================================================
// Description: Errors surfaced by variant assembly and the record store
// Author: Matt Barham
// Created: 2026-09-02
// Modified: 2026-10-09
// Version: 1.1.0
// ==============================================================================

use thiserror::Error;

use crate::parsers::VcfParseError;

/// Errors raised while assembling or persisting variants.
///
/// Missing or malformed per-field annotation data never shows up here; it is
/// recovered where it is read. These variants abort the current record or batch.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Document {document_id} already exists in the variant store")]
    DuplicateIdentity { document_id: String },

    #[error("Bulk insert stored {inserted} variants and rejected {} duplicates", rejected.len())]
    BulkInsertPartialFailure {
        inserted: usize,
        rejected: Vec<String>,
    },

    #[error("Unknown consequence term: '{0}'")]
    UnknownConsequenceTerm(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("VCF error: {0}")]
    Vcf(#[from] VcfParseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LoaderResult<T> = Result<T, LoaderError>;
