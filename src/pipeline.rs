// ==============================================================================
// pipeline.rs - Pipeline Driver
// ==============================================================================
// Description: Rank-ordered iteration with threshold cutoff and store hand-off
// Author: Matt Barham
// Created: 2026-09-11
// Modified: 2026-10-08
// Version: 1.2.0
// ==============================================================================
// The input stream is expected in non-increasing rank score order. The first
// record whose case rank score is not strictly above the threshold ends the
// run; nothing after it is read.
// ==============================================================================

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assembler::{assemble_variant, AssemblyContext};
use crate::error::LoaderResult;
use crate::parsers::vcf::{RawCallRecord, VcfParseError};
use crate::store::VariantStore;

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Scanning,
    Done,
}

/// Outcome of one driver run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Variants assembled and stored
    pub emitted: usize,
    /// True when a record at or below the threshold ended the run
    pub stopped_early: bool,
    /// Records whose rank score was above the previous one
    pub ordering_violations: usize,
}

/// Drives records through assembly into a store
#[derive(Debug)]
pub struct PipelineDriver {
    threshold: f64,
    state: DriverState,
    next_rank: usize,
    last_score: Option<f64>,
    summary: LoadSummary,
}

impl PipelineDriver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: DriverState::Scanning,
            next_rank: 1,
            last_score: None,
            summary: LoadSummary::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Decide whether a record with this rank score is emitted
    ///
    /// # Returns
    /// * `Some(rank)` - 1-based rank to give the variant
    /// * `None` - The driver is done; this and every later record is dropped
    pub fn admit(&mut self, rank_score: f64) -> Option<usize> {
        if self.state == DriverState::Done {
            return None;
        }

        if rank_score.is_nan() || rank_score <= self.threshold {
            debug!(
                "Rank score {} is not above threshold {}, stopping",
                rank_score, self.threshold
            );
            self.state = DriverState::Done;
            self.summary.stopped_early = true;
            return None;
        }

        if let Some(previous) = self.last_score {
            if rank_score > previous {
                warn!(
                    "Rank score {} follows {}; input is not sorted by rank score",
                    rank_score, previous
                );
                self.summary.ordering_violations += 1;
            }
        }
        self.last_score = Some(rank_score);

        let rank = self.next_rank;
        self.next_rank += 1;
        self.summary.emitted += 1;
        Some(rank)
    }

    /// Assemble and store every admitted record
    ///
    /// Each variant is stored before the next record is read; variants stored
    /// before an error stay in the store.
    pub fn run<I, S>(
        &mut self,
        records: I,
        ctx: &AssemblyContext,
        store: &mut S,
    ) -> LoaderResult<LoadSummary>
    where
        I: IntoIterator<Item = Result<RawCallRecord, VcfParseError>>,
        S: VariantStore + ?Sized,
    {
        for record in records {
            let record = record?;
            let Some(rank) = self.admit(record.rank_score(&ctx.case_name)) else {
                break;
            };

            let variant = assemble_variant(&record, ctx, rank)?;
            store.insert(&variant)?;

            if rank % 1000 == 0 {
                info!("{} variants loaded", rank);
            }
        }

        self.state = DriverState::Done;
        Ok(self.summary.clone())
    }
}
