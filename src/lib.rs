// ==============================================================================
// lib.rs - Variant Loader Library
// ==============================================================================
// Description: Library interface for variant annotation and loading modules
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-10
// Version: 2.0.0
// ==============================================================================

pub mod assembler;
pub mod case;
pub mod compounds;
pub mod config;
pub mod error;
pub mod frequency;
pub mod genes;
pub mod genotype;
pub mod identity;
pub mod loader;
pub mod models;
pub mod omim;
pub mod parsers;
pub mod pipeline;
pub mod severity;
pub mod store;
pub mod transcript;
pub mod validator;

pub use error::{LoaderError, LoaderResult};
