// ==============================================================================
// config.rs - Loader Configuration
// ==============================================================================
// Description: TOML mapping of logical annotation names to VCF INFO/FORMAT keys
// Author: Matt Barham
// Created: 2026-09-05
// Modified: 2026-10-02
// Version: 1.1.0
// ==============================================================================
// Example:
//   [info]
//   GeneLists = "Clinical_db_gene_annotation"
//   1000GMAF = "1000GAF"
//   CADD = "CADD"
//
//   [genotype]
//   Genotype = "GT"
//   ReadDepth = "DP"
// ==============================================================================

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// INFO keys for each logical annotation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfoKeys {
    #[serde(rename = "GeneLists")]
    pub gene_lists: String,
    #[serde(rename = "Ensembl_gene_id")]
    pub ensembl_gene_id: String,
    #[serde(rename = "1000GMAF")]
    pub thousand_genomes: String,
    #[serde(rename = "EXAC")]
    pub exac: String,
    #[serde(rename = "CADD")]
    pub cadd: String,
    #[serde(rename = "Gerp")]
    pub gerp: String,
    #[serde(rename = "PhastCons")]
    pub phast_cons: String,
    #[serde(rename = "PhylopCons")]
    pub phylop_cons: String,
}

impl Default for InfoKeys {
    fn default() -> Self {
        Self {
            gene_lists: "Clinical_db_gene_annotation".to_string(),
            ensembl_gene_id: "Ensembl_gene_id".to_string(),
            thousand_genomes: "1000GAF".to_string(),
            exac: "ExACAF".to_string(),
            cadd: "CADD".to_string(),
            gerp: "GERP++_RS_prediction_term".to_string(),
            phast_cons: "phastCons100way_vertebrate_prediction_term".to_string(),
            phylop_cons: "phyloP100way_vertebrate_prediction_term".to_string(),
        }
    }
}

/// FORMAT fields the genotype extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatField {
    /// GT
    Genotype,
    /// DP
    ReadDepth,
    /// AD
    AlleleDepths,
    /// GQ
    GenotypeQuality,
}

impl FormatField {
    /// Map a raw FORMAT key to a known field
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "GT" => Some(FormatField::Genotype),
            "DP" => Some(FormatField::ReadDepth),
            "AD" => Some(FormatField::AlleleDepths),
            "GQ" => Some(FormatField::GenotypeQuality),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            FormatField::Genotype => "GT",
            FormatField::ReadDepth => "DP",
            FormatField::AlleleDepths => "AD",
            FormatField::GenotypeQuality => "GQ",
        }
    }
}

fn default_genotype_fields() -> BTreeMap<String, String> {
    [
        ("Genotype", "GT"),
        ("ReadDepth", "DP"),
        ("AlleleDepths", "AD"),
        ("GenotypeQuality", "GQ"),
    ]
    .into_iter()
    .map(|(name, key)| (name.to_string(), key.to_string()))
    .collect()
}

/// Field mapping configuration for one load
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub info: InfoKeys,
    /// Logical genotype name -> raw FORMAT key
    pub genotype: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            info: InfoKeys::default(),
            genotype: default_genotype_fields(),
        }
    }
}

impl LoaderConfig {
    /// Read and parse a TOML config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Resolve the genotype mapping into the known FORMAT fields
    ///
    /// Each field appears at most once, in the order the mapping lists them.
    pub fn genotype_fields(&self) -> Vec<FormatField> {
        let mut fields = Vec::new();
        for (name, key) in &self.genotype {
            match FormatField::from_key(key) {
                Some(field) if !fields.contains(&field) => fields.push(field),
                Some(_) => {}
                None => debug!("Ignoring genotype field {} -> {}", name, key),
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.info.cadd, "CADD");
        assert_eq!(config.info.gene_lists, "Clinical_db_gene_annotation");
        assert_eq!(config.genotype_fields().len(), 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LoaderConfig::from_toml(
            r#"
[info]
1000GMAF = "1000G_AF"
CADD = "CADD_PHRED"
"#,
        )
        .unwrap();

        assert_eq!(config.info.thousand_genomes, "1000G_AF");
        assert_eq!(config.info.cadd, "CADD_PHRED");
        assert_eq!(config.info.exac, "ExACAF");
        assert_eq!(config.genotype, default_genotype_fields());
    }

    #[test]
    fn test_unknown_genotype_keys_are_ignored() {
        let config = LoaderConfig::from_toml(
            r#"
[genotype]
Genotype = "GT"
Phase = "PS"
Depth = "DP"
"#,
        )
        .unwrap();

        let fields = config.genotype_fields();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&FormatField::Genotype));
        assert!(fields.contains(&FormatField::ReadDepth));
        assert!(!fields.contains(&FormatField::AlleleDepths));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[info]\nEXAC = \"EXAC_AF\"").unwrap();

        let config = LoaderConfig::from_path(file.path()).unwrap();
        assert_eq!(config.info.exac, "EXAC_AF");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            LoaderConfig::from_toml("[info\nCADD = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
