// ==============================================================================
// validator.rs - Input File Validation
// ==============================================================================
// Description: Validates loader inputs (existence, type, format) and hashes the VCF
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-04
// Version: 2.0.0
// Security: Allowlist-only file types, magic number verification
// ==============================================================================

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ValidatedFile {
    pub file_name: String,
    pub hash_sha256: String,
}

pub struct FileValidator {
    allowed_types: HashMap<String, Vec<u8>>,
}

impl FileValidator {
    pub fn new() -> Self {
        let mut allowed_types = HashMap::new();

        // Plain VCF (text, no magic number)
        allowed_types.insert("vcf".to_string(), vec![]);

        // Gzip/BGZF compressed VCF
        allowed_types.insert("vcf.gz".to_string(), vec![0x1f, 0x8b, 0x08]);

        Self { allowed_types }
    }

    /// Check that a required input path exists and is a file
    pub fn require_file(&self, path: &Path, label: &str) -> Result<()> {
        if !path.is_file() {
            anyhow::bail!("{} file does not exist: {}", label, path.display());
        }
        Ok(())
    }

    /// Validate a VCF input and compute its checksum
    pub fn validate_vcf(&self, file_path: &Path) -> Result<ValidatedFile> {
        self.require_file(file_path, "VCF")?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file path"))?
            .to_string_lossy()
            .to_string();

        let metadata = std::fs::metadata(file_path).context("Failed to get file metadata")?;
        info!("Validating file: {} ({} bytes)", file_name, metadata.len());

        // 1. Extension check (allowlist)
        let ext = self.get_extension(&file_name);
        let expected_magic = self.allowed_types.get(&ext).ok_or_else(|| {
            anyhow::anyhow!(
                "Please use the correct suffix of your vcf file ('.vcf/.vcf.gz'), got '{}'",
                file_name
            )
        })?;
        debug!("Extension check passed: {}", ext);

        // 2. Magic number verification
        if !expected_magic.is_empty() {
            let actual_magic = self.read_magic_number(file_path)?;
            if !self.verify_magic_number(expected_magic, &actual_magic) {
                anyhow::bail!("Magic number mismatch for .{} file", ext);
            }
            debug!("Magic number check passed");
        }

        // 3. Content validation (fileformat header)
        self.validate_vcf_format(file_path, &ext)?;
        debug!("Content validation passed");

        // 4. Compute SHA-256 hash
        let hash = self.compute_sha256(file_path)?;
        debug!("SHA-256: {}", hash);

        Ok(ValidatedFile {
            file_name,
            hash_sha256: hash,
        })
    }

    fn get_extension(&self, filename: &str) -> String {
        // Handle compound extension .vcf.gz
        if filename.ends_with(".vcf.gz") {
            return "vcf.gz".to_string();
        }

        match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }

    fn read_magic_number(&self, path: &Path) -> Result<Vec<u8>> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::with_capacity(4);
        file.by_ref().take(4).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn verify_magic_number(&self, expected: &[u8], actual: &[u8]) -> bool {
        expected.len() <= actual.len()
            && expected.iter().zip(actual.iter()).all(|(e, a)| e == a)
    }

    fn validate_vcf_format(&self, path: &Path, ext: &str) -> Result<()> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if ext == "vcf.gz" {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let mut lines = reader.lines();

        // First line should be ##fileformat=VCFv4.x
        let first_line = lines
            .next()
            .ok_or_else(|| anyhow::anyhow!("VCF file is empty"))??;

        if !first_line.starts_with("##fileformat=VCFv4.") {
            anyhow::bail!("Invalid VCF format: missing fileformat header");
        }

        Ok(())
    }

    fn compute_sha256(&self, path: &Path) -> Result<String> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 8192];

        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::{tempdir, Builder};

    #[test]
    fn test_get_extension() {
        let validator = FileValidator::new();
        assert_eq!(validator.get_extension("family.clinical.vcf.gz"), "vcf.gz");
        assert_eq!(validator.get_extension("family.VCF"), "vcf");
        assert_eq!(validator.get_extension("family.bcf"), "bcf");
        assert_eq!(validator.get_extension("family"), "");
    }

    #[test]
    fn test_validate_plain_vcf() {
        let validator = FileValidator::new();
        let mut file = Builder::new().suffix(".vcf").tempfile().unwrap();
        writeln!(file, "##fileformat=VCFv4.2").unwrap();
        file.flush().unwrap();

        let validated = validator.validate_vcf(file.path()).unwrap();
        assert_eq!(validated.file_name, file.path().file_name().unwrap().to_string_lossy());
        assert_eq!(validated.hash_sha256.len(), 64);
    }

    #[test]
    fn test_validate_gzipped_vcf() {
        let validator = FileValidator::new();
        let file = Builder::new().suffix(".vcf.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.1\n").unwrap();
        encoder.finish().unwrap();

        let validated = validator.validate_vcf(file.path()).unwrap();
        assert!(validated.file_name.ends_with(".vcf.gz"));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let validator = FileValidator::new();

        let mut wrong_ext = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(wrong_ext, "##fileformat=VCFv4.2").unwrap();
        assert!(validator.validate_vcf(wrong_ext.path()).is_err());

        let mut not_gz = Builder::new().suffix(".vcf.gz").tempfile().unwrap();
        writeln!(not_gz, "##fileformat=VCFv4.2").unwrap();
        assert!(validator.validate_vcf(not_gz.path()).is_err());

        let mut no_header = Builder::new().suffix(".vcf").tempfile().unwrap();
        writeln!(no_header, "#CHROM\tPOS").unwrap();
        assert!(validator.validate_vcf(no_header.path()).is_err());

        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.vcf");
        assert!(validator.validate_vcf(&missing).is_err());
        assert!(validator.require_file(&missing, "Pedigree").is_err());
    }
}
