// ==============================================================================
// identity.rs - Content-Addressed Identities
// ==============================================================================
// Description: MD5 keys for variants, case documents, compounds and submodels
// Author: Matt Barham
// Created: 2026-09-02
// Modified: 2026-09-18
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   key = hex(md5(fields.join(" ")))
//   The same ordered fields always give the same 32-character key.
// ==============================================================================

use md5::{Digest, Md5};

use crate::error::{LoaderError, LoaderResult};
use crate::models::VariantType;

/// Generate an MD5 key from an ordered list of fields
///
/// # Arguments
/// * `fields` - Ordered string fields, joined by a single space before hashing
///
/// # Returns
/// * `Ok(String)` - Lowercase 32-character hex digest
/// * `Err(LoaderError::InvalidArgument)` - No fields were given
///
/// # Example
/// ```
/// use variant_loader::identity::generate_md5_key;
///
/// let key = generate_md5_key(&["1", "880086", "T", "C", "clinical"]).unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub fn generate_md5_key<S: AsRef<str>>(fields: &[S]) -> LoaderResult<String> {
    if fields.is_empty() {
        return Err(LoaderError::InvalidArgument(
            "cannot generate a key from an empty field list".to_string(),
        ));
    }

    let mut hasher = Md5::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            hasher.update(b" ");
        }
        hasher.update(field.as_ref().as_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Fields that identify a genomic change independent of any case
pub fn variant_fields(
    chromosome: &str,
    position: u64,
    reference: &str,
    alternative: &str,
    variant_type: VariantType,
) -> Vec<String> {
    vec![
        chromosome.to_string(),
        position.to_string(),
        reference.to_string(),
        alternative.to_string(),
        variant_type.as_str().to_string(),
    ]
}

/// `variant_id`: shared by every case that carries the same change
pub fn variant_id(fields: &[String]) -> LoaderResult<String> {
    generate_md5_key(fields)
}

/// `document_id`: variant fields followed by the `_`-separated case id parts
pub fn document_id(fields: &[String], case_id: &str) -> LoaderResult<String> {
    let mut all: Vec<&str> = fields.iter().map(String::as_str).collect();
    all.extend(case_id.split('_'));
    generate_md5_key(&all)
}

/// Identity of a compound partner
///
/// Compound names look like `1_880086_T_C`. Splitting on `_` and appending the
/// variant type and case id parts reproduces the partner's `document_id`.
pub fn compound_id(
    compound_name: &str,
    variant_type: VariantType,
    case_id: &str,
) -> LoaderResult<String> {
    let mut all: Vec<&str> = compound_name.split('_').collect();
    all.push(variant_type.as_str());
    all.extend(case_id.split('_'));
    generate_md5_key(&all)
}

/// Key of a phenotype submodel within a phenotype model
pub fn phenotype_submodel_id(model_id: &str, submodel_title: &str) -> LoaderResult<String> {
    generate_md5_key(&[model_id, submodel_title])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            generate_md5_key(&["a", "b"]).unwrap(),
            "0cc9cd4dd26c5137b675a0d819cb9ab0"
        );
        assert_eq!(
            generate_md5_key(&["abc"]).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );

        let fields = variant_fields("1", 880086, "T", "C", VariantType::Clinical);
        assert_eq!(
            variant_id(&fields).unwrap(),
            "d5cb8f4ed04b9496408b77d72c991fe9"
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        let fields = variant_fields("1", 880086, "T", "C", VariantType::Clinical);
        let first = variant_id(&fields).unwrap();
        let second = variant_id(&fields).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_any_field_change_changes_key() {
        let base = variant_fields("1", 880086, "T", "C", VariantType::Clinical);
        let base_key = variant_id(&base).unwrap();

        let variants = [
            variant_fields("2", 880086, "T", "C", VariantType::Clinical),
            variant_fields("1", 880087, "T", "C", VariantType::Clinical),
            variant_fields("1", 880086, "G", "C", VariantType::Clinical),
            variant_fields("1", 880086, "T", "A", VariantType::Clinical),
            variant_fields("1", 880086, "T", "C", VariantType::Research),
        ];
        for fields in variants {
            assert_ne!(variant_id(&fields).unwrap(), base_key, "{:?}", fields);
        }
    }

    #[test]
    fn test_document_id_depends_on_case() {
        let fields = variant_fields("1", 880086, "T", "C", VariantType::Clinical);
        let a = document_id(&fields, "CMMS_fam1").unwrap();
        let b = document_id(&fields, "CMMS_fam2").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, variant_id(&fields).unwrap());

        let expected =
            generate_md5_key(&["1", "880086", "T", "C", "clinical", "CMMS", "fam1"]).unwrap();
        assert_eq!(a, expected);
    }

    #[test]
    fn test_compound_id_matches_partner_document_id() {
        let partner = variant_fields("1", 880087, "A", "G", VariantType::Clinical);
        let partner_document = document_id(&partner, "CMMS_fam1").unwrap();

        let linked = compound_id("1_880087_A_G", VariantType::Clinical, "CMMS_fam1").unwrap();
        assert_eq!(linked, partner_document);
    }

    #[test]
    fn test_phenotype_submodel_id() {
        let id = phenotype_submodel_id("model1", "Seizures").unwrap();
        assert_eq!(id, generate_md5_key(&["model1", "Seizures"]).unwrap());
    }

    #[test]
    fn test_empty_field_list_is_invalid() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            generate_md5_key(&empty),
            Err(LoaderError::InvalidArgument(_))
        ));
    }
}
