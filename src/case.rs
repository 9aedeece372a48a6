// ==============================================================================
// case.rs - Case Provider
// ==============================================================================
// Description: Builds a Case from a pedigree and matches it against VCF samples
// Author: Matt Barham
// Created: 2026-09-12
// Modified: 2026-10-03
// Version: 1.0.0
// ==============================================================================

use chrono::Utc;
use tracing::warn;

use crate::error::{LoaderError, LoaderResult};
use crate::models::{Case, Individual, VariantType};
use crate::parsers::ped::PedFamily;

/// Pedigree column listing an individual's default gene panels
pub const CLINICAL_DB_COLUMN: &str = "Clinical_db";

/// `CMMS_SCOUT_fam1` for institutes [CMMS, SCOUT] and family fam1
pub fn case_id(institutes: &[String], family_id: &str) -> LoaderResult<String> {
    if institutes.is_empty() || institutes.iter().any(|i| i.is_empty()) {
        return Err(LoaderError::InvalidArgument(
            "a case needs at least one non-empty institute id".to_string(),
        ));
    }
    if family_id.is_empty() {
        return Err(LoaderError::InvalidArgument("family id is empty".to_string()));
    }

    Ok(format!("{}_{}", institutes.join("_"), family_id))
}

/// Build the case for a pedigree family
pub fn build_case(
    family: &PedFamily,
    institutes: &[String],
    variant_type: VariantType,
    vcf_file: Option<String>,
    vcf_checksum: Option<String>,
) -> LoaderResult<Case> {
    let mut default_gene_lists: Vec<String> = Vec::new();
    let mut individuals = Vec::with_capacity(family.individuals.len());

    for record in &family.individuals {
        if let Some(panels) = record.extra.get(CLINICAL_DB_COLUMN) {
            for panel in panels.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                if !default_gene_lists.iter().any(|p| p == panel) {
                    default_gene_lists.push(panel.to_string());
                }
            }
        }

        individuals.push(Individual {
            individual_id: record.individual_id.clone(),
            display_name: record.individual_id.clone(),
            father: record.father.clone(),
            mother: record.mother.clone(),
            sex: record.sex.clone(),
            phenotype: record.phenotype.clone(),
        });
    }

    Ok(Case {
        case_id: case_id(institutes, &family.family_id)?,
        display_name: family.family_id.clone(),
        institutes: institutes.to_vec(),
        individuals,
        default_gene_lists,
        is_research: variant_type == VariantType::Research,
        vcf_file,
        vcf_checksum,
        updated_at: Utc::now(),
    })
}

/// Case individuals that have a sample column in the VCF, in pedigree order
pub fn vcf_individuals(case: &Case, sample_names: &[String]) -> Vec<String> {
    case.individuals
        .iter()
        .filter_map(|individual| {
            if sample_names.contains(&individual.individual_id) {
                Some(individual.individual_id.clone())
            } else {
                warn!(
                    "Individual {} is in the pedigree but not in the VCF, skipping",
                    individual.individual_id
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ped::PedParser;

    fn family() -> PedFamily {
        let text = "#FamilyID\tSampleID\tFather\tMother\tSex\tPhenotype\tClinical_db\n\
                    fam1\tproband\tfather\tmother\t1\t2\tIEM,EP\n\
                    fam1\tfather\t0\t0\t1\t1\tEP\n\
                    fam1\tmother\t0\t0\t2\t1\t\n";
        PedParser::parse_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_case_id() {
        let institutes = vec!["CMMS".to_string(), "SCOUT".to_string()];
        assert_eq!(case_id(&institutes, "fam1").unwrap(), "CMMS_SCOUT_fam1");
        assert!(matches!(case_id(&[], "fam1"), Err(LoaderError::InvalidArgument(_))));
        assert!(matches!(
            case_id(&["".to_string()], "fam1"),
            Err(LoaderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_case() {
        let case = build_case(
            &family(),
            &["CMMS".to_string()],
            VariantType::Research,
            Some("calls.vcf".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(case.case_id, "CMMS_fam1");
        assert_eq!(case.display_name, "fam1");
        assert!(case.is_research);
        assert_eq!(case.individuals.len(), 3);
        assert_eq!(case.individuals[0].mother, "mother");
        assert_eq!(case.default_gene_lists, vec!["IEM", "EP"]);
        assert_eq!(case.vcf_file.as_deref(), Some("calls.vcf"));
    }

    #[test]
    fn test_vcf_individuals() {
        let case = build_case(&family(), &["CMMS".to_string()], VariantType::Clinical, None, None)
            .unwrap();
        let samples = vec!["mother".to_string(), "proband".to_string(), "other".to_string()];

        assert_eq!(vcf_individuals(&case, &samples), vec!["proband", "mother"]);
        assert!(!case.is_research);
    }
}
