// ==============================================================================
// store.rs - Variant Record Store
// ==============================================================================
// Description: Record store trait and its SQLite implementation
// Author: Matt Barham
// Created: 2025-11-12
// Modified: 2026-10-10
// Version: 2.0.0
// ==============================================================================
// Schema:
//   variants - one row per document_id: scalar/JSON index columns plus the
//              full variant as a JSON document
//   cases    - one row per case_id
// ==============================================================================

use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{LoaderError, LoaderResult};
use crate::models::{Case, Variant, VariantType};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS variants (
    document_id TEXT PRIMARY KEY,
    variant_id TEXT NOT NULL,
    case_id TEXT NOT NULL,
    variant_type TEXT NOT NULL,
    variant_rank INTEGER NOT NULL,
    rank_score REAL NOT NULL,
    thousand_genomes_frequency REAL,
    exac_frequency REAL,
    gene_lists TEXT,
    hgnc_symbols TEXT NOT NULL,
    functional_annotations TEXT NOT NULL,
    region_annotations TEXT NOT NULL,
    local_frequency REAL,
    document TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    document TEXT NOT NULL
);
";

/// Indexable variant fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexField {
    CaseId,
    VariantRank,
    VariantType,
    ThousandGenomesFrequency,
    GeneLists,
    HgncSymbols,
    ExacFrequency,
    GeneFunctionalAnnotation,
    GeneRegionAnnotation,
}

impl IndexField {
    /// Column backing the field
    pub fn column(&self) -> &'static str {
        match self {
            IndexField::CaseId => "case_id",
            IndexField::VariantRank => "variant_rank",
            IndexField::VariantType => "variant_type",
            IndexField::ThousandGenomesFrequency => "thousand_genomes_frequency",
            IndexField::GeneLists => "gene_lists",
            IndexField::HgncSymbols => "hgnc_symbols",
            IndexField::ExacFrequency => "exac_frequency",
            IndexField::GeneFunctionalAnnotation => "functional_annotations",
            IndexField::GeneRegionAnnotation => "region_annotations",
        }
    }
}

/// Compound indexes every variant store must carry
pub const REQUIRED_INDEXES: [&[IndexField]; 3] = [
    &[
        IndexField::CaseId,
        IndexField::VariantRank,
        IndexField::VariantType,
        IndexField::ThousandGenomesFrequency,
        IndexField::GeneLists,
    ],
    &[IndexField::HgncSymbols, IndexField::ExacFrequency],
    &[
        IndexField::ThousandGenomesFrequency,
        IndexField::GeneFunctionalAnnotation,
        IndexField::GeneRegionAnnotation,
    ],
];

/// Equality filter over stored variants; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantQuery {
    pub case_id: Option<String>,
    pub variant_type: Option<VariantType>,
    pub variant_id: Option<String>,
    pub document_id: Option<String>,
    /// Matches variants whose `hgnc_symbols` contain this symbol
    pub hgnc_symbol: Option<String>,
}

impl VariantQuery {
    pub fn case(case_id: impl Into<String>) -> Self {
        Self {
            case_id: Some(case_id.into()),
            ..Default::default()
        }
    }

    pub fn document(document_id: impl Into<String>) -> Self {
        Self {
            document_id: Some(document_id.into()),
            ..Default::default()
        }
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        let mut push = |clause: &str, value: String| {
            values.push(value);
            clauses.push(clause.replace('?', &format!("?{}", values.len())));
        };

        if let Some(case_id) = &self.case_id {
            push("case_id = ?", case_id.clone());
        }
        if let Some(variant_type) = &self.variant_type {
            push("variant_type = ?", variant_type.as_str().to_string());
        }
        if let Some(variant_id) = &self.variant_id {
            push("variant_id = ?", variant_id.clone());
        }
        if let Some(document_id) = &self.document_id {
            push("document_id = ?", document_id.clone());
        }
        if let Some(symbol) = &self.hgnc_symbol {
            push(
                "EXISTS (SELECT 1 FROM json_each(variants.hgnc_symbols) WHERE json_each.value = ?)",
                symbol.clone(),
            );
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// Persistence seam for assembled variants and their cases
pub trait VariantStore {
    /// Store one variant
    ///
    /// Fails with `DuplicateIdentity` when the `document_id` is already
    /// stored; the stored record is left unchanged.
    fn insert(&mut self, variant: &Variant) -> LoaderResult<()>;

    /// Store a batch, unordered
    ///
    /// Every non-duplicate is stored. Returns the number stored, or
    /// `BulkInsertPartialFailure` listing the rejected document ids.
    fn insert_many(&mut self, variants: &[Variant]) -> LoaderResult<usize>;

    fn find(&self, query: &VariantQuery) -> LoaderResult<Vec<Variant>>;

    fn count(&self, query: &VariantQuery) -> LoaderResult<usize>;

    /// Create a compound index if it is missing; returns the index name
    fn ensure_index(&mut self, fields: &[IndexField], background: bool) -> LoaderResult<String>;

    /// Insert or replace a case
    fn save_case(&mut self, case: &Case) -> LoaderResult<()>;

    fn case_count(&self) -> LoaderResult<usize>;

    fn set_local_frequency(&mut self, document_id: &str, frequency: f64) -> LoaderResult<()>;
}

/// SQLite-backed variant store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store database
    pub fn open<P: AsRef<Path>>(path: P) -> LoaderResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> LoaderResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> LoaderResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Load a case by id
    pub fn find_case(&self, case_id: &str) -> LoaderResult<Option<Case>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM cases WHERE case_id = ?1",
                params![case_id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Insert a row; `Ok(false)` when its document_id is already stored
fn insert_row(conn: &Connection, variant: &Variant) -> LoaderResult<bool> {
    let gene_lists = variant
        .gene_lists
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let functional: Vec<&str> = variant
        .genes
        .iter()
        .filter_map(|g| g.functional_annotation.as_deref())
        .collect();
    let regions: Vec<&str> = variant
        .genes
        .iter()
        .filter_map(|g| g.region_annotation.map(|r| r.as_str()))
        .collect();

    let result = conn.execute(
        "INSERT INTO variants (
            document_id, variant_id, case_id, variant_type, variant_rank, rank_score,
            thousand_genomes_frequency, exac_frequency, gene_lists, hgnc_symbols,
            functional_annotations, region_annotations, local_frequency, document
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            variant.document_id,
            variant.variant_id,
            variant.case_id,
            variant.variant_type.as_str(),
            variant.variant_rank as i64,
            variant.rank_score,
            variant.thousand_genomes_frequency,
            variant.exac_frequency,
            gene_lists,
            serde_json::to_string(&variant.hgnc_symbols)?,
            serde_json::to_string(&functional)?,
            serde_json::to_string(&regions)?,
            variant.local_frequency,
            serde_json::to_string(variant)?,
        ],
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

impl VariantStore for SqliteStore {
    fn insert(&mut self, variant: &Variant) -> LoaderResult<()> {
        if !insert_row(&self.conn, variant)? {
            return Err(LoaderError::DuplicateIdentity {
                document_id: variant.document_id.clone(),
            });
        }
        Ok(())
    }

    fn insert_many(&mut self, variants: &[Variant]) -> LoaderResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        let mut rejected = Vec::new();

        for variant in variants {
            if !insert_row(&tx, variant)? {
                rejected.push(variant.document_id.clone());
            } else {
                inserted += 1;
            }
        }
        tx.commit()?;

        debug!("Bulk insert: {} stored, {} rejected", inserted, rejected.len());

        if rejected.is_empty() {
            Ok(inserted)
        } else {
            Err(LoaderError::BulkInsertPartialFailure { inserted, rejected })
        }
    }

    fn find(&self, query: &VariantQuery) -> LoaderResult<Vec<Variant>> {
        let (where_clause, values) = query.where_clause();
        let sql = format!(
            "SELECT document, local_frequency FROM variants{}
             ORDER BY case_id, variant_type, variant_rank",
            where_clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(json, local_frequency)| {
                let mut variant: Variant = serde_json::from_str(&json)?;
                variant.local_frequency = local_frequency;
                Ok(variant)
            })
            .collect()
    }

    fn count(&self, query: &VariantQuery) -> LoaderResult<usize> {
        let (where_clause, values) = query.where_clause();
        let sql = format!("SELECT COUNT(*) FROM variants{}", where_clause);
        let count: usize = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count)
    }

    fn ensure_index(&mut self, fields: &[IndexField], background: bool) -> LoaderResult<String> {
        if fields.is_empty() {
            return Err(LoaderError::InvalidArgument(
                "an index needs at least one field".to_string(),
            ));
        }

        let columns: Vec<&str> = fields.iter().map(IndexField::column).collect();
        let name = format!("idx_variants_{}", columns.join("_"));

        // SQLite builds indexes inline
        if background {
            debug!("Building {} in the foreground", name);
        }

        self.conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON variants ({})",
            name,
            columns.join(", ")
        ))?;

        Ok(name)
    }

    fn save_case(&mut self, case: &Case) -> LoaderResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cases (case_id, display_name, updated_at, document)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                case.case_id,
                case.display_name,
                case.updated_at.to_rfc3339(),
                serde_json::to_string(case)?,
            ],
        )?;
        Ok(())
    }

    fn case_count(&self) -> LoaderResult<usize> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        Ok(count)
    }

    fn set_local_frequency(&mut self, document_id: &str, frequency: f64) -> LoaderResult<()> {
        self.conn.execute(
            "UPDATE variants SET local_frequency = ?1 WHERE document_id = ?2",
            params![frequency, document_id],
        )?;
        Ok(())
    }
}

/// Create every index in [`REQUIRED_INDEXES`]
pub fn ensure_indexes<S: VariantStore + ?Sized>(store: &mut S) -> LoaderResult<Vec<String>> {
    REQUIRED_INDEXES
        .iter()
        .map(|fields| store.ensure_index(fields, true))
        .collect()
}

/// Recompute `local_frequency` for every stored variant
///
/// local_frequency = variants sharing the variant_id / number of cases.
/// The case count is read once at the start. Must not run during a load.
pub fn update_local_frequencies<S: VariantStore + ?Sized>(store: &mut S) -> LoaderResult<usize> {
    let number_of_cases = store.case_count()?;
    if number_of_cases == 0 {
        warn!("No cases stored, local frequencies left unchanged");
        return Ok(0);
    }

    let variants = store.find(&VariantQuery::default())?;
    let mut carriers: HashMap<&str, usize> = HashMap::new();
    for variant in &variants {
        *carriers.entry(variant.variant_id.as_str()).or_default() += 1;
    }

    for variant in &variants {
        let count = carriers.get(variant.variant_id.as_str()).copied().unwrap_or(0);
        store.set_local_frequency(
            &variant.document_id,
            count as f64 / number_of_cases as f64,
        )?;
    }

    info!(
        "Updated local frequencies for {} variants across {} cases",
        variants.len(),
        number_of_cases
    );

    Ok(variants.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::tests::test_case;
    use crate::identity;
    use crate::models::GeneAnnotation;
    use crate::severity::Region;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    fn variant(case_id: &str, position: u64, rank: usize) -> Variant {
        let fields = identity::variant_fields("1", position, "A", "G", VariantType::Clinical);
        Variant {
            document_id: identity::document_id(&fields, case_id).unwrap(),
            variant_id: identity::variant_id(&fields).unwrap(),
            variant_type: VariantType::Clinical,
            case_id: case_id.to_string(),
            display_name: fields.join("_"),
            chromosome: "1".to_string(),
            position,
            reference: "A".to_string(),
            alternative: "G".to_string(),
            variant_rank: rank,
            quality: Some(50.0),
            filters: vec!["PASS".to_string()],
            gene_lists: None,
            rank_score: 10.0,
            samples: Vec::new(),
            compounds: Vec::new(),
            genetic_models: Vec::new(),
            genes: Vec::new(),
            hgnc_symbols: Vec::new(),
            ensembl_gene_ids: Vec::new(),
            db_snp_ids: vec![".".to_string()],
            thousand_genomes_frequency: Some(0.0),
            exac_frequency: None,
            cadd_score: 0.0,
            gerp_conservation: Vec::new(),
            phast_conservation: Vec::new(),
            phylop_conservation: Vec::new(),
            local_frequency: None,
        }
    }

    fn index_names(store: &SqliteStore) -> Vec<String> {
        let mut stmt = store
            .conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'index' AND tbl_name = 'variants' AND name NOT LIKE 'sqlite_%'",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    fn case(case_id: &str) -> Case {
        let mut case = test_case();
        case.case_id = case_id.to_string();
        case
    }

    #[test]
    fn test_insert_and_find() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut v = variant("CMMS_fam1", 100, 1);
        v.hgnc_symbols = vec!["ABC1".to_string()];
        v.genes = vec![GeneAnnotation {
            hgnc_symbol: "ABC1".to_string(),
            transcripts: IndexMap::new(),
            most_severe_transcript: String::new(),
            best_rank: 10,
            functional_annotation: Some("missense_variant".to_string()),
            region_annotation: Some(Region::Exonic),
            sift_prediction: None,
            polyphen_prediction: None,
            omim_gene_entry: Some(154700),
            omim_phenotypes: Vec::new(),
        }];
        store.insert(&v).unwrap();
        store.insert(&variant("CMMS_fam1", 200, 2)).unwrap();

        let found = store.find(&VariantQuery::document(&v.document_id)).unwrap();
        assert_eq!(found, vec![v.clone()]);

        let by_symbol = VariantQuery {
            hgnc_symbol: Some("ABC1".to_string()),
            ..Default::default()
        };
        assert_eq!(store.count(&by_symbol).unwrap(), 1);
        assert_eq!(store.count(&VariantQuery::case("CMMS_fam1")).unwrap(), 2);
        assert_eq!(store.count(&VariantQuery::case("CMMS_fam2")).unwrap(), 0);

        let research = VariantQuery {
            variant_type: Some(VariantType::Research),
            ..Default::default()
        };
        assert_eq!(store.count(&research).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_insert_leaves_original() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let original = variant("CMMS_fam1", 100, 1);
        store.insert(&original).unwrap();

        let mut again = original.clone();
        again.variant_rank = 99;
        match store.insert(&again) {
            Err(LoaderError::DuplicateIdentity { document_id }) => {
                assert_eq!(document_id, original.document_id)
            }
            other => panic!("expected DuplicateIdentity, got {:?}", other),
        }

        let stored = store.find(&VariantQuery::document(&original.document_id)).unwrap();
        assert_eq!(stored[0].variant_rank, 1);
    }

    #[test]
    fn test_constraint_failure_is_not_a_duplicate() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut v = variant("CMMS_fam1", 100, 1);
        // NaN binds as NULL against a NOT NULL column
        v.rank_score = f64::NAN;

        match store.insert(&v) {
            Err(LoaderError::Sqlite(_)) => {}
            other => panic!("expected Sqlite error, got {:?}", other),
        }
        assert!(matches!(
            store.insert_many(&[v]),
            Err(LoaderError::Sqlite(_))
        ));
        assert_eq!(store.count(&VariantQuery::default()).unwrap(), 0);
    }

    #[test]
    fn test_insert_many_partial_failure() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let existing = variant("CMMS_fam1", 100, 1);
        store.insert(&existing).unwrap();

        let batch = vec![
            variant("CMMS_fam1", 200, 2),
            existing.clone(),
            variant("CMMS_fam1", 300, 3),
        ];
        match store.insert_many(&batch) {
            Err(LoaderError::BulkInsertPartialFailure { inserted, rejected }) => {
                assert_eq!(inserted, 2);
                assert_eq!(rejected, vec![existing.document_id.clone()]);
            }
            other => panic!("expected BulkInsertPartialFailure, got {:?}", other),
        }
        assert_eq!(store.count(&VariantQuery::default()).unwrap(), 3);

        let clean = vec![variant("CMMS_fam1", 400, 4)];
        assert_eq!(store.insert_many(&clean).unwrap(), 1);
    }

    #[test]
    fn test_required_indexes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let names = ensure_indexes(&mut store).unwrap();
        assert_eq!(names.len(), 3);

        // idempotent
        ensure_indexes(&mut store).unwrap();
        assert_eq!(index_names(&store).len(), 3);
        assert!(names.contains(&"idx_variants_hgnc_symbols_exac_frequency".to_string()));
    }

    #[test]
    fn test_local_frequency() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for case_id in ["CMMS_fam1", "CMMS_fam2", "CMMS_fam3", "CMMS_fam4"] {
            store.save_case(&case(case_id)).unwrap();
        }
        store.insert(&variant("CMMS_fam1", 100, 1)).unwrap();
        store.insert(&variant("CMMS_fam2", 100, 1)).unwrap();
        store.insert(&variant("CMMS_fam1", 500, 2)).unwrap();

        assert_eq!(update_local_frequencies(&mut store).unwrap(), 3);

        let shared = store
            .find(&VariantQuery::case("CMMS_fam2"))
            .unwrap();
        assert_eq!(shared[0].local_frequency, Some(0.5));

        let all = store.find(&VariantQuery::case("CMMS_fam1")).unwrap();
        let private = all.iter().find(|v| v.position == 500).unwrap();
        assert_eq!(private.local_frequency, Some(0.25));
    }

    #[test]
    fn test_local_frequency_without_cases() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&variant("CMMS_fam1", 100, 1)).unwrap();
        assert_eq!(update_local_frequencies(&mut store).unwrap(), 0);
        let stored = store.find(&VariantQuery::default()).unwrap();
        assert_eq!(stored[0].local_frequency, None);
    }

    #[test]
    fn test_cases_persist_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("variants.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_case(&case("CMMS_fam1")).unwrap();
            store.save_case(&case("CMMS_fam1")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.case_count().unwrap(), 1);
        let loaded = store.find_case("CMMS_fam1").unwrap().unwrap();
        assert_eq!(loaded.display_name, "fam1");
        assert!(store.find_case("CMMS_fam9").unwrap().is_none());
    }
}
