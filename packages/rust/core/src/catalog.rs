//! Theory catalog: dataset loading plus the process-wide memo of grouped items.
//!
//! A [`Catalog`] is built once per distinct (theory, taxonomy, threshold)
//! input and shared read-only afterwards. The memo is keyed by a SHA-256
//! fingerprint of the raw inputs and is never invalidated during a run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use ogetheory_shared::{BucketKey, ContentItem, OgeTheoryError, Result, TaxonomyEntry};

use crate::taxonomy::{Grouping, group_items};

/// Memoized catalogs keyed by input fingerprint.
static CATALOGS: LazyLock<Mutex<HashMap<String, Arc<Catalog>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Grouped theory items, ready for lookup.
#[derive(Debug)]
pub struct Catalog {
    fingerprint: String,
    grouping: Grouping,
}

impl Catalog {
    /// Decode both datasets and group the items. Not memoized.
    #[instrument(skip_all, fields(threshold = threshold))]
    pub fn build(theory_json: &str, taxonomy_json: &str, threshold: f64) -> Result<Self> {
        let items = parse_theory(theory_json)?;
        let taxonomy = parse_taxonomy(taxonomy_json)?;

        Ok(Self {
            fingerprint: fingerprint(theory_json, taxonomy_json, threshold),
            grouping: group_items(items, &taxonomy, threshold),
        })
    }

    /// Memoized [`Catalog::build`]: identical input returns the same shared catalog.
    pub fn shared(theory_json: &str, taxonomy_json: &str, threshold: f64) -> Result<Arc<Self>> {
        let key = fingerprint(theory_json, taxonomy_json, threshold);

        let mut memo = CATALOGS.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = memo.get(&key) {
            debug!(fingerprint = %short(&key), "catalog memo hit");
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(Self::build(theory_json, taxonomy_json, threshold)?);
        info!(
            fingerprint = %short(&key),
            items = catalog.item_count(),
            buckets = catalog.keys().len(),
            "catalog built"
        );
        memo.insert(key, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Read both dataset files and return the memoized catalog for their content.
    pub fn load(theory_path: &Path, taxonomy_path: &Path, threshold: f64) -> Result<Arc<Self>> {
        let theory = read_dataset(theory_path)?;
        let taxonomy = read_dataset(taxonomy_path)?;
        Self::shared(&theory, &taxonomy, threshold)
    }

    /// SHA-256 of the inputs this catalog was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Bucket keys in display order.
    pub fn keys(&self) -> Vec<BucketKey> {
        self.grouping.keys()
    }

    /// Items in a bucket, source order.
    pub fn items(&self, key: BucketKey) -> &[ContentItem] {
        self.grouping.items(key)
    }

    /// Item with exactly this title in the given bucket.
    pub fn find(&self, key: BucketKey, goal_title: &str) -> Option<&ContentItem> {
        self.items(key).iter().find(|i| i.goal_title == goal_title)
    }

    pub fn item_count(&self) -> usize {
        self.grouping.item_count()
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }
}

// ---------------------------------------------------------------------------
// Dataset decoding
// ---------------------------------------------------------------------------

/// Decode the theory dataset: the item list stored under the object's first key.
pub fn parse_theory(json: &str) -> Result<Vec<ContentItem>> {
    let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| OgeTheoryError::parse(format!("theory dataset: {e}")))?;

    let (key, list) = root
        .into_iter()
        .next()
        .ok_or_else(|| OgeTheoryError::validation("theory dataset has no item list"))?;

    let items: Vec<ContentItem> = serde_json::from_value(list)
        .map_err(|e| OgeTheoryError::parse(format!("theory dataset key '{key}': {e}")))?;

    debug!(key = %key, items = items.len(), "theory dataset decoded");
    Ok(items)
}

/// Decode the taxonomy dataset: an array of skill / task-number records.
pub fn parse_taxonomy(json: &str) -> Result<Vec<TaxonomyEntry>> {
    let entries: Vec<TaxonomyEntry> = serde_json::from_str(json)
        .map_err(|e| OgeTheoryError::parse(format!("taxonomy dataset: {e}")))?;
    debug!(entries = entries.len(), "taxonomy dataset decoded");
    Ok(entries)
}

fn read_dataset(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| OgeTheoryError::io(path, e))
}

fn fingerprint(theory_json: &str, taxonomy_json: &str, threshold: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(theory_json.as_bytes());
    hasher.update([0u8]);
    hasher.update(taxonomy_json.as_bytes());
    hasher.update(threshold.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..12.min(fingerprint.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/json")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    #[test]
    fn parse_theory_takes_first_key() {
        let items = parse_theory(
            r#"{"rows": [{"goal_title": "A", "content": "<p>a</p>"}, {"goal_title": "B"}]}"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].body(), Some("<p>a</p>"));
        assert_eq!(items[1].content, None);
    }

    #[test]
    fn parse_theory_rejects_empty_object() {
        let err = parse_theory("{}").unwrap_err();
        assert!(err.to_string().contains("no item list"));
    }

    #[test]
    fn parse_theory_reports_bad_json() {
        let err = parse_theory("[1, 2").unwrap_err();
        assert!(matches!(err, OgeTheoryError::Parse { .. }));
    }

    #[test]
    fn fixture_catalog_groups_items() {
        let catalog = Catalog::build(
            &load_fixture("theory.fixture.json"),
            &load_fixture("taxonomy.fixture.json"),
            90.0,
        )
        .unwrap();

        assert_eq!(catalog.item_count(), 5);
        assert_eq!(
            catalog.keys(),
            vec![BucketKey::Task(6), BucketKey::Task(15), BucketKey::Unassigned]
        );

        let fractions = catalog.items(BucketKey::Task(6));
        assert_eq!(fractions.len(), 2);
        assert_eq!(fractions[0].goal_title, "Действия с обыкновенными дробями");

        let unassigned = catalog.items(BucketKey::Unassigned);
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].goal_title, "Комбинаторика для любознательных");

        let item = catalog
            .find(BucketKey::Task(15), "Площадь треугольника.")
            .expect("triangle item");
        assert_eq!(item.matched_skill.as_deref(), Some("Площадь треугольника"));
    }

    #[test]
    fn identical_input_is_memoized() {
        let theory = r#"{"t": [{"goal_title": "memo-test", "content": "x"}]}"#;
        let taxonomy = r#"[{"навык": "memo-test", "номер_задания": 4}]"#;

        let first = Catalog::shared(theory, taxonomy, 90.0).unwrap();
        let second = Catalog::shared(theory, taxonomy, 90.0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = Catalog::shared(theory, taxonomy, 95.0).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_ne!(first.fingerprint(), other.fingerprint());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load(
            Path::new("/nonexistent/theory.json"),
            &fixture_path("taxonomy.fixture.json"),
            90.0,
        )
        .unwrap_err();
        assert!(matches!(err, OgeTheoryError::Io { .. }));
    }
}
