//! Taxonomy matcher.
//!
//! Assigns each theory item to a task bucket by fuzzy-matching its title
//! against the taxonomy's skill names. Similarity is the normalized indel
//! ratio on a 0–100 scale: `200 * LCS(a, b) / (len(a) + len(b))`, computed
//! over Unicode scalar values.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, trace};

use ogetheory_shared::{BucketKey, ContentItem, TaxonomyEntry};

/// Best taxonomy skill for a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch<'a> {
    pub skill: &'a str,
    pub task_number: u32,
    /// Similarity in `0.0..=100.0`.
    pub score: f64,
}

/// Deduplicated skill vocabulary in taxonomy order.
#[derive(Debug, Clone, Default)]
pub struct SkillIndex {
    names: Vec<String>,
    numbers: HashMap<String, u32>,
}

impl SkillIndex {
    /// Build the index. The first occurrence of a duplicated skill name wins.
    pub fn new(entries: &[TaxonomyEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if index.numbers.contains_key(&entry.skill_name) {
                trace!(skill = %entry.skill_name, "duplicate skill ignored");
                continue;
            }
            index
                .numbers
                .insert(entry.skill_name.clone(), entry.task_number);
            index.names.push(entry.skill_name.clone());
        }
        index
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Highest-scoring skill for `query`; on equal scores the earliest skill wins.
    pub fn best_match(&self, query: &str) -> Option<SkillMatch<'_>> {
        let query: Vec<char> = query.chars().collect();
        let mut best: Option<(&str, f64)> = None;

        for name in &self.names {
            let score = similarity_chars(&query, &name.chars().collect::<Vec<_>>());
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((name.as_str(), score));
            }
        }

        best.map(|(skill, score)| SkillMatch {
            skill,
            task_number: self.numbers[skill],
            score,
        })
    }
}

/// Normalized similarity of two strings, `0.0..=100.0`. Two empty strings score 100.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    similarity_chars(&a, &b)
}

fn similarity_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Length of the longest common subsequence, single-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Items grouped by bucket. Iteration order is display order: ascending task
/// numbers, then the unassigned bucket. Empty buckets are never stored.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    buckets: BTreeMap<BucketKey, Vec<ContentItem>>,
}

impl Grouping {
    /// Bucket keys in display order.
    pub fn keys(&self) -> Vec<BucketKey> {
        self.buckets.keys().copied().collect()
    }

    /// Items of a bucket in source order; empty for unknown keys.
    pub fn items(&self, key: BucketKey) -> &[ContentItem] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, &[ContentItem])> {
        self.buckets.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Total number of grouped items.
    pub fn item_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Match every item against the taxonomy and group the results.
///
/// An item whose best score reaches `threshold` gets that skill's task number
/// and name; every other item lands in [`BucketKey::Unassigned`]. No item is
/// dropped or duplicated.
#[instrument(
    skip_all,
    fields(items = items.len(), skills = taxonomy.len(), threshold = threshold)
)]
pub fn group_items(
    items: Vec<ContentItem>,
    taxonomy: &[TaxonomyEntry],
    threshold: f64,
) -> Grouping {
    let index = SkillIndex::new(taxonomy);
    let mut buckets: BTreeMap<BucketKey, Vec<ContentItem>> = BTreeMap::new();

    for mut item in items {
        let key = match index.best_match(&item.goal_title) {
            Some(m) if m.score >= threshold => {
                trace!(title = %item.goal_title, skill = m.skill, score = m.score, "matched");
                item.matched_skill = Some(m.skill.to_string());
                item.taxonomy_number = Some(m.task_number);
                BucketKey::Task(m.task_number)
            }
            _ => {
                item.matched_skill = None;
                item.taxonomy_number = None;
                BucketKey::Unassigned
            }
        };
        buckets.entry(key).or_default().push(item);
    }

    debug!(
        buckets = buckets.len(),
        unassigned = buckets.get(&BucketKey::Unassigned).map_or(0, Vec::len),
        "items grouped"
    );

    Grouping { buckets }
}
