//! Core domain types for theory items and the task taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OgeTheoryError;

/// Display label of the bucket holding items without a confident match.
pub const UNASSIGNED_LABEL: &str = "Без номера";

/// Prefix of numeric bucket labels (`Задание 7`).
const TASK_LABEL_PREFIX: &str = "Задание ";

// ---------------------------------------------------------------------------
// ContentItem
// ---------------------------------------------------------------------------

/// One theory entry from the theory dataset.
///
/// `matched_skill` and `taxonomy_number` are filled by the taxonomy matcher;
/// both stay `None` for items routed to the unassigned bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Display name of the skill/topic.
    pub goal_title: String,
    /// Body in the custom markup dialect. `None` when the source had no content.
    #[serde(default)]
    pub content: Option<String>,
    /// Taxonomy skill name the title was matched to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_skill: Option<String>,
    /// Task number of the matched skill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_number: Option<u32>,
}

impl ContentItem {
    /// Create an unmatched item.
    pub fn new(goal_title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            goal_title: goal_title.into(),
            content: Some(content.into()),
            matched_skill: None,
            taxonomy_number: None,
        }
    }

    /// The markup body, if present and not blank.
    pub fn body(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// TaxonomyEntry
// ---------------------------------------------------------------------------

/// A (skill name, task number) pair from the taxonomy dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    #[serde(rename = "навык", alias = "skill")]
    pub skill_name: String,
    #[serde(rename = "номер_задания", alias = "task_number")]
    pub task_number: u32,
}

impl TaxonomyEntry {
    pub fn new(skill_name: impl Into<String>, task_number: u32) -> Self {
        Self {
            skill_name: skill_name.into(),
            task_number,
        }
    }
}

// ---------------------------------------------------------------------------
// BucketKey
// ---------------------------------------------------------------------------

/// Grouping key: a task number, or the fallback bucket.
///
/// The derived ordering puts every `Task` before `Unassigned`, and tasks in
/// ascending numeric order, which is exactly the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BucketKey {
    Task(u32),
    Unassigned,
}

impl BucketKey {
    /// Human-readable label shown in listings.
    pub fn label(&self) -> String {
        match self {
            Self::Task(n) => format!("{TASK_LABEL_PREFIX}{n}"),
            Self::Unassigned => UNASSIGNED_LABEL.to_string(),
        }
    }

    /// Token used in export filenames.
    pub fn file_token(&self) -> String {
        match self {
            Self::Task(n) => n.to_string(),
            Self::Unassigned => "без_номера".to_string(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for BucketKey {
    type Err = OgeTheoryError;

    /// Accepts `7`, `Задание 7`, `none`, or the unassigned label.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == UNASSIGNED_LABEL || s.eq_ignore_ascii_case("none") {
            return Ok(Self::Unassigned);
        }
        let digits = s.strip_prefix(TASK_LABEL_PREFIX).unwrap_or(s).trim();
        digits
            .parse::<u32>()
            .map(Self::Task)
            .map_err(|_| OgeTheoryError::validation(format!("unknown task bucket '{s}'")))
    }
}
