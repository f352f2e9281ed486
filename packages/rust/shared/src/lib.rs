//! Shared types, error model, and configuration for ogetheory.
//!
//! This crate is the foundation depended on by all other ogetheory crates.
//! It provides:
//! - [`OgeTheoryError`] — the unified error type
//! - Domain types ([`ContentItem`], [`TaxonomyEntry`], [`BucketKey`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DataConfig, ExportConfig, MatchingConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{OgeTheoryError, Result};
pub use types::{BucketKey, ContentItem, TaxonomyEntry, UNASSIGNED_LABEL};
