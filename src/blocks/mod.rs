//! Block contract, closed block-kind table, and config helpers.
//!
//! DESIGN
//! ======
//! Every block implements `Block`, an async trait in the same shape as
//! an injected LLM-client trait. Pause is modeled as a dedicated arm of
//! `BlockOutcome` rather than an exception used for control flow: the
//! type of the value a block returns distinguishes success, pause, and
//! failure.

pub mod csv_sink;
pub mod csv_source;
pub mod enrich_lead;
pub mod filter;
pub mod find_email;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataframe::DataFrame;
use crate::enrichment_client::EnrichmentClient;
use crate::error::ExecutionError;

/// Closed set of block kinds this engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    ReadCsv,
    SaveCsv,
    Filter,
    EnrichLead,
    FindEmail,
}

impl BlockKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadCsv => "READ_CSV",
            Self::SaveCsv => "SAVE_CSV",
            Self::Filter => "FILTER",
            Self::EnrichLead => "ENRICH_LEAD",
            Self::FindEmail => "FIND_EMAIL",
        }
    }
}

/// Block-specific configuration: a flat key-value mapping, deserialized
/// from the workflow request JSON.
pub type BlockConfig = serde_json::Map<String, Value>;

/// Progress callback: invoked with a monotonically non-decreasing value
/// in `0..=100`, at least once at 100 on success. Cheap and synchronous —
/// it only records a counter, never performs I/O — so it is a plain
/// closure rather than an awaitable.
pub type ProgressCallback<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Pause predicate: non-blocking, checked at batch boundaries only.
pub type PauseCallback<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// What a block produced: either a finished frame, or a pause signal
/// carrying the partial frame and the row cursor to resume from.
pub enum BlockOutcome {
    Done(DataFrame),
    Paused { partial_frame: DataFrame, last_processed_row: usize },
}

/// Resources a block may need beyond its own config: the data/root
/// directories for file resolution, and the injected enrichment client.
pub struct BlockContext {
    pub data_dir: std::path::PathBuf,
    pub root_dir: std::path::PathBuf,
    pub enrichment_client: Arc<dyn EnrichmentClient>,
}

#[async_trait::async_trait]
pub trait Block: Send + Sync {
    fn kind(&self) -> BlockKind;

    async fn execute(
        &self,
        frame_in: Option<DataFrame>,
        config: &BlockConfig,
        ctx: &BlockContext,
        progress_cb: ProgressCallback<'_>,
        pause_cb: PauseCallback<'_>,
        start_row: usize,
    ) -> Result<BlockOutcome, ExecutionError>;
}

/// Closed kind -> constructor table. Adding a block kind is a
/// single-point change here; no runtime plugin loading is supported.
#[must_use]
pub fn construct(kind: BlockKind) -> Box<dyn Block> {
    match kind {
        BlockKind::ReadCsv => Box::new(csv_source::ReadCsvBlock),
        BlockKind::SaveCsv => Box::new(csv_sink::SaveCsvBlock),
        BlockKind::Filter => Box::new(filter::FilterBlock),
        BlockKind::EnrichLead => Box::new(enrich_lead::EnrichLeadBlock),
        BlockKind::FindEmail => Box::new(find_email::FindEmailBlock),
    }
}

// =============================================================================
// CONFIG HELPERS
// =============================================================================

pub(crate) fn config_str(config: &BlockConfig, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn config_str_or<'a>(config: &'a BlockConfig, key: &str, default: &'a str) -> String {
    config_str(config, key).unwrap_or_else(|| default.to_string())
}

pub(crate) fn config_bool_or(config: &BlockConfig, key: &str, default: bool) -> bool {
    config.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn config_usize_or(config: &BlockConfig, key: &str, default: usize) -> usize {
    config
        .get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_i64().map(|i| i.max(0) as u64)))
        .map_or(default, |v| v as usize)
}

/// Resolve `max_concurrent`/`batch_size`, defaulting `batch_size` to
/// `max_concurrent` when absent, and rejecting values below 1.
pub(crate) fn concurrency_config(
    config: &BlockConfig,
    default_max_concurrent: usize,
) -> Result<(usize, usize), ExecutionError> {
    let max_concurrent = config_usize_or(config, "max_concurrent", default_max_concurrent);
    let batch_size = config_usize_or(config, "batch_size", max_concurrent);
    if max_concurrent < 1 {
        return Err(ExecutionError::ConfigInvalid("max_concurrent must be >= 1".into()));
    }
    if batch_size < 1 {
        return Err(ExecutionError::ConfigInvalid("batch_size must be >= 1".into()));
    }
    Ok((max_concurrent, batch_size))
}

// =============================================================================
// CATALOG
// =============================================================================

/// A single config field entry in the block catalog's schema.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFieldSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<&'static [&'static str]>,
}

/// A catalog entry describing one block kind. Informational only — it
/// does not constrain `execute`.
#[derive(Debug, Clone, Serialize)]
pub struct BlockCatalogEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub config_schema: Vec<ConfigFieldSchema>,
}

pub(crate) const FILTER_OPERATORS: &[&str] = &[
    "contains",
    "equals",
    "not_equals",
    "greater_than",
    "less_than",
    "is_true",
    "is_false",
    "is_null",
    "is_not_null",
];

/// The static block catalog, grounded in `original_source/backend/main.py`'s
/// `/blocks` payload.
#[must_use]
pub fn catalog() -> Vec<BlockCatalogEntry> {
    vec![
        BlockCatalogEntry {
            kind: "READ_CSV",
            name: "Read CSV",
            description: "Load a CSV file into the workflow",
            color: "#8B5CF6",
            config_schema: vec![ConfigFieldSchema {
                name: "file_path",
                field_type: "string",
                default: None,
                required: true,
                r#enum: None,
            }],
        },
        BlockCatalogEntry {
            kind: "ENRICH_LEAD",
            name: "Enrich Lead",
            description: "Enrich lead information using the configured enrichment service",
            color: "#3B82F6",
            config_schema: vec![
                ConfigFieldSchema { name: "struct", field_type: "array", default: None, required: false, r#enum: None },
                ConfigFieldSchema {
                    name: "name_column",
                    field_type: "string",
                    default: Some("name"),
                    required: false,
                    r#enum: None,
                },
                ConfigFieldSchema {
                    name: "company_column",
                    field_type: "string",
                    default: Some("company"),
                    required: false,
                    r#enum: None,
                },
                ConfigFieldSchema {
                    name: "linkedin_column",
                    field_type: "string",
                    default: Some("linkedin"),
                    required: false,
                    r#enum: None,
                },
            ],
        },
        BlockCatalogEntry {
            kind: "FIND_EMAIL",
            name: "Find Email",
            description: "Find email addresses for leads",
            color: "#F97316",
            config_schema: vec![
                ConfigFieldSchema {
                    name: "mode",
                    field_type: "string",
                    default: Some("PROFESSIONAL"),
                    required: false,
                    r#enum: None,
                },
                ConfigFieldSchema {
                    name: "output_column",
                    field_type: "string",
                    default: Some("found_email"),
                    required: false,
                    r#enum: None,
                },
                ConfigFieldSchema {
                    name: "skip_existing",
                    field_type: "boolean",
                    default: Some("true"),
                    required: false,
                    r#enum: None,
                },
            ],
        },
        BlockCatalogEntry {
            kind: "FILTER",
            name: "Filter",
            description: "Filter rows based on conditions",
            color: "#EAB308",
            config_schema: vec![
                ConfigFieldSchema { name: "column", field_type: "string", default: None, required: true, r#enum: None },
                ConfigFieldSchema {
                    name: "operator",
                    field_type: "string",
                    default: Some("contains"),
                    required: false,
                    r#enum: Some(FILTER_OPERATORS),
                },
                ConfigFieldSchema { name: "value", field_type: "string", default: None, required: false, r#enum: None },
                ConfigFieldSchema {
                    name: "case_sensitive",
                    field_type: "boolean",
                    default: Some("false"),
                    required: false,
                    r#enum: None,
                },
            ],
        },
        BlockCatalogEntry {
            kind: "SAVE_CSV",
            name: "Save CSV",
            description: "Save the data to a CSV file",
            color: "#22C55E",
            config_schema: vec![ConfigFieldSchema {
                name: "file_name",
                field_type: "string",
                default: Some("output.csv"),
                required: false,
                r#enum: None,
            }],
        },
    ]
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
