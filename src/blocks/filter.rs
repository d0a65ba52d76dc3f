//! `FILTER` — pure row-mask block over one column. Grounded in
//! `original_source/backend/blocks/filter_block.py`.

use serde_json::Value;

use super::{
    config_bool_or, config_str, config_str_or, Block, BlockConfig, BlockContext, BlockKind, BlockOutcome, PauseCallback,
    ProgressCallback, FILTER_OPERATORS,
};
use crate::dataframe::DataFrame;
use crate::error::ExecutionError;

pub struct FilterBlock;

fn cell_as_string(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Cells read off a CSV are always `Value::String`/`Value::Null` —
/// `DataFrame::read_csv` never infers JSON types — so boolean operators
/// must coerce string cells rather than only recognizing `Value::Bool`.
fn cell_as_bool(value: Option<&Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn matches(value: Option<&Value>, operator: &str, target: &str, case_sensitive: bool) -> bool {
    match operator {
        "contains" => {
            let Some(cell) = cell_as_string(value) else { return false };
            if case_sensitive {
                cell.contains(target)
            } else {
                cell.to_ascii_lowercase().contains(&target.to_ascii_lowercase())
            }
        }
        "equals" => cell_as_string(value).as_deref() == Some(target),
        "not_equals" => cell_as_string(value).as_deref() != Some(target),
        "greater_than" => numeric_compare(value, target, |a, b| a > b),
        "less_than" => numeric_compare(value, target, |a, b| a < b),
        "is_true" => cell_as_bool(value) == Some(true),
        "is_false" => cell_as_bool(value) == Some(false),
        "is_null" => value.is_none_or(Value::is_null),
        "is_not_null" => value.is_some_and(|v| !v.is_null()),
        _ => unreachable!("operator validated before iteration"),
    }
}

/// Cells read off a CSV are always strings, so a numeric compare must
/// fall back to parsing the string rather than requiring a JSON number.
fn numeric_compare(value: Option<&Value>, target: &str, op: impl Fn(f64, f64) -> bool) -> bool {
    let cell_num = value.and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
    let (Some(cell_num), Ok(target_num)) = (cell_num, target.parse::<f64>()) else {
        return false;
    };
    op(cell_num, target_num)
}

#[async_trait::async_trait]
impl Block for FilterBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::Filter
    }

    async fn execute(
        &self,
        frame_in: Option<DataFrame>,
        config: &BlockConfig,
        _ctx: &BlockContext,
        progress_cb: ProgressCallback<'_>,
        _pause_cb: PauseCallback<'_>,
        _start_row: usize,
    ) -> Result<BlockOutcome, ExecutionError> {
        let frame = frame_in.ok_or(ExecutionError::EmptyInput)?;

        let column = config_str(config, "column").ok_or_else(|| ExecutionError::ConfigInvalid("column is required".into()))?;
        if !frame.columns.iter().any(|c| c == &column) {
            return Err(ExecutionError::ConfigInvalid(format!("column '{column}' not found")));
        }

        let operator = config_str_or(config, "operator", "contains");
        if !FILTER_OPERATORS.contains(&operator.as_str()) {
            return Err(ExecutionError::ConfigInvalid(format!("unknown operator: {operator}")));
        }
        let value = config_str_or(config, "value", "");
        let case_sensitive = config_bool_or(config, "case_sensitive", false);

        progress_cb(10);

        let mut result = DataFrame::new(frame.columns.clone());
        for row in &frame.rows {
            if matches(row.cells.get(&column), &operator, &value, case_sensitive) {
                result.rows.push(row.clone());
            }
        }

        progress_cb(100);
        Ok(BlockOutcome::Done(result))
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
