//! Attribute access with schema validation
//!
//! Calculators never index the polars table directly: these helpers check the
//! column exists first and report a typed `MissingReason` naming layer and
//! attribute when it does not.

use crate::data::Layer;
use crate::metrics::MissingReason;
use polars::prelude::*;
use rustc_hash::FxHashSet;

/// Per-feature text values of an attribute (`None` for null cells)
pub fn text_values(layer: &Layer, attribute: &str) -> Result<Vec<Option<String>>, MissingReason> {
    let column = layer
        .attributes()
        .column(attribute)
        .map_err(|_| MissingReason::AttributeAbsent(layer.kind(), attribute.to_string()))?;

    let as_text = column
        .cast(&DataType::String)
        .map_err(|e| MissingReason::Attribute(layer.kind(), attribute.to_string(), e.to_string()))?;
    let values = as_text
        .str()
        .map_err(|e| MissingReason::Attribute(layer.kind(), attribute.to_string(), e.to_string()))?;

    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Per-feature numeric values, coercing text; unparsable cells become `None`
pub fn numeric_values(layer: &Layer, attribute: &str) -> Result<Vec<Option<f64>>, MissingReason> {
    let column = layer
        .attributes()
        .column(attribute)
        .map_err(|_| MissingReason::AttributeAbsent(layer.kind(), attribute.to_string()))?;

    // Padded text such as " 9 " would not parse, so trim before casting
    let column = match column.dtype() {
        DataType::String => {
            let trimmed: StringChunked = column
                .str()
                .map_err(|e| MissingReason::Attribute(layer.kind(), attribute.to_string(), e.to_string()))?
                .into_iter()
                .map(|v| v.map(str::trim))
                .collect();
            Column::from(trimmed.into_series())
        }
        _ => column.clone(),
    };

    // Non-strict cast: "12.5" parses, "n/a" turns into null
    let as_float = column
        .cast(&DataType::Float64)
        .map_err(|e| MissingReason::Attribute(layer.kind(), attribute.to_string(), e.to_string()))?;
    let values = as_float
        .f64()
        .map_err(|e| MissingReason::Attribute(layer.kind(), attribute.to_string(), e.to_string()))?;

    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Normalize a free-text category: trimmed, case-folded, `None` if blank
pub fn normalize_category(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Distinct normalized categories
pub fn distinct_categories<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> FxHashSet<String> {
    values
        .into_iter()
        .flatten()
        .filter_map(normalize_category)
        .collect()
}

/// Mean of the present values, `None` if there are none
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
