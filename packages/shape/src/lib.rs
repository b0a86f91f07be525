#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Row shaping for chart consumption.
//!
//! The occurrence endpoints return long-form records, one per
//! disease/demographic (or date/disease) pair. Charts want wide rows: one
//! row per key with one numeric column per series. [`shape`] performs that
//! pivot; the [`order`] module keeps a dependent dataset's row order in
//! step with the primary one.

use std::collections::HashMap;

use careboard_models::{Category, ChartRow, KeyColumn, RawRow};

pub mod order;

/// Pivots long-form payload rows into chart-ready wide rows.
///
/// Rows group under the category's key column in first-encounter order;
/// the shaper never sorts. Within a group, each record writes its count
/// into the column named by its series label, and a later record for the
/// same column overwrites the earlier one. That overwrite is contractual:
/// downstream consumers rely on duplicate records replacing, not summing.
///
/// A record with no series label counts toward the single unnamed `count`
/// column. Categories with a declared column set drop series outside that
/// set, so shaped rows never carry unexpected columns. Columns no record
/// supplied stay absent rather than filling with zero; charts render
/// absence as a gap, which is observably different from a zero count.
#[must_use]
pub fn shape(rows: &[RawRow], category: Category) -> Vec<ChartRow> {
    let key_column = category.key_column();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut shaped: Vec<ChartRow> = Vec::new();

    for row in rows {
        let key = match key_column {
            KeyColumn::Disease => row.disease.as_deref(),
            KeyColumn::Date => row.date.as_deref(),
        };
        let Some(key) = key else {
            log::warn!("{category}: dropping row without a {key_column} value");
            continue;
        };

        let slot = if let Some(&slot) = index.get(key) {
            slot
        } else {
            shaped.push(ChartRow::new(key_column, key.to_string()));
            index.insert(key.to_string(), shaped.len() - 1);
            shaped.len() - 1
        };

        let series = match category {
            Category::Time => row.disease.as_deref(),
            _ => row.demographic.as_deref(),
        }
        .unwrap_or("count");

        if category.has_fixed_columns() && !category.columns().contains(&series) {
            log::debug!("{category}: ignoring series {series:?} outside the declared columns");
            continue;
        }

        shaped[slot].set(series, row.count.clone());
    }

    shaped
}
