//! Order synchronization between the primary and prevalence datasets.
//!
//! The prevalence dataset is fetched independently, so its natural order
//! drifts from the primary dataset whenever the primary re-sorts. Before
//! rendering, the prevalence rows are re-sorted to mirror the primary's
//! disease order.

use std::collections::HashMap;

use careboard_models::ChartRow;

/// Sorts a copy of `secondary` into the disease order of the primary
/// dataset.
///
/// Primary diseases rank by position, starting at 1. Diseases missing from
/// `primary_order` take rank 0 and sort to the front; their relative order
/// among themselves is whatever the input had, nothing stronger. An empty
/// `primary_order` returns the input unchanged.
#[must_use]
pub fn reorder(secondary: &[ChartRow], primary_order: &[String]) -> Vec<ChartRow> {
    if primary_order.is_empty() {
        return secondary.to_vec();
    }

    let rank: HashMap<&str, usize> = primary_order
        .iter()
        .enumerate()
        .map(|(position, name)| (name.as_str(), position + 1))
        .collect();

    let mut sorted = secondary.to_vec();
    sorted.sort_by_key(|row| rank.get(row.key.as_str()).copied().unwrap_or(0));
    sorted
}
