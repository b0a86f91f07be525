//! Refresh planning.
//!
//! Filter changes arrive as a [`FilterDiff`]; the plan decides which
//! queries actually re-run. The policy is deliberately a pure function so
//! it can be tested as a table instead of being implied by view wiring.

use careboard_models::FilterDiff;

/// Which queries a filter change requires re-running.
///
/// The prevalence query never appears here: it follows the primary
/// dataset's contents, not the filter state, and re-runs whenever the
/// primary dataset is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshPlan {
    /// Re-fetch the disease catalog (and reseed the selection).
    pub catalog: bool,
    /// Re-fetch the categorized primary dataset.
    pub primary: bool,
    /// Re-fetch the temporal dataset.
    pub temporal: bool,
}

impl RefreshPlan {
    /// Plan for a first load: everything fetches.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            catalog: true,
            primary: true,
            temporal: true,
        }
    }

    /// Derives the plan for one filter change.
    ///
    /// The catalog belongs to the data source and re-runs only when the
    /// source changes. The data queries re-run when any parameter they
    /// embed changes; that includes a source change, since the catalog
    /// reseed alone does not refresh their rows.
    #[must_use]
    pub const fn for_diff(diff: FilterDiff) -> Self {
        let data = diff.category
            || diff.window
            || diff.data_source
            || diff.sort_key
            || diff.sort_order
            || diff.page
            || diff.page_size
            || diff.selection
            || diff.time_bucket
            || diff.year_range;

        Self {
            catalog: diff.data_source,
            primary: data,
            temporal: data,
        }
    }

    /// Whether the plan runs nothing at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !(self.catalog || self.primary || self.temporal)
    }
}
