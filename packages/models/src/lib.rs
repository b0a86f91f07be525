#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Filter state, category taxonomy, and chart row models.
//!
//! This crate defines the canonical vocabulary shared across the careboard
//! pipeline: the demographic categories and their column sets, the data
//! source and sampling options the remote API understands, the filter state
//! that drives every query, and the wide row shape the charts consume.

use chrono::Datelike as _;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Earliest year the temporal endpoints hold data for.
pub const MIN_QUERY_YEAR: i32 = 2000;

/// Number of years a fresh temporal view looks back from the current year.
pub const DEFAULT_YEAR_SPAN: i32 = 10;

/// Default number of diseases per page of the primary dataset.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Diseases preferred by the categorized view when seeding a selection
/// from a freshly fetched catalog.
// " mi " (myocardial infarction) is stored padded in the upstream catalogs.
pub const CATEGORIZED_SHORTLIST: &[&str] = &[
    " mi ",
    "arthritis",
    "asthma",
    "bronchitis",
    "cardiovascular disease",
    "chronic kidney disease",
    "coronary artery disease",
    "covid-19",
    "deafness",
    "diabetes",
    "hypertension",
    "liver failure",
    "mental illness",
    "perforated ulcer",
    "visual anomalies",
];

/// Diseases preferred by the temporal view when seeding a selection.
pub const TEMPORAL_SHORTLIST: &[&str] = &[
    "lupus",
    "mental illness",
    "suicide",
    "ibs",
    "tuberculoses",
    "diabetes",
    "sarcoidoses",
    "pneumonia",
    " mi ",
    "covid-19",
    "dementia",
    "multiple sclerosis",
    "infection",
];

/// Demographic breakdown requested from the occurrence endpoints.
///
/// Each category determines both the key column rows are grouped under and
/// the set of value columns a shaped row may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Overall occurrence counts, one value column.
    Total,
    /// Male/female breakdown.
    Gender,
    /// Breakdown across six racial demographic groups.
    Racial,
    /// Drug-association breakdown; the column set is source-defined.
    Drug,
    /// Occurrence over time; rows are keyed by date and the columns are
    /// disease names.
    Time,
}

impl Category {
    /// Returns the column rows of this category are keyed under.
    #[must_use]
    pub const fn key_column(self) -> KeyColumn {
        match self {
            Self::Time => KeyColumn::Date,
            _ => KeyColumn::Disease,
        }
    }

    /// Returns the declared value columns for this category.
    ///
    /// An empty slice means the column set is open-ended: whatever series
    /// names the payload carries pass through unfiltered.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Total => &["count"],
            Self::Gender => &["male", "female"],
            Self::Racial => &[
                "white/caucasian",
                "black/african american",
                "asian",
                "hispanic/latino",
                "pacific islander",
                "native american/indigenous",
            ],
            Self::Drug | Self::Time => &[],
        }
    }

    /// Whether this category declares a closed column set.
    #[must_use]
    pub const fn has_fixed_columns(self) -> bool {
        !self.columns().is_empty()
    }

    /// Returns the column names rows of this category may be sorted by.
    ///
    /// The key column always sorts; declared value columns sort as well.
    #[must_use]
    pub fn sort_keys(self) -> Vec<&'static str> {
        let mut keys = vec![self.key_column().as_str()];
        keys.extend_from_slice(self.columns());
        keys
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Total,
            Self::Gender,
            Self::Racial,
            Self::Drug,
            Self::Time,
        ]
    }
}

/// The column a shaped row is keyed under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyColumn {
    /// Rows keyed by disease name.
    Disease,
    /// Rows keyed by date bucket.
    Date,
}

impl KeyColumn {
    /// Returns the wire name of this key column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Date => "date",
        }
    }
}

/// Sampling window an occurrence count was aggregated over.
///
/// Wire names are fixed identifiers, not derived from the variant names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SampleWindow {
    /// No windowing; counts cover the whole corpus.
    #[serde(rename = "total")]
    #[strum(serialize = "total")]
    Total,
    /// 10-token context window.
    #[serde(rename = "window_10")]
    #[strum(serialize = "window_10")]
    Window10,
    /// 50-token context window.
    #[serde(rename = "window_50")]
    #[strum(serialize = "window_50")]
    Window50,
    /// 100-token context window.
    #[serde(rename = "window_100")]
    #[strum(serialize = "window_100")]
    Window100,
    /// 250-token context window.
    #[serde(rename = "window_250")]
    #[strum(serialize = "window_250")]
    Window250,
}

impl SampleWindow {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Total,
            Self::Window10,
            Self::Window50,
            Self::Window100,
            Self::Window250,
        ]
    }
}

/// Granularity of temporal aggregation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeBucket {
    /// One data point per month.
    Monthly,
    /// One data point per year.
    Yearly,
    /// One data point per five-year span.
    FiveYearly,
}

impl TimeBucket {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Monthly, Self::Yearly, Self::FiveYearly]
    }
}

/// Corpus the occurrence counts are drawn from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataSource {
    /// arXiv preprints.
    Arxiv,
    /// GitHub public repositories.
    Github,
    /// English Wikipedia.
    Wikipedia,
    /// Stack Exchange network dumps.
    Stackexchange,
    /// The Pile snapshot corpus.
    Pile,
}

impl DataSource {
    /// Whether this source aggregates counts per sample window.
    ///
    /// The Pile is a fixed snapshot and carries a single unwindowed count.
    #[must_use]
    pub const fn supports_windows(self) -> bool {
        !matches!(self, Self::Pile)
    }

    /// Whether this source provides temporal occurrence data.
    #[must_use]
    pub const fn supports_temporal(self) -> bool {
        !matches!(self, Self::Pile)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Arxiv,
            Self::Github,
            Self::Wikipedia,
            Self::Stackexchange,
            Self::Pile,
        ]
    }
}

/// Direction the primary dataset is sorted in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// The set of diseases a query is restricted to.
///
/// `All` omits the restriction entirely, which the API treats as "no
/// filter". `Only` always sends an explicit list, even an empty one; the
/// two are distinct requests and must never collapse into each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiseaseSelection {
    /// No restriction; the query parameter is omitted.
    #[default]
    All,
    /// Restrict to exactly these diseases (comma-joined on the wire).
    Only(Vec<String>),
}

impl DiseaseSelection {
    /// Returns the wire value for the `selectedDiseases` parameter, or
    /// `None` when the parameter should be omitted.
    #[must_use]
    pub fn as_param(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Only(names) => Some(names.join(",")),
        }
    }

    /// Returns the explicit disease list, if any.
    #[must_use]
    pub fn names(&self) -> Option<&[String]> {
        match self {
            Self::All => None,
            Self::Only(names) => Some(names),
        }
    }

    /// Builds an explicit selection from a comma-separated list.
    ///
    /// Blank entries are dropped, but surviving names keep their
    /// surrounding whitespace: some catalogs store padded names. An
    /// entirely blank input is the explicit empty selection, not `All`.
    #[must_use]
    pub fn explicit(raw: &str) -> Self {
        let names: Vec<String> = raw
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(ToString::to_string)
            .collect();
        Self::Only(names)
    }
}

/// Seeds a selection from a preferred shortlist and a fetched catalog.
///
/// Keeps the shortlist entries present in the catalog, in shortlist order.
/// An empty intersection seeds the unfiltered selection rather than an
/// explicitly empty one.
#[must_use]
pub fn seed_selection(shortlist: &[&str], catalog: &[String]) -> DiseaseSelection {
    let seeded: Vec<String> = shortlist
        .iter()
        .filter(|name| catalog.iter().any(|entry| entry == *name))
        .map(|name| (*name).to_string())
        .collect();

    if seeded.is_empty() {
        DiseaseSelection::All
    } else {
        DiseaseSelection::Only(seeded)
    }
}

/// Everything that parameterizes the dashboard's queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Demographic breakdown for the primary dataset.
    pub category: Category,
    /// Sampling window for the primary dataset.
    pub window: SampleWindow,
    /// Corpus queried.
    pub data_source: DataSource,
    /// Disease restriction.
    pub selection: DiseaseSelection,
    /// Column the primary dataset is sorted by.
    pub sort_key: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// 1-based page of the primary dataset.
    pub page: u32,
    /// Diseases per page.
    pub page_size: u32,
    /// Temporal aggregation granularity.
    pub time_bucket: TimeBucket,
    /// First year of the temporal range, inclusive.
    pub year_start: i32,
    /// Last year of the temporal range, inclusive.
    pub year_end: i32,
}

impl FilterState {
    /// Default filters for the categorized occurrence view.
    #[must_use]
    pub fn categorized() -> Self {
        Self::defaults_for(Category::Gender)
    }

    /// Default filters for the temporal trends view.
    #[must_use]
    pub fn temporal() -> Self {
        Self::defaults_for(Category::Total)
    }

    fn defaults_for(category: Category) -> Self {
        let year_end = current_year();
        Self {
            category,
            window: SampleWindow::Window250,
            data_source: DataSource::Arxiv,
            selection: DiseaseSelection::All,
            sort_key: KeyColumn::Disease.as_str().to_string(),
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            time_bucket: TimeBucket::Yearly,
            year_start: year_end - DEFAULT_YEAR_SPAN,
            year_end,
        }
    }

    /// Checks the invariants every query shares.
    ///
    /// # Errors
    ///
    /// Returns an error if the sort key is not valid for the active
    /// category, or if the year range is inverted or out of bounds.
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self
            .category
            .sort_keys()
            .iter()
            .any(|key| *key == self.sort_key)
        {
            return Err(FilterError::InvalidSortKey {
                key: self.sort_key.clone(),
                category: self.category,
            });
        }

        let max = current_year();
        if self.year_start > self.year_end
            || self.year_start < MIN_QUERY_YEAR
            || self.year_end > max
        {
            return Err(FilterError::YearRange {
                start: self.year_start,
                end: self.year_end,
                max,
            });
        }

        Ok(())
    }

    /// Checks [`Self::validate`] plus the invariants specific to temporal
    /// queries.
    ///
    /// # Errors
    ///
    /// Returns an error if general validation fails or the data source has
    /// no temporal data.
    pub fn validate_temporal(&self) -> Result<(), FilterError> {
        self.validate()?;
        if !self.data_source.supports_temporal() {
            return Err(FilterError::TemporalUnsupported {
                source: self.data_source,
            });
        }
        Ok(())
    }

    /// Records which logical fields differ from `previous`.
    #[must_use]
    pub fn diff(&self, previous: &Self) -> FilterDiff {
        FilterDiff {
            category: self.category != previous.category,
            window: self.window != previous.window,
            data_source: self.data_source != previous.data_source,
            selection: self.selection != previous.selection,
            sort_key: self.sort_key != previous.sort_key,
            sort_order: self.sort_order != previous.sort_order,
            page: self.page != previous.page,
            page_size: self.page_size != previous.page_size,
            time_bucket: self.time_bucket != previous.time_bucket,
            year_range: self.year_start != previous.year_start
                || self.year_end != previous.year_end,
        }
    }
}

/// Field-by-field comparison of two [`FilterState`]s.
///
/// The year bounds collapse into a single `year_range` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterDiff {
    /// Category changed.
    pub category: bool,
    /// Sample window changed.
    pub window: bool,
    /// Data source changed.
    pub data_source: bool,
    /// Disease selection changed.
    pub selection: bool,
    /// Sort key changed.
    pub sort_key: bool,
    /// Sort direction changed.
    pub sort_order: bool,
    /// Page changed.
    pub page: bool,
    /// Page size changed.
    pub page_size: bool,
    /// Temporal granularity changed.
    pub time_bucket: bool,
    /// Either year bound changed.
    pub year_range: bool,
}

impl FilterDiff {
    /// Whether any field changed at all.
    #[must_use]
    pub const fn any(self) -> bool {
        self.category
            || self.window
            || self.data_source
            || self.selection
            || self.sort_key
            || self.sort_order
            || self.page
            || self.page_size
            || self.time_bucket
            || self.year_range
    }
}

/// Error raised when a [`FilterState`] violates a query invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The sort key is not the key column or a declared column of the
    /// active category.
    #[error("sort key {key:?} is not valid for category {category}")]
    InvalidSortKey {
        /// The rejected sort key.
        key: String,
        /// The category it was checked against.
        category: Category,
    },

    /// The year bounds are inverted or outside the queryable range.
    #[error("year range {start}..={end} is invalid: expected {MIN_QUERY_YEAR} <= start <= end <= {max}")]
    YearRange {
        /// Requested first year.
        start: i32,
        /// Requested last year.
        end: i32,
        /// Latest queryable year.
        max: i32,
    },

    /// A temporal query was attempted against a snapshot-only source.
    #[error("data source {source} does not provide temporal data")]
    TemporalUnsupported {
        /// The rejected source.
        source: DataSource,
    },
}

/// One element of an occurrence payload, before shaping.
///
/// Payload rows are heterogeneous: categorized rows carry `disease` and
/// usually `demographic`, temporal rows carry `date` and `disease`. Every
/// field except the count is therefore optional and absent fields decode
/// as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Disease name, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    /// Date bucket label, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Demographic group label, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographic: Option<String>,
    /// Occurrence count or rate.
    pub count: Number,
}

/// One chart-ready wide row: a key plus the series values recorded for it.
///
/// Serializes to the flat object form charts consume, for example
/// `{"disease": "asthma", "male": 10, "female": 15}`. Cells keep insertion
/// order and absent series stay absent rather than appearing as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRow {
    /// Which column the key belongs under.
    pub key_column: KeyColumn,
    /// Key value (disease name or date label).
    pub key: String,
    /// Series name/value pairs in first-write order.
    pub cells: Vec<(String, Number)>,
}

impl ChartRow {
    /// Creates an empty row for the given key.
    #[must_use]
    pub const fn new(key_column: KeyColumn, key: String) -> Self {
        Self {
            key_column,
            key,
            cells: Vec::new(),
        }
    }

    /// Returns the value recorded for `series`, if any.
    #[must_use]
    pub fn get(&self, series: &str) -> Option<&Number> {
        self.cells
            .iter()
            .find(|(name, _)| name == series)
            .map(|(_, value)| value)
    }

    /// Records a value for `series`, overwriting any earlier value.
    ///
    /// The overwrite keeps the cell's original position, so repeated writes
    /// do not reorder the row.
    pub fn set(&mut self, series: &str, value: Number) {
        if let Some(cell) = self.cells.iter_mut().find(|(name, _)| name == series) {
            cell.1 = value;
        } else {
            self.cells.push((series.to_string(), value));
        }
    }
}

impl Serialize for ChartRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap as _;

        let mut map = serializer.serialize_map(Some(self.cells.len() + 1))?;
        map.serialize_entry(self.key_column.as_str(), &self.key)?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}
