#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query construction for the remote occurrence API.
//!
//! Builds the exact paths and query parameters the API expects from a
//! [`FilterState`]. Construction is pure: nothing here performs I/O, and
//! nothing here clamps or repairs filters, so a request always reflects
//! precisely the state it was built from.

use careboard_models::{Category, DataSource, DiseaseSelection, FilterState};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The four queries the dashboard issues.
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
pub enum QueryKind {
    /// Catalog of disease names available in a data source.
    DiseaseNames,
    /// Primary dataset: occurrence counts broken down by category.
    ChartData,
    /// Secondary dataset: prevalence rates for the diseases on display.
    Prevalence,
    /// Temporal dataset: occurrence over time.
    TemporalChartData,
}

impl QueryKind {
    /// Returns the endpoint path for this query.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::DiseaseNames => "/get-disease-names",
            Self::ChartData => "/get-chart-data",
            Self::Prevalence => "/get-prevalence",
            Self::TemporalChartData => "/get-temporal-chart-data",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::DiseaseNames,
            Self::ChartData,
            Self::Prevalence,
            Self::TemporalChartData,
        ]
    }
}

/// A fully specified GET request: endpoint plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Which query this request performs.
    pub kind: QueryKind,
    /// Query parameters in wire order.
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    /// Returns the endpoint path for this request.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.kind.path()
    }

    /// Builds the disease catalog query for one data source.
    #[must_use]
    pub fn disease_names(source: DataSource) -> Self {
        Self {
            kind: QueryKind::DiseaseNames,
            params: vec![("dataSource".to_string(), source.to_string())],
        }
    }

    /// Builds the primary dataset query.
    #[must_use]
    pub fn chart_data(filters: &FilterState) -> Self {
        let mut params = vec![
            ("category".to_string(), filters.category.to_string()),
            ("selectedWindow".to_string(), filters.window.to_string()),
            ("sortKey".to_string(), filters.sort_key.clone()),
            ("sortOrder".to_string(), filters.sort_order.to_string()),
            ("page".to_string(), filters.page.to_string()),
            ("per_page".to_string(), filters.page_size.to_string()),
        ];
        push_selection(&mut params, &filters.selection);
        params.push(("dataSource".to_string(), filters.data_source.to_string()));

        Self {
            kind: QueryKind::ChartData,
            params,
        }
    }

    /// Builds the prevalence query for the diseases currently on display.
    ///
    /// Unlike the primary query, the disease list here is always explicit:
    /// it echoes the rows of the primary dataset, never a filter.
    #[must_use]
    pub fn prevalence(category: Category, diseases: &[String]) -> Self {
        Self {
            kind: QueryKind::Prevalence,
            params: vec![
                ("category".to_string(), category.to_string()),
                ("selectedDiseases".to_string(), diseases.join(",")),
            ],
        }
    }

    /// Builds the temporal dataset query.
    #[must_use]
    pub fn temporal_chart_data(filters: &FilterState) -> Self {
        let mut params = vec![
            ("category".to_string(), filters.category.to_string()),
            ("timeOption".to_string(), filters.time_bucket.to_string()),
            ("sortKey".to_string(), filters.sort_key.clone()),
            ("sortOrder".to_string(), filters.sort_order.to_string()),
            ("startYear".to_string(), filters.year_start.to_string()),
            ("endYear".to_string(), filters.year_end.to_string()),
        ];
        push_selection(&mut params, &filters.selection);
        params.push(("dataSource".to_string(), filters.data_source.to_string()));

        Self {
            kind: QueryKind::TemporalChartData,
            params,
        }
    }

    /// Returns the value of the first parameter named `key`, if present.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Appends the `selectedDiseases` parameter, or omits it entirely for the
/// unfiltered selection. An explicitly empty selection still sends the
/// parameter with an empty value; the API distinguishes the two.
fn push_selection(params: &mut Vec<(String, String)>, selection: &DiseaseSelection) {
    if let Some(value) = selection.as_param() {
        params.push(("selectedDiseases".to_string(), value));
    }
}

#[cfg(test)]
mod tests {
    use careboard_models::{SampleWindow, SortOrder, TimeBucket};

    use super::*;

    #[test]
    fn kind_paths() {
        assert_eq!(QueryKind::DiseaseNames.path(), "/get-disease-names");
        assert_eq!(QueryKind::ChartData.path(), "/get-chart-data");
        assert_eq!(QueryKind::Prevalence.path(), "/get-prevalence");
        assert_eq!(
            QueryKind::TemporalChartData.path(),
            "/get-temporal-chart-data"
        );
    }

    #[test]
    fn disease_names_carries_source_only() {
        let request = ApiRequest::disease_names(DataSource::Wikipedia);
        assert_eq!(request.path(), "/get-disease-names");
        assert_eq!(
            request.params,
            vec![("dataSource".to_string(), "wikipedia".to_string())]
        );
    }

    #[test]
    fn chart_data_params_in_wire_order() {
        let mut filters = FilterState::categorized();
        filters.window = SampleWindow::Window50;
        filters.sort_key = "female".to_string();
        filters.sort_order = SortOrder::Desc;
        filters.page = 2;
        filters.page_size = 25;
        filters.data_source = DataSource::Github;
        filters.selection =
            DiseaseSelection::Only(vec!["asthma".to_string(), "covid-19".to_string()]);

        let request = ApiRequest::chart_data(&filters);
        assert_eq!(
            request.params,
            vec![
                ("category".to_string(), "gender".to_string()),
                ("selectedWindow".to_string(), "window_50".to_string()),
                ("sortKey".to_string(), "female".to_string()),
                ("sortOrder".to_string(), "desc".to_string()),
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "25".to_string()),
                ("selectedDiseases".to_string(), "asthma,covid-19".to_string()),
                ("dataSource".to_string(), "github".to_string()),
            ]
        );
    }

    #[test]
    fn unfiltered_selection_omits_the_parameter() {
        let filters = FilterState::categorized();
        let request = ApiRequest::chart_data(&filters);
        assert_eq!(request.param("selectedDiseases"), None);
        assert_eq!(request.param("dataSource"), Some("arxiv"));
    }

    #[test]
    fn explicit_empty_selection_sends_empty_value() {
        let mut filters = FilterState::categorized();
        filters.selection = DiseaseSelection::Only(vec![]);
        let request = ApiRequest::chart_data(&filters);
        assert_eq!(request.param("selectedDiseases"), Some(""));
    }

    #[test]
    fn prevalence_echoes_displayed_diseases() {
        let request = ApiRequest::prevalence(
            Category::Gender,
            &["asthma".to_string(), "covid-19".to_string()],
        );
        assert_eq!(
            request.params,
            vec![
                ("category".to_string(), "gender".to_string()),
                ("selectedDiseases".to_string(), "asthma,covid-19".to_string()),
            ]
        );
    }

    #[test]
    fn temporal_params_in_wire_order() {
        let mut filters = FilterState::temporal();
        filters.time_bucket = TimeBucket::Monthly;
        filters.year_start = 2015;
        filters.year_end = 2020;
        filters.selection = DiseaseSelection::Only(vec!["lupus".to_string()]);

        let request = ApiRequest::temporal_chart_data(&filters);
        assert_eq!(
            request.params,
            vec![
                ("category".to_string(), "total".to_string()),
                ("timeOption".to_string(), "monthly".to_string()),
                ("sortKey".to_string(), "disease".to_string()),
                ("sortOrder".to_string(), "asc".to_string()),
                ("startYear".to_string(), "2015".to_string()),
                ("endYear".to_string(), "2020".to_string()),
                ("selectedDiseases".to_string(), "lupus".to_string()),
                ("dataSource".to_string(), "arxiv".to_string()),
            ]
        );
    }
}
