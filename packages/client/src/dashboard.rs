//! View-level orchestration.
//!
//! A [`Dashboard`] owns the datasets behind one view and the filter state
//! that parameterizes them. Filter updates are diffed into a refresh plan,
//! the planned queries run, and each dataset slot decides whether the
//! arriving result is still current. A failed query is logged and reported
//! but never clears data: the view keeps rendering the last successful
//! dataset until a later change fetches a fresh one.

use std::sync::Arc;

use careboard_api::{ApiRequest, QueryKind};
use careboard_models::{
    CATEGORIZED_SHORTLIST, Category, ChartRow, FilterError, FilterState, TEMPORAL_SHORTLIST,
    seed_selection,
};
use careboard_shape::{order::reorder, shape};

use crate::payload;
use crate::refresh::RefreshPlan;
use crate::slot::Slot;
use crate::{ApiTransport, FetchError};

/// Which of the two dashboard views an orchestrator serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Categorized occurrence view: primary dataset plus the prevalence
    /// dataset that mirrors it.
    Categorized,
    /// Temporal trends view.
    Temporal,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Queries whose dataset was replaced.
    pub replaced: Vec<QueryKind>,
    /// Queries that failed, with the error each surfaced.
    pub failures: Vec<(QueryKind, FetchError)>,
}

impl RefreshReport {
    /// Whether every planned query succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn applied(&mut self, kind: QueryKind, rows: usize) {
        log::info!("{kind}: dataset replaced ({rows} rows)");
        self.replaced.push(kind);
    }

    fn failed(&mut self, kind: QueryKind, error: FetchError) {
        log::error!("{kind}: {error}");
        self.failures.push((kind, error));
    }
}

/// Orchestrates the queries and datasets behind one dashboard view.
pub struct Dashboard {
    transport: Arc<dyn ApiTransport>,
    view: ViewKind,
    shortlist: &'static [&'static str],
    filters: FilterState,
    catalog: Slot<Vec<String>>,
    primary: Slot<Vec<ChartRow>>,
    secondary: Slot<Vec<ChartRow>>,
    temporal: Slot<Vec<ChartRow>>,
}

impl Dashboard {
    /// Creates the categorized occurrence view with its default filters.
    #[must_use]
    pub fn categorized(transport: Arc<dyn ApiTransport>) -> Self {
        Self::assemble(
            transport,
            ViewKind::Categorized,
            FilterState::categorized(),
            CATEGORIZED_SHORTLIST,
        )
    }

    /// Creates the temporal trends view with its default filters.
    #[must_use]
    pub fn temporal(transport: Arc<dyn ApiTransport>) -> Self {
        Self::assemble(
            transport,
            ViewKind::Temporal,
            FilterState::temporal(),
            TEMPORAL_SHORTLIST,
        )
    }

    /// Creates a view from explicit filters.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if the filters are invalid for the view.
    pub fn with_filters(
        transport: Arc<dyn ApiTransport>,
        view: ViewKind,
        filters: FilterState,
        shortlist: &'static [&'static str],
    ) -> Result<Self, FilterError> {
        validate_for(view, &filters)?;
        Ok(Self::assemble(transport, view, filters, shortlist))
    }

    fn assemble(
        transport: Arc<dyn ApiTransport>,
        view: ViewKind,
        filters: FilterState,
        shortlist: &'static [&'static str],
    ) -> Self {
        Self {
            transport,
            view,
            shortlist,
            filters,
            catalog: Slot::new(),
            primary: Slot::new(),
            secondary: Slot::new(),
            temporal: Slot::new(),
        }
    }

    /// Which view this orchestrator serves.
    #[must_use]
    pub const fn view(&self) -> ViewKind {
        self.view
    }

    /// The filters the current datasets were fetched under.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Disease catalog of the active data source.
    #[must_use]
    pub fn catalog(&self) -> &[String] {
        self.catalog.value().map_or(&[], Vec::as_slice)
    }

    /// The categorized primary dataset, shaped and in backend order.
    #[must_use]
    pub fn primary_dataset(&self) -> &[ChartRow] {
        self.primary.value().map_or(&[], Vec::as_slice)
    }

    /// The prevalence dataset, re-sorted to mirror the primary dataset's
    /// current row order.
    ///
    /// Mirroring happens at read time, so a prevalence refresh still in
    /// flight can never put a stale order on screen.
    #[must_use]
    pub fn secondary_dataset(&self) -> Vec<ChartRow> {
        let order: Vec<String> = self
            .primary_dataset()
            .iter()
            .map(|row| row.key.clone())
            .collect();
        reorder(self.secondary.value().map_or(&[], Vec::as_slice), &order)
    }

    /// The temporal dataset, one row per date bucket.
    #[must_use]
    pub fn temporal_dataset(&self) -> &[ChartRow] {
        self.temporal.value().map_or(&[], Vec::as_slice)
    }

    /// Performs the initial load: catalog first, then the view's data.
    pub async fn initialize(&mut self) -> RefreshReport {
        self.execute(RefreshPlan::full()).await
    }

    /// Applies a filter change and re-runs exactly the queries it affects.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if `next` is invalid for this view; the
    /// current filters and datasets are left untouched.
    pub async fn update_filters(
        &mut self,
        next: FilterState,
    ) -> Result<RefreshReport, FilterError> {
        validate_for(self.view, &next)?;

        let diff = next.diff(&self.filters);
        self.filters = next;
        Ok(self.execute(RefreshPlan::for_diff(diff)).await)
    }

    /// Runs a refresh plan. The catalog settles first so a reseeded
    /// selection feeds the same cycle's data query.
    async fn execute(&mut self, plan: RefreshPlan) -> RefreshReport {
        let mut report = RefreshReport::default();

        if plan.catalog {
            self.refresh_catalog(&mut report).await;
        }

        match self.view {
            ViewKind::Categorized => {
                if plan.primary {
                    self.refresh_primary(&mut report).await;
                }
            }
            ViewKind::Temporal => {
                if plan.temporal {
                    self.refresh_temporal(&mut report).await;
                }
            }
        }

        report
    }

    async fn refresh_catalog(&mut self, report: &mut RefreshReport) {
        let ticket = self.catalog.begin();
        let request = ApiRequest::disease_names(self.filters.data_source);

        match self
            .transport
            .get_json(&request)
            .await
            .and_then(payload::parse_names)
        {
            Ok(names) => {
                let seeded = seed_selection(self.shortlist, &names);
                let count = names.len();
                if self.catalog.commit(ticket, names) {
                    log::info!(
                        "{}: {count} diseases for {}",
                        QueryKind::DiseaseNames,
                        self.filters.data_source
                    );
                    self.filters.selection = seeded;
                    report.replaced.push(QueryKind::DiseaseNames);
                }
            }
            Err(error) => report.failed(QueryKind::DiseaseNames, error),
        }
    }

    async fn refresh_primary(&mut self, report: &mut RefreshReport) {
        let ticket = self.primary.begin();
        let request = ApiRequest::chart_data(&self.filters);

        match self
            .transport
            .get_json(&request)
            .await
            .and_then(|body| payload::parse_rows(QueryKind::ChartData, body))
        {
            Ok(rows) => {
                let shaped = shape(&rows, self.filters.category);
                let count = shaped.len();
                if self.primary.commit(ticket, shaped) {
                    report.applied(QueryKind::ChartData, count);
                    self.refresh_secondary(report).await;
                }
            }
            Err(error) => report.failed(QueryKind::ChartData, error),
        }
    }

    /// Prevalence targets the diseases actually present in the primary
    /// dataset: backend filtering and pagination may have dropped or
    /// reordered entries relative to the selection that was requested.
    async fn refresh_secondary(&mut self, report: &mut RefreshReport) {
        let diseases: Vec<String> = self
            .primary_dataset()
            .iter()
            .map(|row| row.key.clone())
            .collect();
        if diseases.is_empty() {
            log::debug!(
                "{}: primary dataset is empty, nothing to mirror",
                QueryKind::Prevalence
            );
            return;
        }

        let ticket = self.secondary.begin();
        let request = ApiRequest::prevalence(self.filters.category, &diseases);

        match self
            .transport
            .get_json(&request)
            .await
            .and_then(|body| payload::parse_rows(QueryKind::Prevalence, body))
        {
            Ok(rows) => {
                let shaped = shape(&rows, self.filters.category);
                let count = shaped.len();
                if self.secondary.commit(ticket, shaped) {
                    report.applied(QueryKind::Prevalence, count);
                }
            }
            Err(error) => report.failed(QueryKind::Prevalence, error),
        }
    }

    async fn refresh_temporal(&mut self, report: &mut RefreshReport) {
        let ticket = self.temporal.begin();
        let request = ApiRequest::temporal_chart_data(&self.filters);

        match self
            .transport
            .get_json(&request)
            .await
            .and_then(|body| payload::parse_rows(QueryKind::TemporalChartData, body))
        {
            Ok(rows) => {
                // Temporal payloads are date-keyed regardless of which
                // category the query carried.
                let shaped = shape(&rows, Category::Time);
                let count = shaped.len();
                if self.temporal.commit(ticket, shaped) {
                    report.applied(QueryKind::TemporalChartData, count);
                }
            }
            Err(error) => report.failed(QueryKind::TemporalChartData, error),
        }
    }
}

fn validate_for(view: ViewKind, filters: &FilterState) -> Result<(), FilterError> {
    match view {
        ViewKind::Categorized => filters.validate(),
        ViewKind::Temporal => filters.validate_temporal(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use careboard_models::{DataSource, DiseaseSelection};
    use serde_json::{Value, json};

    use super::*;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<HashMap<QueryKind, VecDeque<Result<Value, FetchError>>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        fn respond(self, kind: QueryKind, result: Result<Value, FetchError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(kind)
                .or_default()
                .push_back(result);
            self
        }

        fn requests_for(&self, kind: QueryKind) -> Vec<ApiRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|request| request.kind == kind)
                .cloned()
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl ApiTransport for ScriptedTransport {
        async fn get_json(&self, request: &ApiRequest) -> Result<Value, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .get_mut(&request.kind)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("no scripted response left for {}", request.kind))
        }
    }

    fn catalog_body() -> Value {
        json!(["asthma", "covid-19", "scurvy"])
    }

    fn gender_body() -> Value {
        json!([
            {"disease": "asthma", "demographic": "male", "count": 10},
            {"disease": "asthma", "demographic": "female", "count": 7},
            {"disease": "covid-19", "demographic": "male", "count": 3},
        ])
    }

    fn prevalence_body() -> Value {
        json!([
            {"disease": "covid-19", "demographic": "male", "count": 120},
            {"disease": "asthma", "demographic": "male", "count": 55},
        ])
    }

    #[tokio::test]
    async fn initialize_loads_catalog_primary_and_prevalence() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());

        let report = dashboard.initialize().await;

        assert!(report.is_clean());
        assert_eq!(dashboard.catalog(), &["asthma", "covid-19", "scurvy"]);
        assert_eq!(
            dashboard.filters().selection,
            DiseaseSelection::Only(vec!["asthma".to_string(), "covid-19".to_string()])
        );

        // The seeded selection fed the primary query of the same cycle.
        let chart_requests = transport.requests_for(QueryKind::ChartData);
        assert_eq!(chart_requests.len(), 1);
        assert_eq!(
            chart_requests[0].param("selectedDiseases"),
            Some("asthma,covid-19")
        );

        assert_eq!(
            serde_json::to_value(dashboard.primary_dataset()).unwrap(),
            json!([
                {"disease": "asthma", "male": 10, "female": 7},
                {"disease": "covid-19", "male": 3},
            ])
        );

        // Prevalence queried the diseases the primary actually returned.
        let prevalence_requests = transport.requests_for(QueryKind::Prevalence);
        assert_eq!(prevalence_requests.len(), 1);
        assert_eq!(
            prevalence_requests[0].param("selectedDiseases"),
            Some("asthma,covid-19")
        );
    }

    #[tokio::test]
    async fn secondary_dataset_mirrors_primary_order() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;

        // The prevalence payload arrived covid-first; the view re-sorts it
        // into the primary's order.
        let keys: Vec<String> = dashboard
            .secondary_dataset()
            .iter()
            .map(|row| row.key.clone())
            .collect();
        assert_eq!(keys, vec!["asthma", "covid-19"]);
    }

    #[tokio::test]
    async fn page_change_skips_the_catalog() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;

        let mut next = dashboard.filters().clone();
        next.page = 2;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(transport.requests_for(QueryKind::DiseaseNames).len(), 1);
        let chart_requests = transport.requests_for(QueryKind::ChartData);
        assert_eq!(chart_requests.len(), 2);
        assert_eq!(chart_requests[1].param("page"), Some("2"));
    }

    #[tokio::test]
    async fn source_change_refetches_catalog_and_reseeds() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(
                    QueryKind::DiseaseNames,
                    Ok(json!(["diabetes", "mental illness", "rickets"])),
                )
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;

        let mut next = dashboard.filters().clone();
        next.data_source = DataSource::Github;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(
            dashboard.catalog(),
            &["diabetes", "mental illness", "rickets"]
        );
        assert_eq!(
            dashboard.filters().selection,
            DiseaseSelection::Only(vec!["diabetes".to_string(), "mental illness".to_string()])
        );

        let name_requests = transport.requests_for(QueryKind::DiseaseNames);
        assert_eq!(name_requests.len(), 2);
        assert_eq!(name_requests[1].param("dataSource"), Some("github"));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_last_dataset() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::ChartData, Err(FetchError::Server { status: 500 }))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;
        let before = serde_json::to_value(dashboard.primary_dataset()).unwrap();

        let mut next = dashboard.filters().clone();
        next.page = 2;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(matches!(
            report.failures.as_slice(),
            [(QueryKind::ChartData, FetchError::Server { status: 500 })]
        ));
        assert_eq!(
            serde_json::to_value(dashboard.primary_dataset()).unwrap(),
            before
        );
        // A failed primary never chains a prevalence refresh.
        assert_eq!(transport.requests_for(QueryKind::Prevalence).len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_counts_as_failure() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::ChartData, Ok(json!({"rows": []})))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;

        let mut next = dashboard.filters().clone();
        next.page = 2;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(matches!(
            report.failures.as_slice(),
            [(QueryKind::ChartData, FetchError::Malformed { .. })]
        ));
        assert!(!dashboard.primary_dataset().is_empty());
    }

    #[tokio::test]
    async fn empty_primary_skips_prevalence() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(json!([]))),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        let report = dashboard.initialize().await;

        assert!(report.is_clean());
        assert!(dashboard.primary_dataset().is_empty());
        assert!(dashboard.secondary_dataset().is_empty());
        assert!(transport.requests_for(QueryKind::Prevalence).is_empty());
    }

    #[tokio::test]
    async fn unchanged_filters_run_nothing() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;
        let issued = transport.requests.lock().unwrap().len();

        let same = dashboard.filters().clone();
        let report = dashboard.update_filters(same).await.unwrap();

        assert!(report.replaced.is_empty());
        assert!(report.is_clean());
        assert_eq!(transport.requests.lock().unwrap().len(), issued);
    }

    #[tokio::test]
    async fn catalog_failure_keeps_catalog_and_selection() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::DiseaseNames, Err(FetchError::Server { status: 503 }))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());
        dashboard.initialize().await;
        let seeded = dashboard.filters().selection.clone();

        let mut next = dashboard.filters().clone();
        next.data_source = DataSource::Wikipedia;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(matches!(
            report.failures.as_slice(),
            [(QueryKind::DiseaseNames, FetchError::Server { status: 503 })]
        ));
        assert_eq!(dashboard.catalog(), &["asthma", "covid-19", "scurvy"]);
        assert_eq!(dashboard.filters().selection, seeded);

        // The data query still ran, against the new source.
        let chart_requests = transport.requests_for(QueryKind::ChartData);
        assert_eq!(chart_requests[1].param("dataSource"), Some("wikipedia"));
    }

    #[tokio::test]
    async fn temporal_view_shapes_by_date() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(json!(["lupus", "covid-19"])))
                .respond(
                    QueryKind::TemporalChartData,
                    Ok(json!([
                        {"date": "2019", "disease": "lupus", "count": 4},
                        {"date": "2020", "disease": "lupus", "count": 9},
                        {"date": "2020", "disease": "covid-19", "count": 120},
                    ])),
                ),
        );
        let mut dashboard = Dashboard::temporal(transport.clone());
        let report = dashboard.initialize().await;

        assert!(report.is_clean());
        assert_eq!(
            dashboard.filters().selection,
            DiseaseSelection::Only(vec!["lupus".to_string(), "covid-19".to_string()])
        );
        assert_eq!(
            serde_json::to_value(dashboard.temporal_dataset()).unwrap(),
            json!([
                {"date": "2019", "lupus": 4},
                {"date": "2020", "lupus": 9, "covid-19": 120},
            ])
        );

        let temporal_requests = transport.requests_for(QueryKind::TemporalChartData);
        assert_eq!(temporal_requests[0].param("category"), Some("total"));
        assert_eq!(temporal_requests[0].param("timeOption"), Some("yearly"));
        assert_eq!(
            temporal_requests[0].param("selectedDiseases"),
            Some("lupus,covid-19")
        );
    }

    #[tokio::test]
    async fn temporal_view_rejects_the_pile() {
        let transport = Arc::new(ScriptedTransport::default());
        let mut dashboard = Dashboard::temporal(transport.clone());

        let mut next = dashboard.filters().clone();
        next.data_source = DataSource::Pile;
        let error = dashboard.update_filters(next).await.unwrap_err();

        assert_eq!(
            error,
            FilterError::TemporalUnsupported {
                source: DataSource::Pile,
            }
        );
        assert_eq!(dashboard.filters().data_source, DataSource::Arxiv);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn categorized_view_accepts_the_pile() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .respond(QueryKind::DiseaseNames, Ok(catalog_body()))
                .respond(QueryKind::ChartData, Ok(gender_body()))
                .respond(QueryKind::Prevalence, Ok(prevalence_body())),
        );
        let mut dashboard = Dashboard::categorized(transport.clone());

        let mut next = dashboard.filters().clone();
        next.data_source = DataSource::Pile;
        let report = dashboard.update_filters(next).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(
            transport.requests_for(QueryKind::DiseaseNames)[0].param("dataSource"),
            Some("pile")
        );
    }
}
