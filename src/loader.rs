use crate::api::AnalyticsBackend;
use crate::config::Config;
use crate::data::UploadFile;
use crate::error::ApiError;
use crate::mock;
use crate::models::{
    ClassifierResults, Dataset, DatasetDetails, GeneExpression, HeatmapData, PcaData,
    UploadResponse, VolcanoPlotData,
};
use poll_promise::Promise;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Demo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn live(value: T) -> Self {
        Sourced {
            value,
            source: DataSource::Live,
        }
    }

    pub fn demo(value: T) -> Self {
        Sourced {
            value,
            source: DataSource::Demo,
        }
    }

    pub fn is_demo(&self) -> bool {
        self.source == DataSource::Demo
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub dataset_id: String,
    pub backend_connected: bool,
    pub genes: Sourced<Vec<GeneExpression>>,
    pub classifier: Sourced<ClassifierResults>,
    pub volcano: Option<VolcanoPlotData>,
    pub heatmap: Option<HeatmapData>,
    pub pca: Option<PcaData>,
}

impl DashboardData {
    /// What the dashboard shows when the backend is down.
    pub fn demo(dataset_id: &str) -> Self {
        DashboardData {
            dataset_id: dataset_id.to_string(),
            backend_connected: false,
            genes: Sourced::demo(mock::top_genes()),
            classifier: Sourced::demo(mock::classifier_results()),
            volcano: None,
            heatmap: None,
            pca: None,
        }
    }

    pub fn has_demo_slots(&self) -> bool {
        self.genes.is_demo() || self.classifier.is_demo()
    }
}

fn with_fallback<T>(result: Result<T, ApiError>, what: &str, fallback: fn() -> T) -> Sourced<T> {
    match result {
        Ok(value) => Sourced::live(value),
        Err(e) => {
            warn!(transient = e.is_transient(), "{} unavailable, using demo data: {}", what, e);
            Sourced::demo(fallback())
        }
    }
}

fn optional<T>(result: Result<T, ApiError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} unavailable: {}", what, e);
            None
        }
    }
}

pub async fn check_backend(backend: &dyn AnalyticsBackend) -> bool {
    match backend.health_check().await {
        Ok(status) => {
            info!(status = %status.status, "analytics backend is healthy");
            true
        }
        Err(e) => {
            warn!("analytics backend not available, using demo data: {}", e);
            false
        }
    }
}

/// One full dashboard load. Never fails: every slot either holds the live
/// payload, the demo literal, or nothing.
pub async fn load_dashboard(backend: &dyn AnalyticsBackend, dataset_id: &str) -> DashboardData {
    if !check_backend(backend).await {
        return DashboardData::demo(dataset_id);
    }

    let (genes, classifier) = tokio::join!(
        backend.get_differential_genes(dataset_id),
        backend.get_classification_results(dataset_id),
    );
    let genes = with_fallback(genes, "gene list", mock::top_genes);
    let classifier = with_fallback(classifier, "classifier results", mock::classifier_results);

    let (volcano, heatmap, pca) = tokio::join!(
        backend.get_volcano_plot_data(dataset_id),
        backend.get_heatmap_data(dataset_id),
        backend.get_pca_data(dataset_id),
    );

    DashboardData {
        dataset_id: dataset_id.to_string(),
        backend_connected: true,
        genes,
        classifier,
        volcano: optional(volcano, "volcano plot"),
        heatmap: optional(heatmap, "heatmap"),
        pca: optional(pca, "PCA"),
    }
}

pub async fn load_catalogue(backend: &dyn AnalyticsBackend) -> Sourced<Vec<Dataset>> {
    match backend.get_datasets().await {
        Ok(datasets) if !datasets.is_empty() => Sourced::live(datasets),
        Ok(_) => Sourced::demo(mock::datasets()),
        Err(e) => {
            debug!("dataset list unavailable: {}", e);
            Sourced::demo(mock::datasets())
        }
    }
}

pub async fn load_details(backend: &dyn AnalyticsBackend, dataset_id: &str) -> Sourced<DatasetDetails> {
    let details = mock::dataset_details(dataset_id);
    match backend.get_dataset_summary(dataset_id).await {
        Ok(summary) => Sourced::live(details.merge_summary(summary)),
        Err(e) => {
            debug!("summary for {} unavailable: {}", dataset_id, e);
            Sourced::demo(details)
        }
    }
}

/// Live lookup first, then the matching row of the table already on screen.
pub async fn lookup_gene(
    backend: &dyn AnalyticsBackend,
    dataset_id: &str,
    symbol: &str,
    fallback: Option<Sourced<GeneExpression>>,
) -> Option<Sourced<GeneExpression>> {
    match backend.get_gene_expression(dataset_id, symbol).await {
        Ok(gene) => Some(Sourced::live(gene)),
        Err(e) => {
            debug!("gene {} lookup failed: {}", symbol, e);
            fallback
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the view.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub kind: NoticeKind,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, body: &str) -> Self {
        Notice {
            title: title.to_string(),
            body: body.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading(String),
    Done(UploadResponse),
    Failed(String),
}

/// A spawned task and the promise it fulfils. Dropping it aborts the task,
/// so a replaced job can never deliver a result. A task that panics settles
/// the promise with an error instead of leaving it unfulfilled.
struct Pending<T: Send + 'static> {
    promise: Promise<Result<T, String>>,
    task: AbortHandle,
}

impl<T: Send + 'static> Pending<T> {
    fn spawn<F>(runtime: &Handle, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (sender, promise) = Promise::new();
        let work: JoinHandle<T> = runtime.spawn(future);
        let task = work.abort_handle();
        runtime.spawn(async move {
            sender.send(work.await.map_err(|e| e.to_string()));
        });
        Pending { promise, task }
    }

    fn ready(&self) -> Option<&Result<T, String>> {
        self.promise.ready()
    }
}

impl<T: Send + 'static> Drop for Pending<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Takes the outcome of a finished job, leaving the slot empty.
fn take_finished<T: Clone + Send + 'static>(job: &mut Option<Pending<T>>) -> Option<Result<T, String>> {
    let outcome = job.as_ref()?.ready()?.clone();
    *job = None;
    Some(outcome)
}

/// Dashboard state for the selected dataset plus the jobs that feed it.
pub struct Loader {
    runtime: Handle,
    backend: Arc<dyn AnalyticsBackend>,
    config: Config,
    dataset_id: Option<String>,
    data: Option<DashboardData>,
    backend_connected: bool,
    analysis_running: bool,
    notices: Vec<Notice>,
    analysis_delay: Option<Pending<()>>,
    dashboard: Option<Pending<DashboardData>>,
    // Whether the in-flight dashboard load is the reload that ends an analysis.
    dashboard_ends_analysis: bool,
    datasets: Sourced<Vec<Dataset>>,
    catalogue: Option<Pending<Sourced<Vec<Dataset>>>>,
    details: Option<Sourced<DatasetDetails>>,
    details_job: Option<Pending<Sourced<DatasetDetails>>>,
    gene: Option<Sourced<GeneExpression>>,
    gene_job: Option<Pending<Option<Sourced<GeneExpression>>>>,
    upload_state: UploadState,
    upload_job: Option<Pending<Result<UploadResponse, ApiError>>>,
}

impl Loader {
    pub fn new(runtime: Handle, backend: Arc<dyn AnalyticsBackend>, config: Config) -> Self {
        Loader {
            runtime,
            backend,
            config,
            dataset_id: None,
            data: None,
            backend_connected: false,
            analysis_running: false,
            notices: Vec::new(),
            analysis_delay: None,
            dashboard: None,
            dashboard_ends_analysis: false,
            datasets: Sourced::demo(mock::datasets()),
            catalogue: None,
            details: None,
            details_job: None,
            gene: None,
            gene_job: None,
            upload_state: UploadState::Idle,
            upload_job: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn data(&self) -> Option<&DashboardData> {
        self.data.as_ref()
    }

    pub fn backend_connected(&self) -> bool {
        self.backend_connected
    }

    /// True from a trigger until every fetch of that load has settled.
    pub fn is_loading(&self) -> bool {
        self.dashboard.is_some()
    }

    pub fn analysis_running(&self) -> bool {
        self.analysis_running
    }

    pub fn datasets(&self) -> &Sourced<Vec<Dataset>> {
        &self.datasets
    }

    pub fn details(&self) -> Option<&Sourced<DatasetDetails>> {
        self.details.as_ref()
    }

    pub fn gene(&self) -> Option<&Sourced<GeneExpression>> {
        self.gene.as_ref()
    }

    pub fn is_looking_up_gene(&self) -> bool {
        self.gene_job.is_some()
    }

    pub fn upload_state(&self) -> &UploadState {
        &self.upload_state
    }

    /// Nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.analysis_delay.is_none()
            && self.dashboard.is_none()
            && self.catalogue.is_none()
            && self.details_job.is_none()
            && self.gene_job.is_none()
            && self.upload_job.is_none()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn refresh_catalogue(&mut self) {
        let backend = self.backend.clone();
        self.catalogue = Some(Pending::spawn(&self.runtime, async move {
            load_catalogue(backend.as_ref()).await
        }));
    }

    /// Switches to another dataset and supersedes anything still loading for
    /// the previous one.
    pub fn select_dataset(&mut self, dataset_id: &str) {
        if self.dataset_id.as_deref() == Some(dataset_id) && self.data.is_some() {
            return;
        }
        info!(dataset = dataset_id, "dataset selected");
        self.dataset_id = Some(dataset_id.to_string());
        self.data = None;
        self.gene = None;
        self.gene_job = None;
        self.details = None;
        self.analysis_running = false;
        self.analysis_delay = None;
        self.dashboard_ends_analysis = false;

        let backend = self.backend.clone();
        let id = dataset_id.to_string();
        self.details_job = Some(Pending::spawn(&self.runtime, async move {
            load_details(backend.as_ref(), &id).await
        }));
        self.start_load(false);
    }

    pub fn reload(&mut self) {
        if self.dataset_id.is_some() {
            self.start_load(false);
        }
    }

    fn start_load(&mut self, ends_analysis: bool) {
        let Some(dataset_id) = self.dataset_id.clone() else {
            return;
        };
        // A reload that supersedes the analysis reload inherits its role.
        self.dashboard_ends_analysis =
            ends_analysis || (self.dashboard_ends_analysis && self.dashboard.is_some());
        let backend = self.backend.clone();
        // Replacing the job aborts the superseded one.
        self.dashboard = Some(Pending::spawn(&self.runtime, async move {
            load_dashboard(backend.as_ref(), &dataset_id).await
        }));
    }

    /// Waits as if a server job were running, then reloads everything.
    pub fn run_analysis(&mut self) {
        if self.analysis_running || self.dataset_id.is_none() {
            return;
        }
        self.analysis_running = true;
        self.notices.push(if self.backend_connected {
            Notice::new(
                NoticeKind::Info,
                "Analysis started",
                "The analytics backend is processing the dataset.",
            )
        } else {
            Notice::new(
                NoticeKind::Info,
                "Demo analysis",
                "Simulating the analysis with example data.",
            )
        });

        let wait = self.config.analysis_wait(self.backend_connected);
        debug!("analysis wait {:?}", wait);
        self.analysis_delay = Some(Pending::spawn(&self.runtime, tokio::time::sleep(wait)));
    }

    pub fn lookup_gene(&mut self, symbol: &str) {
        let Some(dataset_id) = self.dataset_id.clone() else {
            return;
        };
        let symbol = symbol.trim().to_string();
        if symbol.is_empty() {
            return;
        }
        let fallback = self.data.as_ref().and_then(|data| {
            data.genes
                .value
                .iter()
                .find(|g| g.symbol.eq_ignore_ascii_case(&symbol))
                .map(|g| Sourced {
                    value: g.clone(),
                    source: data.genes.source,
                })
        });

        // Demo mode never calls the backend for single genes.
        if !self.backend_connected {
            self.gene = fallback;
            self.gene_job = None;
            return;
        }
        let backend = self.backend.clone();
        self.gene_job = Some(Pending::spawn(&self.runtime, async move {
            lookup_gene(backend.as_ref(), &dataset_id, &symbol, fallback).await
        }));
    }

    pub fn clear_gene(&mut self) {
        self.gene = None;
        self.gene_job = None;
    }

    pub fn upload(&mut self, file: UploadFile) {
        if self.upload_job.is_some() {
            return;
        }
        self.upload_state = UploadState::Uploading(file.name.clone());
        let backend = self.backend.clone();
        self.upload_job = Some(Pending::spawn(&self.runtime, async move {
            backend.upload_dataset(&file).await
        }));
    }

    pub fn reset_upload(&mut self) {
        self.upload_job = None;
        self.upload_state = UploadState::Idle;
    }

    /// Applies whatever finished since the last frame. Returns true if
    /// anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        if let Some(outcome) = take_finished(&mut self.analysis_delay) {
            if let Err(e) = outcome {
                warn!("analysis timer failed: {}", e);
            }
            self.start_load(true);
            changed = true;
        }

        if let Some(outcome) = take_finished(&mut self.dashboard) {
            let ends_analysis = std::mem::take(&mut self.dashboard_ends_analysis);
            match outcome {
                Ok(data) => self.apply_dashboard(data, ends_analysis),
                Err(e) => {
                    if ends_analysis {
                        self.analysis_running = false;
                    }
                    self.job_failed("Loading failed", &e);
                }
            }
            changed = true;
        }

        if let Some(outcome) = take_finished(&mut self.catalogue) {
            match outcome {
                Ok(datasets) => self.datasets = datasets,
                Err(e) => warn!("dataset list job failed: {}", e),
            }
            changed = true;
        }

        if let Some(outcome) = take_finished(&mut self.details_job) {
            match outcome {
                Ok(details) => self.details = Some(details),
                Err(e) => warn!("dataset details job failed: {}", e),
            }
            changed = true;
        }

        if let Some(outcome) = take_finished(&mut self.gene_job) {
            match outcome {
                Ok(gene) => self.gene = gene,
                Err(e) => self.job_failed("Gene lookup failed", &e),
            }
            changed = true;
        }

        if let Some(outcome) = take_finished(&mut self.upload_job) {
            match outcome {
                Ok(result) => self.apply_upload(result),
                Err(e) => {
                    self.upload_state = UploadState::Failed(e.clone());
                    self.job_failed("Upload failed", &e);
                }
            }
            changed = true;
        }

        changed
    }

    fn job_failed(&mut self, title: &str, reason: &str) {
        warn!("{}: {}", title, reason);
        self.notices.push(Notice::new(NoticeKind::Error, title, reason));
    }

    fn apply_dashboard(&mut self, data: DashboardData, ends_analysis: bool) {
        self.backend_connected = data.backend_connected;

        if ends_analysis && self.analysis_running {
            self.analysis_running = false;
            self.notices.push(match (data.backend_connected, data.has_demo_slots()) {
                (true, false) => Notice::new(
                    NoticeKind::Success,
                    "Analysis complete",
                    "The analysis results are ready to explore.",
                ),
                (true, true) => Notice::new(
                    NoticeKind::Warning,
                    "Analysis partly failed",
                    "Some results could not be computed and show demo data instead.",
                ),
                (false, _) => Notice::new(
                    NoticeKind::Info,
                    "Demo complete",
                    "Explore these example results to learn about expression analysis.",
                ),
            });
        } else if data.backend_connected {
            self.notices.push(Notice::new(
                NoticeKind::Success,
                "Connected to analytics backend",
                "Loading real analysis data.",
            ));
        } else {
            self.notices.push(Notice::new(
                NoticeKind::Info,
                "Using demo data",
                "Analytics backend not connected. Showing example results.",
            ));
        }

        self.data = Some(data);
    }

    fn apply_upload(&mut self, result: Result<UploadResponse, ApiError>) {
        match result {
            Ok(response) => {
                info!(dataset = %response.dataset_id, "upload accepted");
                self.notices.push(Notice::new(
                    NoticeKind::Success,
                    "Upload complete",
                    &response.message,
                ));
                if !self.datasets.value.iter().any(|d| d.id == response.dataset_id) {
                    let title = match &self.upload_state {
                        UploadState::Uploading(name) => format!("Uploaded: {}", name),
                        _ => "Uploaded dataset".to_string(),
                    };
                    self.datasets
                        .value
                        .push(Dataset::new(&response.dataset_id, &title, 0, "Unknown"));
                }
                self.select_dataset(&response.dataset_id);
                self.upload_state = UploadState::Done(response);
            }
            Err(e) => {
                warn!("upload failed: {}", e);
                self.notices.push(Notice::new(
                    NoticeKind::Error,
                    "Upload failed",
                    &e.to_string(),
                ));
                self.upload_state = UploadState::Failed(e.to_string());
            }
        }
    }
}
