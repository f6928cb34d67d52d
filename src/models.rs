use crate::data::{CsvPreview, UploadFile};
use crate::loader::{Loader, Notice};
use crate::observer::DebugLog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub title: String,
    pub samples: u32,
    pub organism: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diseases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Dataset {
    pub fn new(id: &str, title: &str, samples: u32, organism: &str) -> Self {
        Dataset {
            id: id.to_string(),
            title: title.to_string(),
            samples,
            organism: organism.to_string(),
            diseases: Vec::new(),
            submission_date: None,
            last_update: None,
            description: None,
            difficulty: None,
        }
    }

    /// Label used by the dataset selector.
    pub fn display_label(&self) -> String {
        format!("{} - {} ({} samples)", self.id, self.title, self.samples)
    }
}

/// Everything the dataset info page shows. The backend summary only carries
/// the [`Dataset`] fields; platform, contributors and publication come from
/// the bundled catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDetails {
    pub dataset: Dataset,
    pub platform: String,
    pub contributors: Vec<String>,
    pub publication: String,
}

impl DatasetDetails {
    /// Overlays a backend summary. Fields the backend left empty keep the
    /// catalogue value.
    pub fn merge_summary(mut self, summary: Dataset) -> Self {
        let base = &mut self.dataset;
        base.id = summary.id;
        base.title = summary.title;
        base.samples = summary.samples;
        base.organism = summary.organism;
        if !summary.diseases.is_empty() {
            base.diseases = summary.diseases;
        }
        if summary.submission_date.is_some() {
            base.submission_date = summary.submission_date;
        }
        if summary.last_update.is_some() {
            base.last_update = summary.last_update;
        }
        if summary.description.is_some() {
            base.description = summary.description;
        }
        if summary.difficulty.is_some() {
            base.difficulty = summary.difficulty;
        }
        self
    }

    /// Samples per condition, split evenly and rounded down.
    pub fn samples_per_condition(&self) -> u32 {
        match self.dataset.diseases.len() {
            0 => self.dataset.samples,
            n => self.dataset.samples / n as u32,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneExpression {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "logFC")]
    pub log_fc: f64,
    #[serde(rename = "pValue")]
    pub p_value: f64,
    #[serde(rename = "adjPValue")]
    pub adj_p_value: f64,
    #[serde(default)]
    pub expression: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regulation {
    Up,
    Down,
}

impl GeneExpression {
    pub fn regulation(&self) -> Regulation {
        if self.log_fc > 0.0 {
            Regulation::Up
        } else {
            Regulation::Down
        }
    }

    /// Per-sample values flattened across the expression rows.
    pub fn sample_values(&self) -> Vec<f64> {
        self.expression.iter().flatten().copied().collect()
    }

    pub fn mean_expression(&self) -> Option<f64> {
        let values = self.sample_values();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Every expression row must have the same number of samples.
    pub fn check_shape(&self) -> Result<(), String> {
        let width = self.expression.first().map(Vec::len).unwrap_or(0);
        match self.expression.iter().position(|row| row.len() != width) {
            Some(row) => Err(format!(
                "gene {} expression row {} has {} values, expected {}",
                self.symbol,
                row,
                self.expression[row].len(),
                width
            )),
            None => Ok(()),
        }
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.symbol.to_lowercase().contains(&term) || self.name.to_lowercase().contains(&term)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
}

/// `[[tn, fp], [fn, tp]]`. Unsigned entries make a negative or fractional
/// count a decode error.
pub type ConfusionMatrix = [[u32; 2]; 2];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierResults {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_data: Option<RocCurve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ClassifierResults {
    pub fn true_negatives(&self) -> u32 {
        self.confusion_matrix[0][0]
    }

    pub fn false_positives(&self) -> u32 {
        self.confusion_matrix[0][1]
    }

    pub fn false_negatives(&self) -> u32 {
        self.confusion_matrix[1][0]
    }

    pub fn true_positives(&self) -> u32 {
        self.confusion_matrix[1][1]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolcanoPoint {
    pub symbol: String,
    #[serde(rename = "logFC")]
    pub log_fc: f64,
    pub neg_log_p_value: f64,
    pub significant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VolcanoPlotData {
    pub genes: Vec<VolcanoPoint>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HeatmapData {
    pub genes: Vec<String>,
    pub samples: Vec<String>,
    pub expression: Vec<Vec<f64>>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HeatmapData {
    /// Checks rows = genes and every row has one value per sample.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.expression.len() != self.genes.len() {
            return Err(format!(
                "heatmap has {} genes but {} expression rows",
                self.genes.len(),
                self.expression.len()
            ));
        }
        for (gene, row) in self.genes.iter().zip(&self.expression) {
            if row.len() != self.samples.len() {
                return Err(format!(
                    "heatmap row {} has {} values for {} samples",
                    gene,
                    row.len(),
                    self.samples.len()
                ));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcaSample {
    pub sample: String,
    pub pc1: f64,
    pub pc2: f64,
    pub condition: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PcaVariance {
    pub pc1: f64,
    pub pc2: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcaData {
    pub samples: Vec<PcaSample>,
    pub variance: PcaVariance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub dataset_id: String,
    #[serde(default)]
    pub message: String,
}

/// Score tiles show `value * 100` to one decimal place, unclamped.
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Heatmap cell intensity: maps [-3, 3] onto [0, 1].
pub fn heatmap_intensity(value: f64) -> f32 {
    ((value + 3.0) / 6.0).clamp(0.0, 1.0) as f32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneTableStats {
    pub total: usize,
    pub significant: usize,
    pub upregulated: usize,
    pub downregulated: usize,
}

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

impl GeneTableStats {
    pub fn from_genes(genes: &[GeneExpression]) -> Self {
        let mut stats = GeneTableStats {
            total: genes.len(),
            ..Default::default()
        };
        for gene in genes {
            if gene.adj_p_value < SIGNIFICANCE_LEVEL {
                stats.significant += 1;
            }
            match gene.regulation() {
                Regulation::Up => stats.upregulated += 1,
                Regulation::Down => stats.downregulated += 1,
            }
        }
        stats
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum View {
    Home,
    Dashboard,
    GeneSearch,
    DatasetInfo,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Tab {
    Expression,
    Classification,
    Visualization,
    Advanced,
    Upload,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Expression,
        Tab::Classification,
        Tab::Visualization,
        Tab::Advanced,
        Tab::Upload,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Expression => "Expression Analysis",
            Tab::Classification => "ML Classification",
            Tab::Visualization => "Visualizations",
            Tab::Advanced => "Advanced Plots",
            Tab::Upload => "Upload",
        }
    }
}

pub struct AppState {
    pub loader: Loader,
    pub view: View,
    pub selected_tab: Tab,
    pub search_term: String,
    pub search_results: Vec<GeneExpression>,
    pub searched: bool,
    pub pending_upload: Option<UploadFile>,
    pub upload_preview: Option<Result<CsvPreview, String>>,
    pub upload_error: Option<String>,
    pub toasts: Vec<(Notice, Instant)>,
    pub debug_log: DebugLog,
    pub debug_output: String,
    pub debug_panel_height: f32,
    pub debug_panel_visible: bool,
}

impl AppState {
    pub fn new(loader: Loader, debug_log: DebugLog) -> Self {
        AppState {
            loader,
            view: View::Home,
            selected_tab: Tab::Expression,
            search_term: String::new(),
            search_results: Vec::new(),
            searched: false,
            pending_upload: None,
            upload_preview: None,
            upload_error: None,
            toasts: Vec::new(),
            debug_log,
            debug_output: String::new(),
            debug_panel_height: 150.0,
            debug_panel_visible: true,
        }
    }

    /// Case-insensitive search over the gene table currently loaded.
    pub fn search_genes(&mut self) {
        let term = self.search_term.trim().to_string();
        self.searched = !term.is_empty();
        self.search_results = match (term.is_empty(), self.loader.data()) {
            (false, Some(data)) => data
                .genes
                .value
                .iter()
                .filter(|gene| gene.matches(&term))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
    }
}
