use crate::config::Config;
use crate::data::UploadFile;
use crate::error::{ApiError, ConfigError, UploadRejection};
use crate::models::{
    ClassifierResults, Dataset, GeneExpression, HealthStatus, HeatmapData, PcaData,
    UploadResponse, VolcanoPlotData,
};
use crate::observer::RequestObserver;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Operations the dashboard needs from the analytics service.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn health_check(&self) -> Result<HealthStatus, ApiError>;
    async fn get_datasets(&self) -> Result<Vec<Dataset>, ApiError>;
    async fn get_dataset_summary(&self, dataset_id: &str) -> Result<Dataset, ApiError>;
    async fn get_differential_genes(&self, dataset_id: &str)
    -> Result<Vec<GeneExpression>, ApiError>;
    async fn get_gene_expression(
        &self,
        dataset_id: &str,
        symbol: &str,
    ) -> Result<GeneExpression, ApiError>;
    async fn get_classification_results(
        &self,
        dataset_id: &str,
    ) -> Result<ClassifierResults, ApiError>;
    async fn get_volcano_plot_data(&self, dataset_id: &str) -> Result<VolcanoPlotData, ApiError>;
    async fn get_heatmap_data(&self, dataset_id: &str) -> Result<HeatmapData, ApiError>;
    async fn get_pca_data(&self, dataset_id: &str) -> Result<PcaData, ApiError>;
    async fn upload_dataset(&self, file: &UploadFile) -> Result<UploadResponse, ApiError>;
}

/// A decoded response body plus whatever shape checks serde cannot express.
pub trait Payload: DeserializeOwned + Send {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Payload> Payload for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Payload::validate)
    }
}

impl Payload for Dataset {}
impl Payload for ClassifierResults {}
impl Payload for VolcanoPlotData {}
impl Payload for PcaData {}
impl Payload for HealthStatus {}
impl Payload for UploadResponse {}

impl Payload for GeneExpression {
    fn validate(&self) -> Result<(), String> {
        self.check_shape()
    }
}

impl Payload for HeatmapData {
    fn validate(&self) -> Result<(), String> {
        self.check_shape()
    }
}

/// Accepts both `{ "<field>": payload }` and the bare payload.
pub fn unwrap_field(body: Value, field: Option<&str>) -> Value {
    match (body, field) {
        (Value::Object(mut map), Some(field)) => match map.remove(field) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        (body, _) => body,
    }
}

pub fn decode<T: Payload>(body: Value, field: Option<&str>) -> Result<T, ApiError> {
    let payload: T = serde_json::from_value(unwrap_field(body, field))?;
    payload.validate().map_err(ApiError::Decode)?;
    Ok(payload)
}

/// Pulls a readable message out of an error response, preferring the
/// backend's `{ "error": "..." }` body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
    upload_timeout: Duration,
    observer: Arc<dyn RequestObserver>,
}

impl ApiClient {
    pub fn new(config: &Config, observer: Arc<dyn RequestObserver>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| ConfigError::InvalidUrl {
            url: config.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: config.api_base_url.clone(),
                reason: "not a hierarchical url".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(ApiClient {
            base_url,
            client,
            upload_timeout: config.upload_timeout,
            observer,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends percent-encoded path segments to the base url.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder, method: &str, url: &Url) -> Result<Value, ApiError> {
        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        self.observer
            .on_response(method, url.as_str(), status.as_u16(), started.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                code: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn call<T: Payload>(
        &self,
        request: RequestBuilder,
        method: &str,
        url: Url,
        field: Option<&str>,
    ) -> Result<T, ApiError> {
        self.observer.on_request(method, url.as_str());
        let result = match self.execute(request, method, &url).await {
            Ok(body) => decode(body, field),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.observer.on_error(method, url.as_str(), e);
        }
        result
    }

    async fn get<T: Payload>(&self, segments: &[&str], field: Option<&str>) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        self.call(self.client.get(url.clone()), "GET", url, field).await
    }
}

#[async_trait]
impl AnalyticsBackend for ApiClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get(&["health"], None).await
    }

    async fn get_datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        self.get(&["datasets"], Some("datasets")).await
    }

    async fn get_dataset_summary(&self, dataset_id: &str) -> Result<Dataset, ApiError> {
        self.get(&["dataset", dataset_id, "summary"], Some("dataset"))
            .await
    }

    async fn get_differential_genes(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<GeneExpression>, ApiError> {
        self.get(&["dataset", dataset_id, "differential-genes"], Some("genes"))
            .await
    }

    async fn get_gene_expression(
        &self,
        dataset_id: &str,
        symbol: &str,
    ) -> Result<GeneExpression, ApiError> {
        self.get(&["dataset", dataset_id, "gene", symbol], Some("gene"))
            .await
    }

    async fn get_classification_results(
        &self,
        dataset_id: &str,
    ) -> Result<ClassifierResults, ApiError> {
        self.get(&["dataset", dataset_id, "classification"], Some("classification"))
            .await
    }

    async fn get_volcano_plot_data(&self, dataset_id: &str) -> Result<VolcanoPlotData, ApiError> {
        self.get(&["dataset", dataset_id, "volcano-plot"], Some("volcano"))
            .await
    }

    async fn get_heatmap_data(&self, dataset_id: &str) -> Result<HeatmapData, ApiError> {
        self.get(&["dataset", dataset_id, "heatmap"], Some("heatmap"))
            .await
    }

    async fn get_pca_data(&self, dataset_id: &str) -> Result<PcaData, ApiError> {
        self.get(&["dataset", dataset_id, "pca"], Some("pca")).await
    }

    async fn upload_dataset(&self, file: &UploadFile) -> Result<UploadResponse, ApiError> {
        // The file may have changed since it was picked.
        let file = UploadFile::inspect(&file.path)?;
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| UploadRejection::Unreadable(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(file.kind.mime())
            .map_err(|_| UploadRejection::UnsupportedType(file.kind.label().to_string()))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["dataset", "upload"]);
        let request = self
            .client
            .post(url.clone())
            .multipart(form)
            .timeout(self.upload_timeout);
        self.call(request, "POST", url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::DebugLog;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        let config = Config {
            api_base_url: base.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config, Arc::new(DebugLog::new())).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.endpoint(&["dataset", "GSE42872", "differential-genes"]).as_str(),
            "http://localhost:5000/api/dataset/GSE42872/differential-genes"
        );
        let root = client("http://localhost:5000/");
        assert_eq!(root.endpoint(&["health"]).as_str(), "http://localhost:5000/health");
    }

    #[test]
    fn endpoint_encodes_user_input() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.endpoint(&["dataset", "my data/1", "gene", "HLA-A"]).as_str(),
            "http://localhost:5000/api/dataset/my%20data%2F1/gene/HLA-A"
        );
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let config = Config {
            api_base_url: "mailto:lab@example.org".to_string(),
            ..Config::default()
        };
        assert!(ApiClient::new(&config, Arc::new(DebugLog::new())).is_err());
    }

    #[test]
    fn wrapped_and_bare_lists_decode_the_same() {
        let gene = json!({
            "symbol": "MYC", "name": "MYC proto-oncogene", "logFC": -2.14,
            "pValue": 0.002, "adjPValue": 0.018, "expression": [[0.8, 0.9]]
        });
        let bare: Vec<GeneExpression> = decode(json!([gene.clone()]), Some("genes")).unwrap();
        let wrapped: Vec<GeneExpression> =
            decode(json!({ "genes": [gene] }), Some("genes")).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].symbol, "MYC");
    }

    #[test]
    fn volcano_body_is_not_mistaken_for_a_wrapper() {
        let body = json!({ "genes": [
            { "symbol": "ESR1", "logFC": 3.21, "negLogPValue": 4.0, "significant": true }
        ]});
        let volcano: VolcanoPlotData = decode(body, Some("volcano")).unwrap();
        assert_eq!(volcano.genes.len(), 1);
        assert!(volcano.genes[0].significant);
    }

    #[test]
    fn shape_violations_are_decode_errors() {
        let body = json!({
            "genes": ["A", "B"], "samples": ["s1"],
            "expression": [[1.0], [2.0, 3.0]], "annotations": {}
        });
        let err = decode::<HeatmapData>(body, Some("heatmap")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(msg) if msg.contains("row B")));

        let missing = decode::<ClassifierResults>(json!({ "accuracy": 0.5 }), None).unwrap_err();
        assert!(matches!(missing, ApiError::Decode(_)));
    }

    #[test]
    fn error_message_prefers_backend_error_field() {
        let status = reqwest::StatusCode::NOT_FOUND;
        assert_eq!(
            error_message(status, r#"{"error": "Dataset GSE1 not found"}"#),
            "Dataset GSE1 not found"
        );
        assert_eq!(error_message(status, "no such thing"), "no such thing");
        assert_eq!(error_message(status, ""), "Not Found");
    }
}
