use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gene_explorer::api::{AnalyticsBackend, ApiClient};
use gene_explorer::config::Config;
use gene_explorer::data::{UploadFile, UploadKind};
use gene_explorer::error::{ApiError, UploadRejection};
use gene_explorer::loader::{load_dashboard, DataSource};
use gene_explorer::observer::DebugLog;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "message": "analytics service ready" }))
}

async fn genes(Path(id): Path<String>) -> Json<Value> {
    if id == "slow" {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    Json(json!({ "genes": [
        {
            "symbol": "GATA3", "name": "GATA binding protein 3", "logFC": 1.7,
            "pValue": 0.0004, "adjPValue": 0.009, "expression": [[7.1, 7.4, 6.9]]
        }
    ]}))
}

async fn classification() -> Json<Value> {
    Json(json!({
        "accuracy": 0.91, "precision": 0.9, "recall": 0.92, "f1Score": 0.91,
        "confusionMatrix": [[40, 4], [3, 53]],
        "rocData": { "fpr": [0.0, 0.1, 1.0], "tpr": [0.0, 0.8, 1.0], "auc": 0.93 }
    }))
}

async fn volcano() -> Json<Value> {
    Json(json!({ "genes": [
        { "symbol": "GATA3", "logFC": 1.7, "negLogPValue": 3.4, "significant": true },
        { "symbol": "ACTB", "logFC": 0.1, "negLogPValue": 0.2, "significant": false }
    ]}))
}

async fn heatmap() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "no heatmap for this dataset" })),
    )
}

async fn pca() -> &'static str {
    "PC1,PC2\n1,2"
}

async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        return (
            StatusCode::OK,
            Json(json!({
                "datasetId": format!("upload_{}", name),
                "message": format!("received {} bytes", bytes.len())
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "missing file field" })),
    )
}

async fn serve() -> String {
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/dataset/:id/differential-genes", get(genes))
        .route("/api/dataset/:id/classification", get(classification))
        .route("/api/dataset/:id/volcano-plot", get(volcano))
        .route("/api/dataset/:id/heatmap", get(heatmap))
        .route("/api/dataset/:id/pca", get(pca))
        .route("/api/dataset/upload", post(upload));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base: &str, timeout: Duration, log: &DebugLog) -> ApiClient {
    let config = Config {
        api_base_url: base.to_string(),
        request_timeout: timeout,
        ..Config::default()
    };
    ApiClient::new(&config, Arc::new(log.clone())).unwrap()
}

#[tokio::test]
async fn dashboard_mixes_live_slots_and_gaps() {
    let _ = tracing_subscriber::fmt::try_init();
    let base = serve().await;
    let log = DebugLog::new();
    let api = client(&base, Duration::from_secs(5), &log);

    let data = load_dashboard(&api, "GSE2034").await;
    assert!(data.backend_connected);
    assert_eq!(data.genes.source, DataSource::Live);
    assert_eq!(data.genes.value[0].symbol, "GATA3");
    assert_eq!(data.classifier.source, DataSource::Live);
    assert_eq!(data.classifier.value.true_positives(), 53);
    assert_eq!(data.volcano.map(|v| v.genes.len()), Some(2));
    assert!(data.heatmap.is_none());
    assert!(data.pca.is_none());

    let lines = log.snapshot();
    assert!(lines.contains("/api/dataset/GSE2034/volcano-plot"));
    assert!(lines.contains("← 404 GET"));
}

#[tokio::test]
async fn error_bodies_become_tagged_errors() {
    let base = serve().await;
    let api = client(&base, Duration::from_secs(5), &DebugLog::new());

    match api.get_heatmap_data("GSE2034").await {
        Err(ApiError::HttpStatus { code, message }) => {
            assert_eq!(code, 404);
            assert_eq!(message, "no heatmap for this dataset");
        }
        other => panic!("expected a 404, got {:?}", other),
    }

    let err = api.get_pca_data("GSE2034").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn slow_gene_list_falls_back_alone() {
    let base = serve().await;
    let api = client(&base, Duration::from_millis(500), &DebugLog::new());

    let err = api.get_differential_genes("slow").await.unwrap_err();
    assert!(err.is_timeout());

    let data = load_dashboard(&api, "slow").await;
    assert!(data.backend_connected);
    assert_eq!(data.genes.source, DataSource::Demo);
    assert_eq!(data.genes.value.len(), 6);
    assert_eq!(data.classifier.source, DataSource::Live);
}

#[tokio::test]
async fn unreachable_backend_switches_to_demo() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let log = DebugLog::new();
    let api = client(&format!("http://{}/api", addr), Duration::from_secs(2), &log);
    let data = load_dashboard(&api, "GSE42872").await;

    assert!(!data.backend_connected);
    assert!(data.genes.is_demo());
    assert!(data.classifier.is_demo());
    assert!(data.volcano.is_none() && data.heatmap.is_none() && data.pca.is_none());

    let lines = log.snapshot();
    assert!(lines.contains("/api/health"));
    assert!(!lines.contains("differential-genes"));
}

#[tokio::test]
async fn upload_sends_multipart_file() {
    let base = serve().await;
    let api = client(&base, Duration::from_secs(5), &DebugLog::new());

    let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(tmp, "gene,s1,s2\nBRCA1,1.2,3.4\n").unwrap();
    let file = UploadFile::inspect(tmp.path()).unwrap();

    let response = api.upload_dataset(&file).await.unwrap();
    assert_eq!(response.dataset_id, format!("upload_{}", file.name));
    assert_eq!(response.message, "received 25 bytes");
}

#[tokio::test]
async fn oversized_upload_never_reaches_the_network() {
    let base = serve().await;
    let log = DebugLog::new();
    let api = client(&base, Duration::from_secs(5), &log);

    let tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let file = UploadFile {
        path: tmp.path().to_path_buf(),
        name: "big.csv".to_string(),
        size: 10,
        kind: UploadKind::Csv,
    };
    tmp.as_file().set_len(60 * 1024 * 1024).unwrap();

    let err = api.upload_dataset(&file).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Upload(UploadRejection::TooLarge { .. })
    ));
    assert!(log.is_empty());
}
