use crate::error::UploadRejection;
use polars::prelude::*;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Xlsx,
}

impl UploadKind {
    pub fn from_path(path: &Path) -> Result<Self, UploadRejection> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(UploadKind::Csv),
            "xlsx" => Ok(UploadKind::Xlsx),
            _ => Err(UploadRejection::UnsupportedType(ext)),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            UploadKind::Csv => "text/csv",
            UploadKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadKind::Csv => "CSV",
            UploadKind::Xlsx => "Excel",
        }
    }
}

/// A local file that passed the client-side checks and may be sent to the
/// backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub kind: UploadKind,
}

impl UploadFile {
    /// Type and size checks. Nothing here touches the network.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<Self, UploadRejection> {
        let path = path.as_ref();
        let kind = UploadKind::from_path(path)?;
        let size = std::fs::metadata(path)
            .map_err(|e| UploadRejection::Unreadable(e.to_string()))?
            .len();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadRejection::TooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        Ok(UploadFile {
            path: path.to_path_buf(),
            name,
            size,
            kind,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

/// Shape of an expression CSV: first column gene ids, then one column per
/// sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvPreview {
    pub genes: usize,
    pub samples: Vec<String>,
    pub non_numeric_samples: Vec<String>,
}

impl CsvPreview {
    pub fn is_valid(&self) -> bool {
        self.genes > 0 && !self.samples.is_empty() && self.non_numeric_samples.is_empty()
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub fn preview_csv<P: AsRef<Path>>(
    file_path: P,
    infer_schema_length: usize,
) -> Result<CsvPreview, Box<dyn Error>> {
    let df = CsvReader::new(File::open(file_path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(infer_schema_length)),
        )
        .finish()?;

    let mut samples = Vec::new();
    let mut non_numeric_samples = Vec::new();
    for column in df.get_columns().iter().skip(1) {
        let name = column.name().to_string();
        if !is_numeric(column.dtype()) {
            non_numeric_samples.push(name.clone());
        }
        samples.push(name);
    }

    Ok(CsvPreview {
        genes: df.height(),
        samples,
        non_numeric_samples,
    })
}
