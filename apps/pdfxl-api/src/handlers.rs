//! HTTP handlers for the conversion endpoints

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use pdfxl_core::upload::stored_name;
use pdfxl_core::{allowed_file, ConversionReport, ConvertError};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// The two conversions the service offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PdfToExcel,
    ExcelToPdf,
}

impl Direction {
    pub fn output_extension(self) -> &'static str {
        match self {
            Direction::PdfToExcel => "xlsx",
            Direction::ExcelToPdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Direction::PdfToExcel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Direction::ExcelToPdf => "application/pdf",
        }
    }

    pub fn download_name(self) -> &'static str {
        match self {
            Direction::PdfToExcel => "converted.xlsx",
            Direction::ExcelToPdf => "converted.pdf",
        }
    }

    fn convert(self, input: &Path, output: &Path) -> Result<ConversionReport, ConvertError> {
        match self {
            Direction::PdfToExcel => pdfxl_core::convert_pdf_to_xlsx(input, output),
            Direction::ExcelToPdf => pdfxl_core::convert_xlsx_to_pdf(input, output),
        }
    }
}

/// An upload persisted to the upload directory, removed when dropped
struct Upload {
    original_name: String,
    path: TempPath,
    size: u64,
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Convert an uploaded PDF into an `.xlsx` workbook
pub async fn pdf_to_excel(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(&state, multipart, Direction::PdfToExcel).await
}

/// Render an uploaded workbook into a PDF
pub async fn excel_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    convert_upload(&state, multipart, Direction::ExcelToPdf).await
}

async fn convert_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    direction: Direction,
) -> Result<Response, ApiError> {
    // Not a multipart body at all: nothing was uploaded
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Rejected non-multipart upload");
        ApiError::MissingFile
    })?;

    let upload = receive_upload(multipart, &state.config.upload_dir).await?;
    tracing::info!(
        filename = %upload.original_name,
        size = upload.size,
        direction = ?direction,
        "Received upload"
    );

    let output = state.config.output_dir.join(format!(
        "{}.{}",
        Uuid::new_v4().simple(),
        direction.output_extension()
    ));

    let report = run_conversion(upload, output.clone(), direction).await?;
    tracing::info!(
        pages = report.pages,
        rows = report.rows,
        output = %output.display(),
        "Conversion finished"
    );

    file_response(&output, direction).await
}

/// Read multipart fields until the `file` part and stream it to disk
///
/// A part named `file` without a filename is a plain form value and does not
/// count as an upload. The name is checked before anything is written.
async fn receive_upload(mut multipart: Multipart, upload_dir: &Path) -> Result<Upload, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if original_name.is_empty() || !allowed_file(&original_name) {
            tracing::warn!(filename = %original_name, "Rejected upload name");
            return Err(ApiError::InvalidFile);
        }
        let suffix = stored_name(&original_name)
            .map(|name| format!("_{}", name))
            .ok_or(ApiError::InvalidFile)?;

        let (file, path) = tempfile::Builder::new()
            .prefix("")
            .suffix(&suffix)
            .tempfile_in(upload_dir)
            .context("Failed to create upload file")?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .context("Failed to write upload")?;
        }
        file.flush().await.context("Failed to write upload")?;

        return Ok(Upload {
            original_name,
            path,
            size,
        });
    }

    Err(ApiError::MissingFile)
}

/// Run the converter on the blocking pool
///
/// The upload moves into the blocking task so it is deleted once the
/// converter is done with it, even if the request future is dropped first.
async fn run_conversion(
    upload: Upload,
    output: PathBuf,
    direction: Direction,
) -> Result<ConversionReport, ApiError> {
    let target = output.clone();
    let result = tokio::task::spawn_blocking(move || {
        let result = direction.convert(&upload.path, &target);
        if let Err(e) = upload.path.close() {
            tracing::warn!(error = %e, "Failed to remove upload");
        }
        result
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("Conversion task failed: {}", e)))?;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&output).await;
    }
    Ok(result?)
}

/// Stream the converted file back as an attachment
async fn file_response(output: &Path, direction: Direction) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(output)
        .await
        .with_context(|| format!("Failed to open {}", output.display()))?;
    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (header::CONTENT_TYPE, direction.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", direction.download_name()),
        ),
    ];
    Ok((headers, body).into_response())
}
