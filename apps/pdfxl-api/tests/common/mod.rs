//! Shared helpers for the API integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pdfxl_api::{app, AppState, Config};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "pdfxl-test-boundary";

/// Router backed by throwaway upload and output directories
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
    pub output_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let config = Config {
            upload_dir: upload_dir.path().to_path_buf(),
            output_dir: output_dir.path().to_path_buf(),
            output_retention: None,
            ..config
        };
        let state = AppState::new(config).await.unwrap();

        Self {
            router: app(Arc::new(state)),
            upload_dir,
            output_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST one multipart part named `field`
    pub async fn upload(
        &self,
        uri: &str,
        field: &str,
        filename: Option<&str>,
        content: &[u8],
    ) -> Response<Body> {
        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(field, filename, content)))
            .unwrap();
        self.send(request).await
    }

    pub fn uploads(&self) -> Vec<String> {
        list_dir(self.upload_dir.path())
    }

    pub fn outputs(&self) -> Vec<String> {
        list_dir(self.output_dir.path())
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

/// A single-part `multipart/form-data` body
pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// One-page PDF with a ruled table, one stroked rectangle per cell
pub fn table_pdf(rows: &[Vec<String>]) -> Vec<u8> {
    let mut operations = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        let y = 742.0 - (r as f64 + 1.0) * 20.0;
        for (c, text) in row.iter().enumerate() {
            let x = 50.0 + c as f64 * 100.0;
            operations.push(Operation::new(
                "re",
                vec![real(x), real(y), real(100.0), real(20.0)],
            ));
            operations.push(Operation::new("S", vec![]));
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
                Operation::new("Td", vec![real(x + 5.0), real(y + 6.0)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// `n` rows of a two-column price list, header first
pub fn price_rows(n: usize) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Product".to_string(), "Price".to_string()]];
    for i in 1..n {
        rows.push(vec![format!("Widget {}", i), format!("{}", i * 5)]);
    }
    rows
}

/// `.xlsx` bytes with one sheet of `rows` rows
pub fn workbook_bytes(sheet_name: &str, rows: usize) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    for r in 0..rows {
        sheet.write_string(r as u32, 0, format!("item {}", r)).unwrap();
        sheet.write_number(r as u32, 1, (r * 2) as f64).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}
