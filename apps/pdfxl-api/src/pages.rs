//! Landing pages, robots.txt and sitemap.xml

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
};

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../templates/index.html");
const PDF_TO_EXCEL_HTML: &str = include_str!("../templates/pdf_to_excel.html");
const EXCEL_TO_PDF_HTML: &str = include_str!("../templates/excel_to_pdf.html");

/// Pages listed in the sitemap, with their priority
pub const SITEMAP_PAGES: [(&str, &str); 3] = [
    ("/", "1.0"),
    ("/pdf-to-excel", "0.9"),
    ("/excel-to-pdf", "0.9"),
];

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn pdf_to_excel_page() -> Html<&'static str> {
    Html(PDF_TO_EXCEL_HTML)
}

pub async fn excel_to_pdf_page() -> Html<&'static str> {
    Html(EXCEL_TO_PDF_HTML)
}

/// Base URL of the site, without a trailing slash
///
/// The configured public URL wins; otherwise it is rebuilt from the
/// `X-Forwarded-Proto` and `Host` request headers.
pub fn base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}

pub fn robots_body(base: &str) -> String {
    [
        "User-agent: *".to_string(),
        "Allow: /".to_string(),
        format!("Sitemap: {}/sitemap.xml", base),
    ]
    .join("\n")
}

/// Escape text for use inside an XML element
fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn sitemap_body(base: &str) -> String {
    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#.to_string(),
    ];
    for (path, priority) in SITEMAP_PAGES {
        lines.push(format!(
            "<url><loc>{}{}</loc><priority>{}</priority></url>",
            xml_escape(base),
            path,
            priority
        ));
    }
    lines.push("</urlset>".to_string());
    lines.join("\n")
}

pub async fn robots(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(state.config.public_base_url.as_deref(), &headers);
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_body(&base),
    )
}

pub async fn sitemap(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(state.config.public_base_url.as_deref(), &headers);
    (
        [(header::CONTENT_TYPE, "application/xml")],
        sitemap_body(&base),
    )
}
