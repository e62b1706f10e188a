//! Upload name validation
//!
//! Only PDF and Excel workbooks are accepted. Names are sanitized before they
//! touch the filesystem.

/// Extensions accepted by both conversion endpoints
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "xls", "xlsx"];

/// Lowercased extension of `filename` (text after the last `.`), if any
pub fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Check whether an uploaded name carries an accepted extension
pub fn allowed_file(filename: &str) -> bool {
    match extension(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Reduce a client-supplied name to a safe single path component
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.` and `_` are trimmed.
/// The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.chars() {
        if c == '/' || c == '\\' || c.is_whitespace() {
            out.push('_');
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
            out.push(c);
        }
    }
    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name under which an upload is stored: sanitized, and always ending in the
/// validated extension so spreadsheet format detection keeps working.
pub fn stored_name(filename: &str) -> Option<String> {
    let ext = extension(filename).filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))?;
    let safe = secure_filename(filename);
    let stem = match safe.rsplit_once('.') {
        Some((stem, tail)) if tail.eq_ignore_ascii_case(&ext) => stem.to_string(),
        None if safe.eq_ignore_ascii_case(&ext) => String::new(),
        _ => safe,
    };
    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    if stem.is_empty() {
        Some(format!("upload.{}", ext))
    } else {
        Some(format!("{}.{}", stem, ext))
    }
}
