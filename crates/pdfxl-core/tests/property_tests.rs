//! Property-based tests for pdfxl-core
//!
//! Upload name handling and page layout invariants, using proptest.

use pdfxl_core::sheet_to_pdf::{
    layout_sheets, row_text, BODY_FONT_SIZE, BOTTOM_LIMIT, MAX_LINE_CHARS,
};
use pdfxl_core::upload::{stored_name, ALLOWED_EXTENSIONS};
use pdfxl_core::{allowed_file, secure_filename, Sheet};
use proptest::prelude::*;

fn allowed_extension() -> impl Strategy<Value = &'static str> {
    prop::sample::select(ALLOWED_EXTENSIONS.to_vec())
}

fn row() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(".{0,40}", 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // Upload names
    // ============================================================

    #[test]
    fn names_with_allowed_extension_are_accepted(stem in ".{0,30}", ext in allowed_extension()) {
        let name = format!("{}.{}", stem, ext);
        let upper = format!("{}.{}", stem, ext.to_uppercase());
        prop_assert!(allowed_file(&name));
        prop_assert!(allowed_file(&upper));
    }

    #[test]
    fn names_without_allowed_extension_are_rejected(stem in "[a-z]{0,20}", ext in "[a-z]{1,5}") {
        prop_assume!(!ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        let name = format!("{}.{}", stem, ext);
        prop_assert!(!allowed_file(&name));
        prop_assert!(!allowed_file(&stem));
    }

    #[test]
    fn secure_filename_is_a_single_safe_component(name in ".{0,60}") {
        let safe = secure_filename(&name);
        prop_assert!(safe
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'));
        prop_assert!(!safe.starts_with('.'));
        prop_assert!(!safe.ends_with('.'));
        prop_assert!(!safe.contains('/'));
    }

    #[test]
    fn stored_name_keeps_the_extension(stem in ".{0,30}", ext in allowed_extension()) {
        let stored = stored_name(&format!("{}.{}", stem, ext));
        prop_assert!(stored.is_some());
        let stored = stored.unwrap_or_default();
        let suffix = format!(".{}", ext);
        prop_assert!(stored.ends_with(&suffix));
        prop_assert!(stored.len() > ext.len() + 1);
        prop_assert_eq!(secure_filename(&stored), stored.clone());
    }

    // ============================================================
    // Page layout
    // ============================================================

    #[test]
    fn row_text_never_exceeds_limit(cells in prop::collection::vec(".{0,400}", 0..10)) {
        prop_assert!(row_text(&cells).chars().count() <= MAX_LINE_CHARS);
    }

    #[test]
    fn every_row_is_placed_once(rows in prop::collection::vec(row(), 0..200)) {
        let sheet = Sheet { name: "S".to_string(), rows: rows.clone() };
        let pages = layout_sheets(&[sheet]);

        let body: Vec<_> = pages
            .iter()
            .flat_map(|p| &p.lines)
            .filter(|l| l.size == BODY_FONT_SIZE)
            .collect();
        prop_assert_eq!(body.len(), rows.len());
        prop_assert!(body.iter().all(|l| l.y >= BOTTOM_LIMIT));
    }
}
