// src/ingest/canonical.rs
use crate::utils::constants::MISSING_VALUE_MARKERS;

/// The single place where raw cells become "present or missing". Everything
/// downstream works with `Option<String>` and never sees a NA marker.
pub fn canonicalize_cell(raw: Option<&str>) -> Option<String> {
    match raw {
        None => None,
        Some(value) if MISSING_VALUE_MARKERS.contains(&value) => None,
        Some(value) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_markers() {
        assert_eq!(canonicalize_cell(None), None);
        assert_eq!(canonicalize_cell(Some("")), None);
        assert_eq!(canonicalize_cell(Some("NaN")), None);
        assert_eq!(canonicalize_cell(Some("N/A")), None);
    }

    #[test]
    fn test_values_kept_verbatim() {
        assert_eq!(canonicalize_cell(Some(" ")), Some(" ".to_string()));
        assert_eq!(canonicalize_cell(Some("Nana's Kitchen")), Some("Nana's Kitchen".to_string()));
        assert_eq!(canonicalize_cell(Some("0042")), Some("0042".to_string()));
    }
}
