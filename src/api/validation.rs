use super::ApiError;

/// Coerce a 1-based page parameter. Absent, non-numeric or non-positive
/// values fall back to page 1.
pub fn coerce_page(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

/// Coerce a page-size parameter the same way, falling back to the
/// configured default.
pub fn coerce_limit(raw: Option<&str>, default_limit: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(default_limit)
}

/// Positive integer filter; anything else means "no filter"
pub fn parse_id_filter(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|id| *id > 0)
}

/// Trimmed non-empty text, or nothing
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Require a positive entity id from a request body
pub fn require_id(id: Option<i32>, what: &str) -> Result<i32, ApiError> {
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(format!("{what} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_page() {
        assert_eq!(coerce_page(None), 1);
        assert_eq!(coerce_page(Some("3")), 3);
        assert_eq!(coerce_page(Some("0")), 1);
        assert_eq!(coerce_page(Some("-2")), 1);
        assert_eq!(coerce_page(Some("abc")), 1);
    }

    #[test]
    fn test_coerce_limit() {
        assert_eq!(coerce_limit(None, 20), 20);
        assert_eq!(coerce_limit(Some("10"), 20), 10);
        assert_eq!(coerce_limit(Some("0"), 20), 20);
        assert_eq!(coerce_limit(Some("ten"), 20), 20);
    }

    #[test]
    fn test_parse_id_filter() {
        assert_eq!(parse_id_filter(Some("5")), Some(5));
        assert_eq!(parse_id_filter(Some("0")), None);
        assert_eq!(parse_id_filter(Some("")), None);
        assert_eq!(parse_id_filter(None), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  x  ".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_require_id() {
        assert!(require_id(Some(1), "Bug ID").is_ok());
        assert!(require_id(Some(0), "Bug ID").is_err());
        assert!(require_id(None, "Bug ID").is_err());
    }
}
