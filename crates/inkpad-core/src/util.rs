//! Small string helpers shared by config, auth, the gateway and the CLI.

/// Trim optional text, mapping blank values to `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Shorten a response body so it fits in a one-line error message.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Keep the first `max_chars` characters, appending `...` when anything was cut.
///
/// Counts `char`s rather than bytes so multi-byte text is never split.
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_blank() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" anon-key ".to_string())),
            Some("anon-key".to_string())
        );
    }

    #[test]
    fn is_http_url_requires_scheme() {
        assert!(is_http_url("https://demo.supabase.co"));
        assert!(!is_http_url("demo.supabase.co"));
    }

    #[test]
    fn truncate_with_ellipsis_counts_chars() {
        assert_eq!(truncate_with_ellipsis("short", 50), "short");
        assert_eq!(truncate_with_ellipsis("ééééé", 3), "ééé...");
        assert_eq!(truncate_with_ellipsis(&"a".repeat(51), 50).len(), 53);
    }
}
