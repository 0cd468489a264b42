//! Upload filename cleaning.

/// Make a client-supplied filename safe to use on disk.
///
/// Steps, in order: drop trailing dots, drop every run of two or more dots, drop characters
/// outside `[A-Za-z0-9._- ]`, drop one leading dot, trim surrounding whitespace. The result
/// may be empty.
pub fn make_safe(name: &str) -> String {
    let trimmed = name.trim_end_matches('.');

    let mut without_dot_runs = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '.' {
            without_dot_runs.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'.') {
            chars.next();
            run += 1;
        }
        if run == 1 {
            without_dot_runs.push('.');
        }
    }

    let allowed: String = without_dot_runs
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect();

    let allowed = allowed.strip_prefix('.').unwrap_or(&allowed);

    allowed.trim().to_string()
}

/// `make_safe` followed by replacing each whitespace run with a single `-`.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_upload_name(name: &str) -> Option<String> {
    let safe = make_safe(name);
    let joined = safe.split_whitespace().collect::<Vec<_>>().join("-");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_safe_strips_disallowed_characters() {
        assert_eq!(make_safe("my photo (1).png"), "my photo 1.png");
        assert_eq!(make_safe("caf\u{e9}.jpg"), "caf.jpg");
        assert_eq!(make_safe("a/b\\c.gif"), "abc.gif");
    }

    #[test]
    fn test_make_safe_handles_dots() {
        assert_eq!(make_safe("image.png..."), "image.png");
        assert_eq!(make_safe("../../etc/passwd"), "etcpasswd");
        assert_eq!(make_safe(".htaccess"), "htaccess");
        assert_eq!(make_safe("a...b.png"), "ab.png");
    }

    #[test]
    fn test_make_safe_can_end_up_empty() {
        assert_eq!(make_safe("..."), "");
        assert_eq!(make_safe("\u{263a}\u{263a}"), "");
        assert_eq!(make_safe("   "), "");
    }

    #[test]
    fn test_sanitize_replaces_spaces_with_dashes() {
        assert_eq!(
            sanitize_upload_name("my holiday  photo.jpg").as_deref(),
            Some("my-holiday-photo.jpg")
        );
        assert_eq!(sanitize_upload_name("  cat.png ").as_deref(), Some("cat.png"));
        assert!(!sanitize_upload_name("a b c.png").unwrap().contains(' '));
    }

    #[test]
    fn test_sanitize_rejects_empty_result() {
        assert_eq!(sanitize_upload_name("***"), None);
        assert_eq!(sanitize_upload_name(""), None);
    }
}
