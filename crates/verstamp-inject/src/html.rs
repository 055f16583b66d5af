use std::sync::LazyLock;

use regex::Regex;

const HEAD_TAG: &str = "<head>";

static VERSION_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+name\s*=\s*["']version["']\s+content\s*=\s*["']([^"']*)["']"#)
        .unwrap_or_else(|error| unreachable!("version meta pattern is valid: {error}"))
});

/// Render the version marker tag.
#[must_use]
pub fn version_meta_tag(version: &str) -> String {
    format!(
        r#"<meta name="version" content="{}">"#,
        escape_attribute(version)
    )
}

/// Insert the version marker right after the first `<head>` tag.
///
/// Documents without a literal `<head>` are returned unchanged.
#[must_use]
pub fn inject_version_meta(html: &str, version: &str) -> String {
    let Some(index) = html.find(HEAD_TAG) else {
        return html.to_string();
    };

    let insert_at = index + HEAD_TAG.len();
    let tag = version_meta_tag(version);
    let mut stamped = String::with_capacity(html.len() + tag.len());
    stamped.push_str(&html[..insert_at]);
    stamped.push_str(&tag);
    stamped.push_str(&html[insert_at..]);
    stamped
}

/// Read the version marker back out of a document.
#[must_use]
pub fn read_version_meta(html: &str) -> Option<String> {
    VERSION_META
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| unescape_attribute(value.as_str()))
        .filter(|version| !version.trim().is_empty())
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape_attribute(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_meta_after_first_head_tag() {
        let html = "<html><head><title>x</title></head><body><head></head></body></html>";
        assert_eq!(
            inject_version_meta(html, "1.2.3"),
            r#"<html><head><meta name="version" content="1.2.3"><title>x</title></head><body><head></head></body></html>"#
        );
    }

    #[test]
    fn leaves_html_without_head_unchanged() {
        let html = "<html><body>no head</body></html>";
        assert_eq!(inject_version_meta(html, "1.2.3"), html);
        assert_eq!(inject_version_meta("", "1.2.3"), "");
    }

    #[test]
    fn head_with_attributes_is_not_matched() {
        let html = r#"<html><head lang="en"></head></html>"#;
        assert_eq!(inject_version_meta(html, "1.0.0"), html);
    }

    #[test]
    fn escapes_version_in_attribute() {
        assert_eq!(
            version_meta_tag(r#"1.0"><script>"#),
            r#"<meta name="version" content="1.0&quot;&gt;&lt;script&gt;">"#
        );
    }

    #[test]
    fn reads_back_injected_version() {
        let stamped = inject_version_meta("<html><head></head></html>", "4.5.6-rc.1");
        assert_eq!(read_version_meta(&stamped).as_deref(), Some("4.5.6-rc.1"));

        let escaped = inject_version_meta("<head>", "a&b");
        assert_eq!(read_version_meta(&escaped).as_deref(), Some("a&b"));
    }

    #[test]
    fn reads_hand_written_markers() {
        assert_eq!(
            read_version_meta("<META name='version'  content='2.0'/>").as_deref(),
            Some("2.0")
        );
        assert_eq!(read_version_meta(r#"<meta name="version" content="">"#), None);
        assert_eq!(read_version_meta("<head></head>"), None);
    }
}
