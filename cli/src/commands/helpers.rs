use chrono::{DateTime, Local};
use serde::Serialize;

use carol_core::store::SaveStatus;

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Tell the user a record was kept in memory only.
pub(crate) fn warn_if_unsaved(status: &SaveStatus) {
    if let SaveStatus::Failed { reason } = status {
        eprintln!("Warning: could not write to local storage ({reason}); the change was not kept");
    }
}

/// Render epoch milliseconds in local time.
pub(crate) fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

pub(crate) fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!("#{}", tags.join(" #"))
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
        assert_eq!(json_error("say \"hi\""), r#"{"error":"say \"hi\""}"#);
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&[]), "");
        assert_eq!(
            format_tags(&["家常".to_string(), "快手".to_string()]),
            "#家常 #快手"
        );
    }

    #[test]
    fn test_format_millis() {
        let expected = DateTime::from_timestamp_millis(0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        assert_eq!(format_millis(0), expected);
        assert_eq!(format_millis(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("番茄炒蛋的做法大全", 8), "番茄炒蛋的...");
        assert_eq!(truncate("红烧肉", 8), "红烧肉");
    }
}
