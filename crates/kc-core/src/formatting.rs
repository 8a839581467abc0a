//! Reply formatting helpers (Telegram HTML subset).

use regex::Regex;

use crate::session::SessionSummary;

/// Errors shown per summary; the rest stay in the log entry count only.
const MAX_SUMMARY_ERRORS: usize = 10;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Case-insensitive check for the one accepted upload format.
pub fn has_epub_extension(name: &str) -> bool {
    name.len() >= ".epub".len()
        && name
            .get(name.len() - ".epub".len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".epub"))
}

/// Human title from an uploaded filename: drop the `.epub` suffix, turn
/// `_`/`-` into spaces, collapse whitespace runs.
pub fn prettify_title(filename: &str) -> String {
    let name = strip_epub_suffix(filename).replace(['_', '-'], " ");
    let ws = Regex::new(r"\s+").expect("valid regex");
    ws.replace_all(&name, " ").trim().to_string()
}

fn strip_epub_suffix(name: &str) -> &str {
    let cut = name.len().saturating_sub(".epub".len());
    if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".epub") {
        &name[..cut]
    } else {
        name
    }
}

/// Session summary block shared by `/stop` replies and the idle
/// notification.
pub fn format_summary(summary: &SessionSummary) -> String {
    let mut lines = vec![
        format!("📥 Received: <b>{}</b>", summary.received),
        format!("✅ Delivered: <b>{}</b>", summary.delivered),
        format!("❌ Failed: <b>{}</b>", summary.failed),
    ];

    if !summary.errors.is_empty() {
        lines.push("\n⚠️ Errors:".to_string());
        for err in summary.errors.iter().take(MAX_SUMMARY_ERRORS) {
            lines.push(format!("• {}", escape_html(err)));
        }
    }

    if summary.duration_seconds > 0 {
        lines.push(format!(
            "\n⏱️ Session length: {}",
            format_duration(summary.duration_seconds)
        ));
    }

    lines.join("\n")
}

pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        return format!("{hours}h {mins}m {secs}s");
    }
    if mins > 0 {
        return format!("{mins}m {secs}s");
    }
    format!("{secs}s")
}
