//! Output file naming.
//!
//! Every output name is derived from the client-declared file name, so it is reduced to
//! `[a-z0-9-_]` before it reaches an archive entry or a `Content-Disposition` header.

use chrono::NaiveDate;

/// Base name used when nothing usable survives sanitization.
pub const PLACEHOLDER_BASE_NAME: &str = "image";

/// Maximum length of a sanitized base name.
pub const MAX_BASE_NAME_LEN: usize = 70;

/// File name without directories and without its last extension.
///
/// Dot files keep their name (`.env` stays `.env`).
pub fn file_stem(file_name: &str) -> &str {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    }
}

/// Lowercase, collapse unsafe runs to `-`, trim dashes, truncate, fall back to the placeholder.
fn sanitize_segment(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_unsafe_run = false;
    for c in raw.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            collapsed.push(c);
            in_unsafe_run = false;
        } else if !in_unsafe_run {
            collapsed.push('-');
            in_unsafe_run = true;
        }
    }

    let truncated: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_BASE_NAME_LEN)
        .collect();

    if truncated.is_empty() {
        PLACEHOLDER_BASE_NAME.to_string()
    } else {
        truncated
    }
}

/// Archive-safe base name for an uploaded file.
///
/// ```
/// use webplab_core::naming::sanitize_base_name;
/// assert_eq!(sanitize_base_name("My Photo!!.PNG"), "my-photo");
/// ```
pub fn sanitize_base_name(file_name: &str) -> String {
    let stem = file_stem(file_name);
    if stem.is_empty() {
        return PLACEHOLDER_BASE_NAME.to_string();
    }
    sanitize_segment(stem)
}

/// Values available to a rename pattern.
#[derive(Debug, Clone, Copy)]
pub struct RenameContext<'a> {
    pub original_name: &'a str,
    pub width: u32,
    pub height: u32,
    pub date: NaiveDate,
}

/// Base name for an output file, honouring an optional rename pattern.
///
/// Supported tokens: `[name]`, `[width]`, `[height]`, `[date]` (`yyyy-mm-dd`).
/// The expanded pattern goes through the same sanitization as plain names.
pub fn output_base_name(pattern: Option<&str>, ctx: &RenameContext<'_>) -> String {
    let Some(pattern) = pattern else {
        return sanitize_base_name(ctx.original_name);
    };

    let expanded = pattern
        .replace("[name]", file_stem(ctx.original_name))
        .replace("[width]", &ctx.width.to_string())
        .replace("[height]", &ctx.height.to_string())
        .replace("[date]", &ctx.date.format("%Y-%m-%d").to_string());
    sanitize_segment(&expanded)
}
