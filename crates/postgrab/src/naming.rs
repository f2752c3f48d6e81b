//! Filesystem-safe names for post folders and image files.
//!
//! Names are only ever used as a single path component under the output
//! directory, so anything that could act as a separator or is reserved on
//! common filesystems is replaced by a space.

use regex::Regex;
use std::sync::OnceLock;

/// Longest name, in bytes, produced for one path component.
///
/// Leaves room under the common 255-byte limit for the `"NNN - "` folder
/// prefix and the `.part` staging suffix.
pub const MAX_NAME_BYTES: usize = 200;

/// Longest extension kept intact when an image file name is shortened.
const MAX_EXTENSION_BYTES: usize = 16;

fn forbidden_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid regex"))
}

/// Replace forbidden characters with spaces and trim.
///
/// Returns `None` when nothing usable is left (empty, `.` or `..`).
pub fn sanitize_component(raw: &str) -> Option<String> {
    let replaced = forbidden_chars().replace_all(raw, " ");
    let trimmed = replaced.trim();
    match trimmed {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Folder name for a post: the title, prefixed `"{ordinal:03} - "` when indexed.
///
/// Long titles are shortened to [`MAX_NAME_BYTES`].
pub fn folder_name(title: &str, ordinal: usize, indexed: bool) -> Option<String> {
    let title = sanitize_component(title)?;
    let title = truncate_bytes(&title, MAX_NAME_BYTES).trim_end();
    if indexed {
        Some(format!("{ordinal:03} - {title}"))
    } else {
        Some(title.to_string())
    }
}

/// File name for an image: the last path segment, percent-decoded and sanitized.
pub fn image_file_name(source: &url::Url) -> Option<String> {
    let segment = source.path_segments()?.last()?;
    let decoded = match urlencoding::decode(segment) {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes()))
            .into_owned(),
    };
    sanitize_component(&decoded).map(shorten_file_name)
}

/// Cap a file name at [`MAX_NAME_BYTES`], keeping a short extension.
fn shorten_file_name(name: String) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => {
            let (stem, ext) = name.split_at(dot);
            let stem = truncate_bytes(stem, MAX_NAME_BYTES - ext.len()).trim_end();
            format!("{stem}{ext}")
        }
        _ => truncate_bytes(&name, MAX_NAME_BYTES).trim_end().to_string(),
    }
}

/// Pull a post id out of `url` using the first capture group of `pattern`.
pub fn post_id(url: &str, pattern: &str) -> Option<String> {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("ignoring invalid post id pattern `{pattern}`: {e}");
            return None;
        }
    };
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
