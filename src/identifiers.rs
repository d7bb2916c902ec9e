//! Total parsers that turn URLs and `alt` texts into chapter/page identifiers.
//!
//! None of these fail: every function falls back to a named default when
//! its pattern is absent.

use regex::Regex;
use std::sync::OnceLock;

/// Returned by [`extract_chapter_number`] when the text carries no chapter.
pub const UNKNOWN_CHAPTER: &str = "0";

/// Page-number fallback in catalog mode: an image without `page N` in its
/// alt text is the chapter cover.
pub const COVER_SENTINEL: &str = "cover";

/// Page-number fallback in walk mode, where covers are detected by URL shape.
pub const UNNUMBERED_PAGE: &str = "0";

pub const DEFAULT_FILE_EXTENSION: &str = "jpg";

fn chapter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"chapter-(\d+(?:\.\d+)?)").expect("valid chapter regex"))
}

fn page_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"page (\d+)").expect("valid page regex"))
}

fn numbered_asset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/\d+-").expect("valid asset regex"))
}

/// `".../AgV11-chapter-12.5-en"` gives `"12.5"`.
pub fn extract_chapter_number(text: &str) -> String {
    chapter_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or_else(|| UNKNOWN_CHAPTER.to_string(), |m| m.as_str().to_string())
}

/// `"page 7 of Bleach"` gives `"7"`; no match gives `fallback`.
pub fn extract_page_number(text: &str, fallback: &str) -> String {
    page_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or_else(|| fallback.to_string(), |m| m.as_str().to_string())
}

/// Lowercased extension of the last path segment, `jpg` when there is none.
/// Query strings and fragments are not part of the segment.
pub fn extract_file_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let parts: Vec<&str> = segment.split('.').collect();

    match parts.as_slice() {
        [.., last] if parts.len() >= 2 && !last.is_empty() => last.to_lowercase(),
        _ => DEFAULT_FILE_EXTENSION.to_string(),
    }
}

/// Numbered page assets live at `/<digits>-...`; anything else is a cover.
pub fn is_cover_image(src: &str) -> bool {
    !numbered_asset_regex().is_match(src)
}
