use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use unicode_segmentation::UnicodeSegmentation;

pub const MAX_FILENAME_LENGTH: usize = 120;

const ILLEGAL_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// RFC 5987 `attr-char`s are left alone, everything else is escaped
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Strip characters that are illegal in file names on common file systems
/// and cut the result to at most `max_len` graphemes.
#[must_use]
pub fn sanitize_file_name(name: &str, max_len: usize) -> String {
    name.graphemes(true)
        .filter(|x| !x.chars().all(char::is_control))
        .filter(|x| !x.contains(ILLEGAL_CHARS))
        .take(max_len)
        .collect::<String>()
        .trim()
        .to_string()
}

/// The last segment of a URL path, decoded and sanitized.
///
/// A single trailing slash is ignored, so `/files/` names `files`.
#[must_use]
pub fn file_name_from_url_path(path: &str) -> Option<String> {
    let path = path.strip_suffix('/').unwrap_or(path);
    let basename = path.rsplit('/').next()?;
    let decoded = percent_decode_str(basename).decode_utf8_lossy();
    let name = sanitize_file_name(&decoded, MAX_FILENAME_LENGTH);

    if name.is_empty() || name.chars().all(|c| c == '.') {
        None
    } else {
        Some(name)
    }
}

/// `Content-Disposition` value for an attachment.
///
/// Carries both a quoted ASCII fallback and the RFC 5987 `filename*` form
/// so non-ASCII titles survive.
#[must_use]
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback = ascii_fallback(file_name);
    let encoded = utf8_percent_encode(file_name, ATTR_CHAR);

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn ascii_fallback(file_name: &str) -> Cow<'_, str> {
    if file_name
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\')
    {
        return Cow::Borrowed(file_name);
    }

    Cow::Owned(
        file_name
            .chars()
            .map(|c| {
                if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}
