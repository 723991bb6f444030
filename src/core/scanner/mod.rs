// ─── Structural Scanner ───
// Reads a handful of fields out of large JSON documents without building a
// tree. Every lookup answers `None` for anything missing, truncated or
// malformed; callers treat that as an ordinary outcome.
//
// Callers only see the lookup functions below; `cursor` stays private.

mod cursor;

use cursor::{Cursor, RawValue};

/// Scalar value stored directly under `key` in the top-level object of `text`.
///
/// Strings come back without quotes and with `\"` and `\\` unescaped;
/// numbers, `true`, `false` and `null` come back as their literal text.
/// Objects and arrays are not scalars and yield `None`.
pub fn lookup_scalar(text: &str, key: &str) -> Option<String> {
    match member_value(text, key)? {
        RawValue::String(raw) => Some(unescape(&raw[1..raw.len() - 1])),
        RawValue::Literal(raw) => Some(raw.to_string()),
        RawValue::Object(_) | RawValue::Array(_) => None,
    }
}

/// Follows `keys` through nested objects and returns the scalar at the last one.
///
/// Every hop but the last must land on an object.
pub fn lookup_nested_scalar(text: &str, keys: &[&str]) -> Option<String> {
    let (last, path) = keys.split_last()?;
    let mut current = text;
    for key in path {
        current = lookup_object(current, key)?;
    }
    lookup_scalar(current, last)
}

/// Verbatim slice of the object stored under `key` at the top level.
pub fn lookup_object<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    match member_value(text, key)? {
        RawValue::Object(raw) => Some(raw),
        _ => None,
    }
}

/// Yields each object of the top-level array stored under `array_key`.
///
/// Only a closing bracket at depth zero ends the array; nested objects are
/// skipped to their matching brace. Non-object elements are ignored, and a
/// truncated array ends the iteration after the last complete object.
pub fn iterate_top_level_objects<'a>(text: &'a str, array_key: &str) -> TopLevelObjects<'a> {
    let cursor =
        seek(text, array_key).and_then(|mut cursor| cursor.enter_array().then_some(cursor));
    TopLevelObjects { cursor }
}

/// Key/raw-value pairs of the top-level object of `text`, in document order.
///
/// Keys are unescaped. Values are verbatim slices (strings keep their
/// quotes). Scanning stops at the first malformed member.
pub fn object_entries(text: &str) -> Vec<(String, &str)> {
    let mut entries = Vec::new();
    let mut cursor = Cursor::new(text);
    if !cursor.enter_object() {
        return entries;
    }
    while let Some((key, value)) = cursor.next_member() {
        entries.push((unescape(key), value.as_str()));
    }
    entries
}

/// Unquoted form of a raw value slice as returned by [`object_entries`].
pub fn scalar_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Some(unescape(inner));
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn seek<'a>(text: &'a str, key: &str) -> Option<Cursor<'a>> {
    let mut cursor = Cursor::new(text);
    (cursor.enter_object() && cursor.seek_member(key)).then_some(cursor)
}

fn member_value<'a>(text: &'a str, key: &str) -> Option<RawValue<'a>> {
    seek(text, key)?.read_value()
}

pub(crate) fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Iterator over the objects of one array. See [`iterate_top_level_objects`].
pub struct TopLevelObjects<'a> {
    cursor: Option<Cursor<'a>>,
}

impl<'a> Iterator for TopLevelObjects<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        loop {
            match cursor.next_element() {
                Some(RawValue::Object(raw)) => return Some(raw),
                Some(_) => continue,
                None => {
                    self.cursor = None;
                    return None;
                }
            }
        }
    }
}
