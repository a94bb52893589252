//! Single-value width limiting.

/// Appended to any value cut by [`truncate_value`].
pub const TRUNCATION_MARKER: &str = "…(truncated)";

/// Bound one scalar to `max_width` characters.
///
/// `None` becomes the empty string. Longer values keep their first
/// `max_width` characters followed by [`TRUNCATION_MARKER`]. Widths are
/// counted in characters, never bytes, so multi-byte text is never split.
pub fn truncate_value(value: Option<&str>, max_width: usize) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value.char_indices().nth(max_width) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(value.get(..cut).unwrap_or(value));
            out.push_str(TRUNCATION_MARKER);
            out
        }
        None => value.to_string(),
    }
}
