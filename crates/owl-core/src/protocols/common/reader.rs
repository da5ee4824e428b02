use std::str::FromStr;

/// Parse an optional numeric field, treating absent or blank text as zero.
///
/// Returns `None` only when text is present but not a valid number.
pub(crate) fn parse_or_default<T: FromStr + Default>(raw: Option<&str>) -> Option<T> {
    match raw.map(str::trim) {
        None | Some("") => Some(T::default()),
        Some(text) => text.parse().ok(),
    }
}
