/// Translates Persian (U+06F0..U+06F9) and Arabic-Indic (U+0660..U+0669)
/// digits to ASCII, leaving every other character untouched.
pub(crate) fn to_ascii_digits(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\u{06f0}'..='\u{06f9}' => ascii_digit(ch as u32 - 0x06f0),
            '\u{0660}'..='\u{0669}' => ascii_digit(ch as u32 - 0x0660),
            other => other,
        })
        .collect()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('0')
}

/// Trims and drops the zero-width characters the portal sprinkles into labels.
pub(crate) fn clean_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{200c}', '\u{200f}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
