//! Text helpers used by the filter pipeline.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Punctuation removed by `course_strip_punctuation`.
static PUNCTUATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,:;!?]").expect("Invalid punctuation regex"));

/// Title-cases a string.
///
/// The first cased letter after any non-cased character is upper-cased and
/// every following cased letter is lower-cased, so digits and punctuation act
/// as word boundaries: `"o'neil"` becomes `"O'Neil"` and `"a101bis"` becomes
/// `"A101Bis"`. Applying it twice gives the same result as applying it once.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_cased = false;

    for c in input.chars() {
        if is_cased(c) {
            if previous_cased {
                out.extend(c.to_lowercase());
            } else {
                // 'ß' uppercases to "SS"; only the first letter stays upper.
                let mut upper = c.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
            previous_cased = true;
        } else {
            out.push(c);
            previous_cased = false;
        }
    }

    out
}

fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase()
}

/// Removes every `. , : ; ! ?` character.
pub fn strip_punctuation(input: &str) -> String {
    PUNCTUATION_REGEX.replace_all(input, "").into_owned()
}

/// Truncates a room name at the first letter following its first digit.
///
/// `"A101bis"` becomes `"A101"` and `"B 204 Amphi"` becomes `"B 204"`
/// (trailing whitespace trimmed). Letters before the first digit, such as a
/// building prefix, are kept. Returns `None` when nothing would be cut.
pub fn strip_after_number(room: &str) -> Option<String> {
    let mut chars = room.char_indices().skip_while(|(_, c)| !c.is_numeric());
    chars.next()?;
    let (cut, _) = chars.find(|(_, c)| c.is_alphabetic())?;
    Some(room[..cut].trim_end().to_string())
}

/// Removes the first case-insensitive occurrence of `needle` from `haystack`.
///
/// Returns `None` if the needle is empty or does not occur.
pub fn remove_first_ignore_case(haystack: &str, needle: &str) -> Option<String> {
    let regex = literal_ignore_case(needle)?;
    regex
        .find(haystack)
        .map(|m| format!("{}{}", &haystack[..m.start()], &haystack[m.end()..]))
}

/// Removes every case-insensitive occurrence of `needle` from `haystack`.
///
/// Returns `None` if the needle is empty or does not occur.
pub fn remove_all_ignore_case(haystack: &str, needle: &str) -> Option<String> {
    let regex = literal_ignore_case(needle)?;
    if !regex.is_match(haystack) {
        return None;
    }
    Some(regex.replace_all(haystack, "").into_owned())
}

fn literal_ignore_case(needle: &str) -> Option<Regex> {
    if needle.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}
