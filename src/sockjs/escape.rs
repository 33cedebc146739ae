//! Outbound payload escaping.
//!
//! Every outbound frame is a JSON string literal. On top of standard JSON
//! escaping, a set of UTF-16 code units that downstream JSON parsers and
//! collations have historically mangled is forced into `\uXXXX` form:
//! control characters, surrogate halves, noncharacters, many combining marks
//! and a run of compatibility ideographs and presentation forms.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Inclusive UTF-16 code unit ranges that must travel escaped. Sorted.
const UNSAFE_RANGES: &[(u16, u16)] = &[
    (0x0000, 0x001f), (0x0300, 0x0333), (0x033d, 0x0346), (0x034a, 0x034c), (0x0350, 0x0352),
    (0x0357, 0x0358), (0x035c, 0x0362), (0x0374, 0x0374), (0x037e, 0x037e), (0x0387, 0x0387),
    (0x0591, 0x05af), (0x05c4, 0x05c4), (0x0610, 0x0617), (0x0653, 0x0654), (0x0657, 0x065b),
    (0x065d, 0x065e), (0x06df, 0x06e2), (0x06eb, 0x06ec), (0x0730, 0x0730), (0x0732, 0x0733),
    (0x0735, 0x0736), (0x073a, 0x073a), (0x073d, 0x073d), (0x073f, 0x0741), (0x0743, 0x0743),
    (0x0745, 0x0745), (0x0747, 0x0747), (0x07eb, 0x07f1), (0x0951, 0x0951), (0x0958, 0x095f),
    (0x09dc, 0x09dd), (0x09df, 0x09df), (0x0a33, 0x0a33), (0x0a36, 0x0a36), (0x0a59, 0x0a5b),
    (0x0a5e, 0x0a5e), (0x0b5c, 0x0b5d), (0x0e38, 0x0e39), (0x0f43, 0x0f43), (0x0f4d, 0x0f4d),
    (0x0f52, 0x0f52), (0x0f57, 0x0f57), (0x0f5c, 0x0f5c), (0x0f69, 0x0f69), (0x0f72, 0x0f76),
    (0x0f78, 0x0f78), (0x0f80, 0x0f83), (0x0f93, 0x0f93), (0x0f9d, 0x0f9d), (0x0fa2, 0x0fa2),
    (0x0fa7, 0x0fa7), (0x0fac, 0x0fac), (0x0fb9, 0x0fb9), (0x1939, 0x193a), (0x1a17, 0x1a17),
    (0x1b6b, 0x1b6b), (0x1cda, 0x1cdb), (0x1dc0, 0x1dcf), (0x1dfc, 0x1dfc), (0x1dfe, 0x1dfe),
    (0x1f71, 0x1f71), (0x1f73, 0x1f73), (0x1f75, 0x1f75), (0x1f77, 0x1f77), (0x1f79, 0x1f79),
    (0x1f7b, 0x1f7b), (0x1f7d, 0x1f7d), (0x1fbb, 0x1fbb), (0x1fbe, 0x1fbe), (0x1fc9, 0x1fc9),
    (0x1fcb, 0x1fcb), (0x1fd3, 0x1fd3), (0x1fdb, 0x1fdb), (0x1fe3, 0x1fe3), (0x1feb, 0x1feb),
    (0x1fee, 0x1fef), (0x1ff9, 0x1ff9), (0x1ffb, 0x1ffb), (0x1ffd, 0x1ffd), (0x2000, 0x2001),
    (0x20d0, 0x20d1), (0x20d4, 0x20d7), (0x20e7, 0x20e9), (0x2126, 0x2126), (0x212a, 0x212b),
    (0x2329, 0x232a), (0x2adc, 0x2adc), (0x302b, 0x302c), (0xaab2, 0xaab3), (0xd800, 0xdfff),
    (0xf900, 0xfa0d), (0xfa10, 0xfa10), (0xfa12, 0xfa12), (0xfa15, 0xfa1e), (0xfa20, 0xfa20),
    (0xfa22, 0xfa22), (0xfa25, 0xfa26), (0xfa2a, 0xfa2d), (0xfa30, 0xfa6d), (0xfa70, 0xfad9),
    (0xfb1d, 0xfb1d), (0xfb1f, 0xfb1f), (0xfb2a, 0xfb36), (0xfb38, 0xfb3c), (0xfb3e, 0xfb3e),
    (0xfb40, 0xfb41), (0xfb43, 0xfb44), (0xfb46, 0xfb4e), (0xfff0, 0xffff),
];

/// Escape sequences for every code unit in [`UNSAFE_RANGES`].
///
/// Built on first use and shared for the life of the process. `LazyLock`
/// guarantees a single initialization even when several sessions hit the
/// slow path at once.
static ESCAPES: LazyLock<HashMap<u16, String>> = LazyLock::new(|| {
    (0..=u16::MAX)
        .filter(|&unit| is_unsafe_unit(unit))
        .map(|unit| (unit, format!("\\u{unit:04x}")))
        .collect()
});

/// Check whether a single UTF-16 code unit must be escaped.
#[inline]
#[must_use]
pub fn is_unsafe_unit(unit: u16) -> bool {
    UNSAFE_RANGES
        .binary_search_by(|&(lo, hi)| {
            if hi < unit {
                std::cmp::Ordering::Less
            } else if lo > unit {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Check whether a character needs escaping on the wire.
///
/// Characters outside the BMP always do: both of their surrogate halves are
/// in the unsafe set.
#[inline]
#[must_use]
pub fn needs_escape(ch: char) -> bool {
    let mut buf = [0u16; 2];
    ch.encode_utf16(&mut buf).iter().any(|&unit| is_unsafe_unit(unit))
}

/// Encode `text` as a JSON string literal safe for the SockJS transport.
///
/// Returns plain JSON string encoding when nothing needs extra escaping.
/// Otherwise every unsafe code unit is replaced with its lowercase `\uXXXX`
/// form; characters outside the BMP become two escaped surrogates.
#[must_use]
pub fn quote(text: &str) -> String {
    let quoted = serde_json::Value::from(text).to_string();

    if !quoted.chars().any(needs_escape) {
        return quoted;
    }

    let table = &*ESCAPES;
    let mut out = String::with_capacity(quoted.len() + 16);
    let mut buf = [0u16; 2];
    for ch in quoted.chars() {
        if !needs_escape(ch) {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut buf).iter() {
            match table.get(unit) {
                Some(escape) => out.push_str(escape),
                None => out.push_str(&format!("\\u{unit:04x}")),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_is_untouched() {
        assert_eq!(quote(r#"{"type":"close"}"#), r#""{\"type\":\"close\"}""#);
    }

    #[test]
    fn test_control_chars_use_json_escapes() {
        assert_eq!(quote("a\u{1}b"), "\"a\\u0001b\"");
        assert_eq!(quote("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_combining_mark_is_escaped() {
        let out = quote("e\u{0301}");
        assert_eq!(out, "\"e\\u0301\"");
        assert!(!out.contains('\u{0301}'));
    }

    #[test]
    fn test_ohm_sign_is_escaped() {
        assert_eq!(quote("\u{2126}"), "\"\\u2126\"");
    }

    #[test]
    fn test_astral_char_becomes_surrogate_pair() {
        assert_eq!(quote("\u{1F600}"), "\"\\ud83d\\ude00\"");
    }

    #[test]
    fn test_safe_non_ascii_is_kept() {
        assert_eq!(quote("Привет"), "\"Привет\"");
    }

    #[test]
    fn test_range_edges() {
        assert!(is_unsafe_unit(0x0000));
        assert!(is_unsafe_unit(0x001f));
        assert!(!is_unsafe_unit(0x0020));
        assert!(is_unsafe_unit(0x0300));
        assert!(is_unsafe_unit(0x0333));
        assert!(!is_unsafe_unit(0x0334));
        assert!(is_unsafe_unit(0xd800));
        assert!(is_unsafe_unit(0xdfff));
        assert!(is_unsafe_unit(0xfffe));
        assert!(is_unsafe_unit(0xffff));
        assert!(!is_unsafe_unit(0xffef));
    }

    #[test]
    fn test_ranges_are_sorted_and_disjoint() {
        for pair in UNSAFE_RANGES.windows(2) {
            assert!(pair[0].0 <= pair[0].1);
            assert!(pair[0].1 < pair[1].0, "{:x?} overlaps {:x?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_table_covers_every_unsafe_unit() {
        let expected: usize = UNSAFE_RANGES
            .iter()
            .map(|&(lo, hi)| usize::from(hi - lo) + 1)
            .sum();
        assert_eq!(ESCAPES.len(), expected);
        assert_eq!(ESCAPES.get(&0xfa10).map(String::as_str), Some("\\ufa10"));
    }
}
