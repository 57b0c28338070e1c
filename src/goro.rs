//! Locating a mnemonic ("goro") fragment inside a poem's phonetic text.
//!
//! The phonetic text and the mnemonic are authored separately, so they can
//! disagree on spacing and on a few historically interchangeable kana. Matching
//! ignores whitespace on both sides, retries once with those kana folded
//! together, and reports the result in character offsets of the original
//! phonetic text.

/// Continuation glyph used inside mnemonics for an omitted sound.
pub const ELISION_MARKER: char = '～';

/// Highlight span over a phonetic string, in characters. `length == 0` means no highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CharRange {
    pub start: usize,
    pub length: usize,
}

impl CharRange {
    pub const NONE: CharRange = CharRange {
        start: 0,
        length: 0,
    };

    /// Shown when the mnemonic could not be aligned: just the first character.
    pub const FIRST_CHAR: CharRange = CharRange {
        start: 0,
        length: 1,
    };

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Splits `text` into the parts before, inside and after the span.
    ///
    /// Offsets past the end of `text` are clamped, so a span computed for a
    /// different string never panics.
    pub fn split<'a>(&self, text: &'a str) -> (&'a str, &'a str, &'a str) {
        let start = byte_offset(text, self.start);
        let end = byte_offset(text, self.end());
        (&text[..start], &text[start..end], &text[end..])
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Strips elision markers and surrounding whitespace from a mnemonic.
pub fn goro_search_text(goro: &str) -> String {
    goro.replace(ELISION_MARKER, "").trim().to_string()
}

/// Finds where `goro` sits inside `hiragana`.
///
/// Returns [`CharRange::NONE`] when either side is empty after cleanup, the
/// aligned span when the fragment is found (directly or after kana folding),
/// and [`CharRange::FIRST_CHAR`] otherwise.
pub fn find_goro_range(hiragana: &str, goro: &str) -> CharRange {
    let search = goro_search_text(goro);
    if search.is_empty() || hiragana.is_empty() {
        return CharRange::NONE;
    }

    let host = StrippedText::new(hiragana);
    let needle: Vec<char> = search.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(range) = host.locate(&host.chars, &needle) {
        return range;
    }

    let folded_host: Vec<char> = host.chars.iter().copied().map(fold_kana).collect();
    let folded_needle: Vec<char> = needle.iter().copied().map(fold_kana).collect();

    host.locate(&folded_host, &folded_needle)
        .unwrap_or(CharRange::FIRST_CHAR)
}

/// Historical spellings and voicing differences that mnemonics are allowed to ignore.
/// Every mapping is one character to one character so offsets survive folding.
fn fold_kana(c: char) -> char {
    match c {
        'が' => 'か',
        'べ' => 'へ',
        'ゐ' => 'い',
        'ゑ' => 'え',
        other => other,
    }
}

/// Whitespace-free projection of a string, remembering where each kept
/// character sat in the original.
struct StrippedText {
    chars: Vec<char>,
    origin: Vec<usize>,
}

impl StrippedText {
    fn new(text: &str) -> Self {
        let (origin, chars) = text
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .unzip();

        Self { chars, origin }
    }

    /// Searches `needle` in `haystack` (which must be `self.chars` or a
    /// same-length folding of it) and maps the hit back to original offsets.
    fn locate(&self, haystack: &[char], needle: &[char]) -> Option<CharRange> {
        if needle.is_empty() || needle.len() > haystack.len() {
            return None;
        }

        let index = haystack
            .windows(needle.len())
            .position(|window| window == needle)?;

        let start = self.origin[index];
        let end = self.origin[index + needle.len() - 1] + 1;

        Some(CharRange {
            start,
            length: end - start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, length: usize) -> CharRange {
        CharRange { start, length }
    }

    #[test]
    fn search_text_drops_elision_and_padding() {
        assert_eq!(goro_search_text("あ～り"), "あり");
        assert_eq!(goro_search_text("  ～  "), "");
        assert_eq!(goro_search_text(""), "");
        assert_eq!(goro_search_text("   "), "");
    }

    #[test]
    fn empty_inputs_have_no_highlight() {
        assert_eq!(find_goro_range("", "あ"), CharRange::NONE);
        assert_eq!(find_goro_range("あいうえお", ""), CharRange::NONE);
        assert_eq!(find_goro_range("あいうえお", " ～ "), CharRange::NONE);
    }

    #[test]
    fn exact_match_reports_offset_and_length() {
        assert_eq!(find_goro_range("ありあけのつきを", "あり"), range(0, 2));
        assert_eq!(find_goro_range("ありあけのつきを", "つき"), range(5, 2));
    }

    #[test]
    fn spacing_is_ignored_but_measured_in_original_text() {
        assert_eq!(find_goro_range("あり あけの つきを", "ありあけ"), range(0, 5));
        assert_eq!(find_goro_range("あり あけの つきを", "のつき"), range(5, 4));
        assert_eq!(find_goro_range("あり　あけ", "あり あけ"), range(0, 5));
    }

    #[test]
    fn leading_whitespace_shifts_start() {
        assert_eq!(find_goro_range("  あきの たの", "たの"), range(6, 2));
    }

    #[test]
    fn historical_kana_are_folded() {
        assert_eq!(find_goro_range("かきくけこ", "がき"), range(0, 2));
        assert_eq!(find_goro_range("しろたへの", "たべ"), range(2, 2));
        assert_eq!(find_goro_range("ゐなの", "いな"), range(0, 2));
    }

    #[test]
    fn unmatched_falls_back_to_first_character() {
        assert_eq!(find_goro_range("あいう", "xyz"), CharRange::FIRST_CHAR);
        assert_eq!(find_goro_range("あい", "あいうえお"), CharRange::FIRST_CHAR);
        assert_eq!(find_goro_range("   ", "あ"), CharRange::FIRST_CHAR);
    }

    #[test]
    fn elision_marker_is_removed_before_search() {
        assert_eq!(find_goro_range("ありあけ", "あ～り"), range(0, 2));
    }

    #[test]
    fn highlight_never_exceeds_host() {
        let hosts = ["", " ", "あ", "あ い", "ありあけの つきを", "  か  "];
        let goros = ["", "あ", "い", "か", "つきを", "x", "あいうえおか", " ～ "];

        for host in hosts {
            for goro in goros {
                let found = find_goro_range(host, goro);
                if found.length > 0 {
                    assert!(
                        found.end() <= host.chars().count(),
                        "{found:?} overflows {host:?} for {goro:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn split_separates_highlight() {
        let text = "あり あけの";
        let (before, inside, after) = range(3, 2).split(text);
        assert_eq!((before, inside, after), ("あり ", "あけ", "の"));

        let (before, inside, after) = range(4, 10).split(text);
        assert_eq!((before, inside, after), ("あり あ", "けの", ""));
    }
}
