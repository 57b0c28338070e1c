/// Kami phrases are laid out on three lines, shimo phrases on two.
pub const KAMI_LINES: usize = 3;
pub const SHIMO_LINES: usize = 2;

/// Longest single unspaced phrase kept on one line when two lines are requested.
const UNSPACED_LINE_LIMIT: usize = 7;

/// Breaks a phonetic phrase into at most `max_lines` display lines.
///
/// Whitespace (including the full-width space) separates lines and extra
/// segments beyond `max_lines` are dropped. A text made only of whitespace
/// comes back unchanged as a single line. An unspaced phrase longer than
/// seven characters is cut in half when two lines are requested.
pub fn split_to_lines(text: &str, max_lines: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = text.split_whitespace().collect();

    if parts.is_empty() {
        return vec![text.to_string()];
    }

    if parts.len() >= max_lines {
        return parts[..max_lines].iter().map(|part| part.to_string()).collect();
    }

    let length = text.chars().count();
    if max_lines == 2 && parts.len() == 1 && length > UNSPACED_LINE_LIMIT {
        let half = length.div_ceil(2);
        let cut = text
            .char_indices()
            .nth(half)
            .map(|(offset, _)| offset)
            .unwrap_or(text.len());
        return vec![text[..cut].to_string(), text[cut..].to_string()];
    }

    parts.into_iter().map(str::to_string).collect()
}
