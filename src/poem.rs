use std::fmt;

use serde::Deserialize;

use crate::goro::{CharRange, find_goro_range};
use crate::lines::{KAMI_LINES, SHIMO_LINES, split_to_lines};

/// Represents one poem of the corpus used for quiz questions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Poem {
    /// Position in the anthology, 1 to 100.
    pub id: u32,
    /// First half in printed form.
    pub kami: String,
    /// Second half in printed form.
    pub shimo: String,
    /// First half in kana, spaced into phrases.
    pub kami_hiragana: String,
    /// Second half in kana, spaced into phrases.
    pub shimo_hiragana: String,
    /// Mnemonic fragment for the first half.
    #[serde(default)]
    pub kami_goro: String,
    /// Mnemonic fragment for the second half.
    #[serde(default)]
    pub shimo_goro: String,
    /// Explanation tying the two mnemonics together.
    #[serde(default)]
    pub goro_kaisetsu: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub kami_audio_url: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub shimo_audio_url: Option<String>,
    /// Some exports name this column `goro_kami_audio_url`.
    #[serde(default, alias = "goro_kami_audio_url", deserialize_with = "non_empty")]
    pub kami_goro_audio_url: Option<String>,
    #[serde(default, alias = "goro_shimo_audio_url", deserialize_with = "non_empty")]
    pub shimo_goro_audio_url: Option<String>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|url| !url.trim().is_empty()))
}

impl Poem {
    pub fn kami_goro_range(&self) -> CharRange {
        find_goro_range(&self.kami_hiragana, &self.kami_goro)
    }

    pub fn shimo_goro_range(&self) -> CharRange {
        find_goro_range(&self.shimo_hiragana, &self.shimo_goro)
    }

    pub fn kami_lines(&self) -> Vec<String> {
        split_to_lines(&self.kami_hiragana, KAMI_LINES)
    }

    pub fn shimo_lines(&self) -> Vec<String> {
        split_to_lines(&self.shimo_hiragana, SHIMO_LINES)
    }

    /// Mnemonic clips in playback order, skipping any that are missing.
    pub fn goro_audio_urls(&self) -> Vec<&str> {
        [&self.kami_goro_audio_url, &self.shimo_goro_audio_url]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .collect()
    }
}

impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} / {}", self.id, self.kami, self.shimo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tago() -> Poem {
        Poem {
            id: 4,
            kami: "田子の浦に うち出でてみれば 白妙の".to_string(),
            shimo: "富士の高嶺に 雪は降りつつ".to_string(),
            kami_hiragana: "たごのうらに うちいでてみれば しろたへの".to_string(),
            shimo_hiragana: "ふじのたかねに ゆきはふりつつ".to_string(),
            kami_goro: "たご～".to_string(),
            shimo_goro: "ふじの".to_string(),
            goro_kaisetsu: "田子の浦から富士山".to_string(),
            kami_audio_url: None,
            shimo_audio_url: None,
            kami_goro_audio_url: Some("https://audio.example/4-kami-goro.mp3".to_string()),
            shimo_goro_audio_url: None,
        }
    }

    #[test]
    fn goro_ranges_align_with_hiragana() {
        let poem = tago();
        assert_eq!(poem.kami_goro_range(), CharRange { start: 0, length: 2 });
        assert_eq!(poem.shimo_goro_range(), CharRange { start: 0, length: 3 });
    }

    #[test]
    fn lines_follow_phrase_spacing() {
        let poem = tago();
        assert_eq!(
            poem.kami_lines(),
            vec!["たごのうらに", "うちいでてみれば", "しろたへの"]
        );
        assert_eq!(poem.shimo_lines(), vec!["ふじのたかねに", "ゆきはふりつつ"]);
    }

    #[test]
    fn goro_audio_skips_missing_clips() {
        assert_eq!(
            tago().goro_audio_urls(),
            vec!["https://audio.example/4-kami-goro.mp3"]
        );
    }

    #[test]
    fn display_includes_id_and_both_halves() {
        let formatted = format!("{}", tago());
        assert!(formatted.starts_with("4. 田子の浦に"));
        assert!(formatted.contains(" / 富士の高嶺に"));
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let json = r#"{
            "id": 2,
            "kami": "春過ぎて 夏来にけらし 白妙の",
            "shimo": "衣干すてふ 天の香具山",
            "kami_hiragana": "はるすぎて なつきにけらし しろたへの",
            "shimo_hiragana": "ころもほすてふ あまのかぐやま"
        }"#;

        let parsed: Poem = serde_json::from_str(json).expect("poem should parse with defaults");

        assert!(parsed.kami_goro.is_empty());
        assert!(parsed.kami_audio_url.is_none());
        assert_eq!(parsed.kami_goro_range(), CharRange::NONE);
    }

    #[test]
    fn empty_urls_and_alternate_columns() {
        let json = r#"{
            "id": 3,
            "kami": "あしびきの 山鳥の尾の しだり尾の",
            "shimo": "ながながし夜を ひとりかも寝む",
            "kami_hiragana": "あしびきの やまどりのをの しだりをの",
            "shimo_hiragana": "ながながしよを ひとりかもねむ",
            "kami_audio_url": "",
            "goro_kami_audio_url": "https://audio.example/3-kami-goro.mp3",
            "goro_shimo_audio_url": "  "
        }"#;

        let parsed: Poem = serde_json::from_str(json).expect("poem should parse");

        assert!(parsed.kami_audio_url.is_none());
        assert_eq!(
            parsed.kami_goro_audio_url.as_deref(),
            Some("https://audio.example/3-kami-goro.mp3")
        );
        assert!(parsed.shimo_goro_audio_url.is_none());
    }
}
