use crate::{Poem, PoemRange};

/// Range of the first study block, which must load even when the poem store is down.
pub fn bootstrap_range() -> PoemRange {
    PoemRange::first_block()
}

fn poem(
    id: u32,
    (kami, shimo): (&str, &str),
    (kami_hiragana, shimo_hiragana): (&str, &str),
    (kami_goro, shimo_goro): (&str, &str),
    goro_kaisetsu: &str,
) -> Poem {
    Poem {
        id,
        kami: kami.to_string(),
        shimo: shimo.to_string(),
        kami_hiragana: kami_hiragana.to_string(),
        shimo_hiragana: shimo_hiragana.to_string(),
        kami_goro: kami_goro.to_string(),
        shimo_goro: shimo_goro.to_string(),
        goro_kaisetsu: goro_kaisetsu.to_string(),
        kami_audio_url: None,
        shimo_audio_url: None,
        kami_goro_audio_url: None,
        shimo_goro_audio_url: None,
    }
}

/// Static copy of poems 1 to 4.
pub fn bootstrap_poems() -> Vec<Poem> {
    vec![
        poem(
            1,
            (
                "秋の田の かりほの庵の 苫をあらみ",
                "わが衣手は 露にぬれつつ",
            ),
            (
                "あきのたの かりほのいほの とまをあらみ",
                "わがころもでは つゆにぬれつつ",
            ),
            ("あきの～", "わがころも"),
            "秋の田で わが衣がぬれる",
        ),
        poem(
            2,
            ("春過ぎて 夏来にけらし 白妙の", "衣干すてふ 天の香具山"),
            (
                "はるすぎて なつきにけらし しろたへの",
                "ころもほすてふ あまのかぐやま",
            ),
            ("はるす", "ころもほす"),
            "春が過ぎたら 衣を干す",
        ),
        poem(
            3,
            (
                "あしびきの 山鳥の尾の しだり尾の",
                "ながながし夜を ひとりかも寝む",
            ),
            (
                "あしびきの やまどりのをの しだりをの",
                "ながながしよを ひとりかもねむ",
            ),
            ("あし～", "ながながし"),
            "足の長い 山鳥の尾",
        ),
        poem(
            4,
            (
                "田子の浦に うち出でてみれば 白妙の",
                "富士の高嶺に 雪は降りつつ",
            ),
            (
                "たごのうらに うちいでてみれば しろたへの",
                "ふじのたかねに ゆきはふりつつ",
            ),
            ("たご", "ふじの"),
            "田子の浦から 富士山を見る",
        ),
    ]
}
