use std::io::{self, BufRead, StdinLock, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use hyakunin::clears::{ALL_RANGE_TOKEN, is_cleared, list_clears};
use hyakunin::playback::SilentPlayer;
use hyakunin::schedule::BlockMenu;
use hyakunin::{
    AnswerOutcome, AppConfig, Attempt, AudioPlayer, AudioSettings, ClearRecord, FollowUp,
    GoroPlayback, JsonFileClearStore, JsonFileSource, JsonFileStore, Poem, PoemRange, PoemSource,
    QuizItem, ReviewCursor, ReviewQueue, TestKind, TestScope, TestSession, TrickyHalf, UserId,
    WithBootstrapFallback, parse_range,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "hyakunin", version, about = "Hyakunin Isshu memorisation drills")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the poems of a range with their mnemonics marked
    Study {
        /// Range such as "5-8"; the first block when omitted
        range: Option<String>,
    },

    /// Take a test over a range, or "all" for the hundred-poem test
    Test {
        range: Option<String>,

        /// Seed for question order and options
        #[arg(long)]
        seed: Option<u64>,

        /// Signed-in learner; clears are only recorded for a user
        #[arg(long)]
        user: Option<String>,
    },

    /// Drill the poems that are easy to confuse
    Tricky {
        #[arg(value_enum)]
        half: Half,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Work with the review queue
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Show the learning list, or what follows a test over a range
    Schedule {
        range: Option<String>,

        /// Mark the tests this learner has cleared
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReviewAction {
    List,
    Remove {
        id: String,
    },
    /// Ask the queued questions again
    Practice {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Half {
    Kami,
    Shimo,
}

impl From<Half> for TrickyHalf {
    fn from(half: Half) -> Self {
        match half {
            Half::Kami => TrickyHalf::Kami,
            Half::Shimo => TrickyHalf::Shimo,
        }
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn range_arg(token: Option<&str>) -> anyhow::Result<PoemRange> {
    match token {
        None => Ok(PoemRange::first_block()),
        Some(token) => parse_range(Some(token)).with_context(|| format!("invalid range {token}")),
    }
}

fn source(config: &AppConfig) -> WithBootstrapFallback<JsonFileSource> {
    WithBootstrapFallback::new(JsonFileSource::new(&config.poems_path))
}

fn load_poems(config: &AppConfig, range: PoemRange) -> anyhow::Result<Vec<Poem>> {
    match source(config).poems_in(range) {
        Ok(poems) => Ok(poems),
        Err(error) => bail!("{}", error.user_message()),
    }
}

fn marked(text: &str, range: hyakunin::CharRange) -> String {
    let (before, goro, after) = range.split(text);
    if goro.is_empty() {
        text.to_string()
    } else {
        format!("{before}[{goro}]{after}")
    }
}

fn study(config: &AppConfig, token: Option<&str>) -> anyhow::Result<()> {
    let range = range_arg(token)?;

    for poem in load_poems(config, range)? {
        println!("{}.", poem.id);
        let kami = marked(&poem.kami_hiragana, poem.kami_goro_range());
        let shimo = marked(&poem.shimo_hiragana, poem.shimo_goro_range());
        for line in hyakunin::split_to_lines(&kami, hyakunin::lines::KAMI_LINES) {
            println!("  {line}");
        }
        for line in hyakunin::split_to_lines(&shimo, hyakunin::lines::SHIMO_LINES) {
            println!("    {line}");
        }
        if !poem.goro_kaisetsu.is_empty() {
            println!("  ({})", poem.goro_kaisetsu);
        }
    }

    Ok(())
}

/// Terminal front end for asking questions and playing their mnemonics.
struct Console {
    input: StdinLock<'static>,
    playback: GoroPlayback,
    player: SilentPlayer,
    audio: AudioSettings,
}

impl Console {
    fn new(config: &AppConfig) -> Self {
        Self {
            input: io::stdin().lock(),
            playback: GoroPlayback::new(),
            player: SilentPlayer,
            audio: config.audio.clone(),
        }
    }

    /// Next trimmed input line, `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks `item` until it is answered correctly or the learner moves on
    /// with an empty line. Returns `false` at end of input.
    fn ask<F>(&mut self, item: &QuizItem, poem: Option<&Poem>, mut answer: F) -> io::Result<bool>
    where
        F: FnMut(u32) -> AnswerOutcome,
    {
        self.playback.on_question_changed(&self.player, item.poem_id);

        println!("{}", item.prompt);
        for (index, option) in item.options.iter().enumerate() {
            println!("  {}. {}", index + 1, option.text);
        }

        loop {
            let Some(line) = self.read_line()? else {
                return Ok(false);
            };
            if line.is_empty() {
                return Ok(true);
            }

            let Some(option) = line
                .parse::<usize>()
                .ok()
                .and_then(|choice| choice.checked_sub(1))
                .and_then(|index| item.options.get(index))
            else {
                println!("choose 1-{}", item.options.len());
                continue;
            };

            match answer(option.poem_id) {
                AnswerOutcome::Correct { .. } => {
                    println!("correct");
                    if let Some(poem) = poem {
                        self.playback.play_correct(&self.player, poem, &self.audio);
                        println!(
                            "  {} / {}",
                            marked(&poem.kami_hiragana, poem.kami_goro_range()),
                            marked(&poem.shimo_hiragana, poem.shimo_goro_range())
                        );
                    }
                    return Ok(true);
                }
                AnswerOutcome::Wrong => {
                    println!("wrong");
                    if let Some(poem) = poem {
                        self.playback.play_wrong(&self.player, poem, &self.audio);
                    }
                }
                AnswerOutcome::Repeated => println!("already tried"),
                AnswerOutcome::Closed => return Ok(true),
            }
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.player.stop_all();
    }
}

fn run_session(
    config: &AppConfig,
    mut session: TestSession,
    rng: &mut StdRng,
    user: Option<UserId>,
) -> anyhow::Result<()> {
    let mut queue = ReviewQueue::new(JsonFileStore::new(&config.review_path));
    let mut console = Console::new(config);

    loop {
        let Some(item) = session.current(rng)?.cloned() else {
            break;
        };
        let poem = session.poem(item.poem_id).cloned();

        println!();
        print!("({}/{}) ", session.position() + 1, session.total());
        console.ask(&item, poem.as_ref(), |chosen| session.answer(chosen))?;

        session.advance(&mut queue);
    }

    let mut clears = JsonFileClearStore::new(&config.clears_path);
    let result = session.finish(&mut clears, user.as_ref());
    println!();
    println!(
        "score {}/{}, first try {}/{}",
        result.score, result.total, result.first_try, result.total
    );

    if result.is_perfect() {
        if let (Some((kind, range)), Some(user)) = (session.clear_key(), user.as_ref()) {
            let records = list_clears(&clears, Some(user))?;
            if is_cleared(&records, kind, &range) {
                println!("cleared {} {range}", kind.label());
            }
        }
    }

    if let TestScope::Range(range) = session.scope() {
        for follow_up in config.schedule.follow_ups(range) {
            println!("  {}", describe(follow_up));
        }
    }

    Ok(())
}

fn test(
    config: &AppConfig,
    token: Option<&str>,
    seed: Option<u64>,
    user: Option<String>,
) -> anyhow::Result<()> {
    let scope = if token == Some(ALL_RANGE_TOKEN) {
        TestScope::All
    } else {
        TestScope::Range(range_arg(token)?)
    };
    let range = match scope {
        TestScope::Range(range) => range,
        _ => PoemRange::all(),
    };

    let mut rng = rng(seed);
    let poems = load_poems(config, range)?;
    let session = TestSession::new(scope, poems).shuffled(&mut rng);

    run_session(config, session, &mut rng, user.map(UserId))
}

fn tricky(config: &AppConfig, half: Half, seed: Option<u64>) -> anyhow::Result<()> {
    let mut rng = rng(seed);
    let poems = load_poems(config, PoemRange::all())?;
    let session = TestSession::new(TestScope::Tricky(half.into()), poems).shuffled(&mut rng);

    if session.total() == 0 {
        bail!("no tricky sets are fully loaded");
    }

    run_session(config, session, &mut rng, None)
}

fn practice(config: &AppConfig, seed: Option<u64>) -> anyhow::Result<()> {
    let mut queue = ReviewQueue::new(JsonFileStore::new(&config.review_path));
    let mut cursor = ReviewCursor::new();
    let mut rng = rng(seed);
    let mut console = Console::new(config);

    while let Some(review) = cursor.current(&queue) {
        let poems = load_poems(config, review.question.source_range())?;
        let item = review
            .question
            .rebuild(&mut rng, &poems)
            .with_context(|| format!("cannot rebuild review item {}", review.id))?;
        let poem = poems.iter().find(|poem| poem.id == item.poem_id);
        let mut attempt = Attempt::new(item.poem_id);

        println!();
        print!("({}/{}) ", cursor.index() + 1, queue.len());
        if !console.ask(&item, poem, |chosen| attempt.answer(chosen))? {
            break;
        }

        println!("r: remove from review, q: quit, enter: next");
        match console.read_line()?.as_deref() {
            None | Some("q") => break,
            Some("r") => {
                cursor.remove(&mut queue, &review.id);
            }
            Some(_) => cursor.skip(&queue),
        }
    }

    if queue.is_empty() {
        println!("nothing to review");
    }

    Ok(())
}

fn review(config: &AppConfig, action: ReviewAction) -> anyhow::Result<()> {
    let mut queue = ReviewQueue::new(JsonFileStore::new(&config.review_path));

    match action {
        ReviewAction::List => {
            for item in queue.list() {
                println!(
                    "{}  {} poem {}",
                    item.id,
                    item.question.kind(),
                    item.question.poem_id()
                );
            }
        }
        ReviewAction::Remove { id } => {
            if !queue.remove(&id) {
                bail!("no review item with id {id}");
            }
        }
        ReviewAction::Practice { seed } => practice(config, seed)?,
    }

    Ok(())
}

fn describe(follow_up: FollowUp) -> String {
    match follow_up {
        FollowUp::Restudy(range) => format!("study {range} again"),
        FollowUp::EightTest(range) => format!("8-poem test {range}"),
        FollowUp::SummaryTest(range) => format!("summary test {range}"),
        FollowUp::NextBlock(range) => format!("next block {range}"),
        FollowUp::BackToList => "back to list".to_string(),
    }
}

fn check(records: &[ClearRecord], kind: TestKind, range: &str) -> &'static str {
    if is_cleared(records, kind, range) { " *" } else { "" }
}

fn describe_menu(menu: &BlockMenu, records: &[ClearRecord]) -> String {
    let block = menu.block.to_string();
    let mut line = format!("{block}{}", check(records, TestKind::Four, &block));
    if let Some(eight) = menu.eight_test {
        let eight = eight.to_string();
        line.push_str(&format!("  8-poem {eight}{}", check(records, TestKind::Eight, &eight)));
    }
    if let Some(summary) = menu.summary_test {
        let summary = summary.to_string();
        line.push_str(&format!(
            "  summary {summary}{}",
            check(records, TestKind::Summary, &summary)
        ));
    }
    line
}

fn schedule(config: &AppConfig, token: Option<&str>, user: Option<String>) -> anyhow::Result<()> {
    match token {
        Some(token) => {
            let range = range_arg(Some(token))?;
            for follow_up in config.schedule.follow_ups(range) {
                println!("{}", describe(follow_up));
            }
        }
        None => {
            let user = user.map(UserId);
            let store = JsonFileClearStore::new(&config.clears_path);
            let records = list_clears(&store, user.as_ref())?;

            for menu in config.schedule.learning_list() {
                println!("{}", describe_menu(&menu, &records));
            }
            println!(
                "100-poem {ALL_RANGE_TOKEN}{}",
                check(&records, TestKind::Hundred, ALL_RANGE_TOKEN)
            );
            if user.is_some() {
                println!("(* cleared)");
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = AppConfig::load_or_default(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Commands::Study { range } => study(&config, range.as_deref()),
            Commands::Test { range, seed, user } => test(&config, range.as_deref(), seed, user),
            Commands::Tricky { half, seed } => tricky(&config, half, seed),
            Commands::Review { action } => review(&config, action),
            Commands::Schedule { range, user } => schedule(&config, range.as_deref(), user),
        });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_argument_defaults_to_first_block() {
        assert_eq!(range_arg(None).ok(), Some(PoemRange::first_block()));
        assert_eq!(range_arg(Some("5-8")).ok(), "5-8".parse::<PoemRange>().ok());
    }

    #[test]
    fn invalid_range_argument_is_an_error() {
        for token in ["5-4", "0-3", "abc", ""] {
            let error = range_arg(Some(token)).expect_err("range should be rejected");
            assert_eq!(error.to_string(), format!("invalid range {token}"));
        }
    }
}
