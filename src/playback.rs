//! Audio sequencing for mnemonic clips.
//!
//! Playback problems never stop a lesson: every clip finishes with a
//! [`PlaybackOutcome`], never an error. [`GoroPlayback`] plays a question's two
//! mnemonic clips at most once per question and drives the kami/shimo
//! highlight while it does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::poem::Poem;

pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Appended to clip URLs as `v=<version>` so updated recordings bypass caches.
    pub version: Option<String>,
    /// Longest wait for a single clip before moving on.
    pub timeout_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            version: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AudioSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn resolve_url(&self, url: &str) -> String {
        match self.version.as_deref() {
            Some(version) if !url.is_empty() && !version.is_empty() => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}v={version}")
            }
            _ => url.to_string(),
        }
    }
}

/// How a clip finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Ended,
    LoadFailed,
    PlayFailed,
    TimedOut,
    /// Nothing to play, or the player has no output.
    Skipped,
}

pub trait AudioPlayer {
    /// Plays `url` and returns once it ends, fails, or `timeout` passes.
    fn play_once(&self, url: &str, timeout: Duration) -> PlaybackOutcome;

    /// Halts anything playing or queued.
    fn stop_all(&self);
}

/// Player without an audio device; clips are logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn play_once(&self, url: &str, timeout: Duration) -> PlaybackOutcome {
        log::info!("audio clip {url} (timeout {}ms)", timeout.as_millis());
        PlaybackOutcome::Skipped
    }

    fn stop_all(&self) {
        log::debug!("audio stopped");
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Plays `urls` in order, stopping early once `token` is cancelled.
/// Empty URLs are skipped. Returns how many clips were started.
pub fn play_sequence<P: AudioPlayer + ?Sized>(
    player: &P,
    urls: &[&str],
    settings: &AudioSettings,
    token: &CancellationToken,
) -> usize {
    let mut started = 0;

    for url in urls {
        if token.is_cancelled() {
            break;
        }
        if url.is_empty() {
            continue;
        }

        let outcome = player.play_once(&settings.resolve_url(url), settings.timeout());
        if outcome != PlaybackOutcome::Ended {
            log::debug!("clip {url} finished with {outcome:?}");
        }
        started += 1;
    }

    started
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoroPhase {
    Idle,
    PlayingKami,
    PlayingShimo,
    Done,
}

impl GoroPhase {
    pub fn highlights_kami(self) -> bool {
        matches!(
            self,
            GoroPhase::PlayingKami | GoroPhase::PlayingShimo | GoroPhase::Done
        )
    }

    pub fn highlights_shimo(self) -> bool {
        matches!(self, GoroPhase::PlayingShimo | GoroPhase::Done)
    }
}

#[derive(Debug)]
struct PlaybackState {
    question: Option<u32>,
    phase: GoroPhase,
    token: CancellationToken,
}

/// Per-question mnemonic playback.
///
/// The owner calls [`GoroPlayback::on_question_changed`] once whenever the
/// active question changes; that cancels any run still playing for the old
/// question. Runs can be driven from another thread while the owner keeps
/// reading [`GoroPlayback::phase`].
#[derive(Debug)]
pub struct GoroPlayback {
    state: Mutex<PlaybackState>,
}

impl Default for GoroPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl GoroPlayback {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlaybackState {
                question: None,
                phase: GoroPhase::Idle,
                token: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches to `poem_id`, cancelling the previous question's run and
    /// halting whatever `player` still has in flight.
    pub fn on_question_changed<P: AudioPlayer + ?Sized>(&self, player: &P, poem_id: u32) {
        {
            let mut state = self.lock();
            state.token.cancel();
            state.token = CancellationToken::new();
            state.question = Some(poem_id);
            state.phase = GoroPhase::Idle;
        }

        player.stop_all();
        log::debug!("goro playback reset for poem {poem_id}");
    }

    pub fn phase(&self) -> GoroPhase {
        self.lock().phase
    }

    pub fn question(&self) -> Option<u32> {
        self.lock().question
    }

    /// Claims the run for `poem_id` if it is the active question and nothing has played yet.
    fn begin(&self, poem_id: u32) -> Option<CancellationToken> {
        let mut state = self.lock();
        if state.question != Some(poem_id) || state.phase != GoroPhase::Idle {
            return None;
        }

        state.phase = GoroPhase::PlayingKami;
        Some(state.token.clone())
    }

    fn advance(
        &self,
        poem_id: u32,
        token: &CancellationToken,
        from: GoroPhase,
        to: GoroPhase,
    ) -> bool {
        let mut state = self.lock();
        if token.is_cancelled() || state.question != Some(poem_id) || state.phase != from {
            return false;
        }

        log::debug!("poem {poem_id}: {from:?} -> {to:?}");
        state.phase = to;
        true
    }

    /// Plays the kami clip then the shimo clip after a correct answer,
    /// moving the highlight along.
    ///
    /// Does nothing if `poem` is not the active question or its run already
    /// started. Returns the phase reached, which is [`GoroPhase::Done`] unless
    /// the question changed mid-run.
    pub fn play_correct<P: AudioPlayer + ?Sized>(
        &self,
        player: &P,
        poem: &Poem,
        settings: &AudioSettings,
    ) -> GoroPhase {
        let Some(token) = self.begin(poem.id) else {
            return self.phase();
        };

        if let Some(url) = &poem.kami_goro_audio_url {
            play_sequence(player, &[url.as_str()], settings, &token);
        }

        if !self.advance(poem.id, &token, GoroPhase::PlayingKami, GoroPhase::PlayingShimo) {
            return GoroPhase::PlayingKami;
        }

        if let Some(url) = &poem.shimo_goro_audio_url {
            play_sequence(player, &[url.as_str()], settings, &token);
        }

        if !self.advance(poem.id, &token, GoroPhase::PlayingShimo, GoroPhase::Done) {
            return GoroPhase::PlayingShimo;
        }

        GoroPhase::Done
    }

    /// Plays both mnemonic clips after a wrong answer, without highlighting.
    /// Returns how many clips were started.
    pub fn play_wrong<P: AudioPlayer + ?Sized>(
        &self,
        player: &P,
        poem: &Poem,
        settings: &AudioSettings,
    ) -> usize {
        let token = {
            let state = self.lock();
            if state.question != Some(poem.id) {
                return 0;
            }
            state.token.clone()
        };

        play_sequence(player, &poem.goro_audio_urls(), settings, &token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::bootstrap_poems;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingPlayer<'a> {
        played: RefCell<Vec<String>>,
        timeouts: RefCell<Vec<Duration>>,
        stops: Cell<usize>,
        on_play: Option<Box<dyn Fn(&str) + 'a>>,
    }

    impl AudioPlayer for RecordingPlayer<'_> {
        fn play_once(&self, url: &str, timeout: Duration) -> PlaybackOutcome {
            self.played.borrow_mut().push(url.to_string());
            self.timeouts.borrow_mut().push(timeout);
            if let Some(hook) = &self.on_play {
                hook(url);
            }
            PlaybackOutcome::Ended
        }

        fn stop_all(&self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    fn poem_with_clips() -> Poem {
        let mut poem = bootstrap_poems().remove(0);
        poem.kami_goro_audio_url = Some("kami.mp3".to_string());
        poem.shimo_goro_audio_url = Some("shimo.mp3".to_string());
        poem
    }

    #[test]
    fn cache_buster_respects_existing_query() {
        let settings = AudioSettings {
            version: Some("3".to_string()),
            ..AudioSettings::default()
        };

        assert_eq!(settings.resolve_url("a.mp3"), "a.mp3?v=3");
        assert_eq!(settings.resolve_url("a.mp3?x=1"), "a.mp3?x=1&v=3");
        assert_eq!(settings.resolve_url(""), "");
        assert_eq!(AudioSettings::default().resolve_url("a.mp3"), "a.mp3");
        assert_eq!(AudioSettings::default().timeout(), Duration::from_secs(8));
    }

    #[test]
    fn sequence_plays_in_order_and_skips_empty() {
        let player = RecordingPlayer::default();
        let started = play_sequence(
            &player,
            &["a.mp3", "", "b.mp3"],
            &AudioSettings::default(),
            &CancellationToken::new(),
        );

        assert_eq!(started, 2);
        assert_eq!(*player.played.borrow(), vec!["a.mp3", "b.mp3"]);
    }

    #[test]
    fn cancelled_sequence_plays_nothing() {
        let player = RecordingPlayer::default();
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(play_sequence(&player, &["a.mp3"], &AudioSettings::default(), &token), 0);
        assert!(player.played.borrow().is_empty());
    }

    #[test]
    fn correct_answer_plays_both_clips_once() {
        let playback = GoroPlayback::new();
        let player = RecordingPlayer::default();
        let poem = poem_with_clips();
        let settings = AudioSettings::default();

        playback.on_question_changed(&player, poem.id);
        assert_eq!(playback.phase(), GoroPhase::Idle);

        assert_eq!(playback.play_correct(&player, &poem, &settings), GoroPhase::Done);
        assert!(playback.phase().highlights_kami());
        assert!(playback.phase().highlights_shimo());

        // A second trigger for the same question is ignored.
        assert_eq!(playback.play_correct(&player, &poem, &settings), GoroPhase::Done);
        assert_eq!(*player.played.borrow(), vec!["kami.mp3", "shimo.mp3"]);
    }

    #[test]
    fn inactive_question_does_not_play() {
        let playback = GoroPlayback::new();
        let player = RecordingPlayer::default();
        let poem = poem_with_clips();

        assert_eq!(
            playback.play_correct(&player, &poem, &AudioSettings::default()),
            GoroPhase::Idle
        );

        playback.on_question_changed(&player, poem.id + 1);
        assert_eq!(playback.play_wrong(&player, &poem, &AudioSettings::default()), 0);
        assert!(player.played.borrow().is_empty());
    }

    #[test]
    fn question_change_aborts_running_sequence() {
        let playback = GoroPlayback::new();
        let poem = poem_with_clips();
        let next_id = poem.id + 1;

        let player = RecordingPlayer {
            on_play: Some(Box::new(|url: &str| {
                if url == "kami.mp3" {
                    playback.on_question_changed(&SilentPlayer, next_id);
                }
            })),
            ..RecordingPlayer::default()
        };

        playback.on_question_changed(&player, poem.id);
        let reached = playback.play_correct(&player, &poem, &AudioSettings::default());

        assert_eq!(reached, GoroPhase::PlayingKami);
        assert_eq!(*player.played.borrow(), vec!["kami.mp3"]);
        assert_eq!(playback.question(), Some(next_id));
        assert_eq!(playback.phase(), GoroPhase::Idle);
    }

    #[test]
    fn wrong_answer_plays_without_highlight() {
        let playback = GoroPlayback::new();
        let player = RecordingPlayer::default();
        let poem = poem_with_clips();

        playback.on_question_changed(&player, poem.id);
        assert_eq!(playback.play_wrong(&player, &poem, &AudioSettings::default()), 2);
        assert_eq!(playback.phase(), GoroPhase::Idle);
        assert!(!playback.phase().highlights_kami());
    }

    #[test]
    fn runs_across_threads() {
        let playback = Arc::new(GoroPlayback::new());
        let poem = poem_with_clips();
        playback.on_question_changed(&SilentPlayer, poem.id);

        let worker = {
            let playback = Arc::clone(&playback);
            let poem = poem.clone();
            std::thread::spawn(move || {
                playback.play_correct(&SilentPlayer, &poem, &AudioSettings::default())
            })
        };

        assert_eq!(worker.join().expect("worker should finish"), GoroPhase::Done);
        assert_eq!(playback.phase(), GoroPhase::Done);
    }

    #[test]
    fn question_change_stops_the_player() {
        let playback = GoroPlayback::new();
        let player = RecordingPlayer::default();

        playback.on_question_changed(&player, 1);
        playback.on_question_changed(&player, 2);

        assert_eq!(player.stops.get(), 2);
        assert_eq!(playback.question(), Some(2));
    }

    #[test]
    fn configured_timeout_reaches_the_player() {
        let player = RecordingPlayer::default();
        let settings = AudioSettings {
            timeout_ms: 1500,
            ..AudioSettings::default()
        };

        play_sequence(&player, &["a.mp3", "b.mp3"], &settings, &CancellationToken::new());

        assert_eq!(
            *player.timeouts.borrow(),
            vec![Duration::from_millis(1500), Duration::from_millis(1500)]
        );
    }
}
