pub mod bootstrap;
pub mod catalog;
pub mod clears;
pub mod config;
pub mod goro;
pub mod lines;
pub mod playback;
pub mod poem;
pub mod quiz;
pub mod range;
pub mod review;
pub mod schedule;
pub mod session;
pub mod shuffle;
pub mod tricky;

pub use bootstrap::{bootstrap_poems, bootstrap_range};
pub use catalog::{
    Catalog, CatalogLoadError, FETCH_FAILED_MESSAGE, JsonFileSource, PoemSource, PoemSourceError,
    WithBootstrapFallback,
};
pub use clears::{
    ClearError, ClearRecord, ClearStore, JsonFileClearStore, MemoryClearStore, TestKind, UserId,
};
pub use config::{AppConfig, ConfigError};
pub use goro::{CharRange, find_goro_range};
pub use lines::split_to_lines;
pub use playback::{AudioPlayer, AudioSettings, GoroPhase, GoroPlayback, PlaybackOutcome};
pub use poem::Poem;
pub use quiz::{AnswerOutcome, Attempt, QuizError, QuizItem, QuizMode, generate_quiz};
pub use range::{PoemRange, RangeError, parse_range};
pub use review::{
    JsonFileStore, MemoryStore, ReviewCursor, ReviewItem, ReviewQuestion, ReviewQueue, ReviewStore,
    StoreError,
};
pub use schedule::{FollowUp, FollowUpSchedule};
pub use session::{TestResult, TestScope, TestSession};
pub use shuffle::shuffled;
pub use tricky::TrickyHalf;
