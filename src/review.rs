//! Questions the learner missed, kept for later practice.
//!
//! The queue is a set keyed by [`ReviewQuestion`]: adding a question that is
//! already queued does nothing. Every operation re-reads the backing store and
//! writes the full collection back, so several processes sharing one store see
//! each other's changes at the granularity of a whole read-modify-write cycle,
//! with the last writer winning.
//!
//! Stored content is parsed as a whole. A single malformed entry makes the
//! entire list read as empty (logged at `warn` with the store path), and the
//! next successful write replaces what was there.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::poem::Poem;
use crate::quiz::{
    QuizError, QuizItem, QuizMode, RANGE_OPTION_COUNT, generate_fixed_quiz, generate_quiz,
};
use crate::range::PoemRange;

/// What was asked, enough to rebuild the exact question later.
///
/// Two queued items with equal `ReviewQuestion`s are the same question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewQuestion {
    /// Missed in a block, 8-poem or summary test over `range`.
    Range {
        #[serde(rename = "poemId")]
        poem_id: u32,
        range: PoemRange,
    },
    /// Missed in the full 100-poem test.
    All {
        #[serde(rename = "poemId")]
        poem_id: u32,
    },
    /// Missed in a drill of confusable first halves.
    KamiTricky {
        #[serde(rename = "poemId")]
        poem_id: u32,
        #[serde(rename = "choicePoemIds")]
        choice_poem_ids: Vec<u32>,
    },
    /// Missed in a drill of confusable second halves.
    ShimoTricky {
        #[serde(rename = "poemId")]
        poem_id: u32,
        #[serde(rename = "choicePoemIds")]
        choice_poem_ids: Vec<u32>,
    },
}

impl ReviewQuestion {
    pub fn poem_id(&self) -> u32 {
        match self {
            ReviewQuestion::Range { poem_id, .. }
            | ReviewQuestion::All { poem_id }
            | ReviewQuestion::KamiTricky { poem_id, .. }
            | ReviewQuestion::ShimoTricky { poem_id, .. } => *poem_id,
        }
    }

    /// Poems that must be loaded to ask this question again.
    pub fn source_range(&self) -> PoemRange {
        match self {
            ReviewQuestion::Range { range, .. } => *range,
            _ => PoemRange::all(),
        }
    }

    /// Builds the question again from `poems`.
    ///
    /// Range questions draw distractors from their own range only, full-test
    /// questions from every poem given, and tricky questions offer exactly
    /// the stored choices.
    pub fn rebuild<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        poems: &[Poem],
    ) -> Result<QuizItem, QuizError> {
        match self {
            ReviewQuestion::Range { poem_id, range } => {
                let pool: Vec<Poem> = poems
                    .iter()
                    .filter(|poem| range.contains(poem.id))
                    .cloned()
                    .collect();
                generate_quiz(rng, &pool, *poem_id, QuizMode::KamiToShimo, RANGE_OPTION_COUNT)
            }
            ReviewQuestion::All { poem_id } => {
                generate_quiz(rng, poems, *poem_id, QuizMode::KamiToShimo, RANGE_OPTION_COUNT)
            }
            ReviewQuestion::KamiTricky {
                poem_id,
                choice_poem_ids,
            } => generate_fixed_quiz(rng, poems, *poem_id, choice_poem_ids, QuizMode::ShimoToKami),
            ReviewQuestion::ShimoTricky {
                poem_id,
                choice_poem_ids,
            } => generate_fixed_quiz(rng, poems, *poem_id, choice_poem_ids, QuizMode::KamiToShimo),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReviewQuestion::Range { .. } => "range",
            ReviewQuestion::All { .. } => "all",
            ReviewQuestion::KamiTricky { .. } => "kami_tricky",
            ReviewQuestion::ShimoTricky { .. } => "shimo_tricky",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReviewItem {
    /// Assigned on insertion and never reused.
    pub id: String,
    #[serde(flatten)]
    pub question: ReviewQuestion,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read review list at {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse review list at {path}: {source}")]
    ParseError {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write review list at {path}: {source}")]
    WriteError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize review list: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("review storage rejected the write")]
    Rejected,
}

/// Single slot holding the serialized review list.
pub trait ReviewStore {
    /// Reads the stored list; a slot that was never written is an empty list.
    fn load(&self) -> Result<Vec<ReviewItem>, StoreError>;

    fn save(&mut self, items: &[ReviewItem]) -> Result<(), StoreError>;
}

/// Review list kept as a JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ReviewItem>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::ReadError {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        parse_items(&data).map_err(|source| StoreError::ParseError {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&mut self, items: &[ReviewItem]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(items)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::WriteError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        fs::write(&self.path, data).map_err(|source| StoreError::WriteError {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// In-process slot, mostly for tests and short-lived sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Option<String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from raw slot content, which need not be valid.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            reject_writes: false,
        }
    }

    /// Makes every save fail, as a full quota would.
    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl ReviewStore for MemoryStore {
    fn load(&self) -> Result<Vec<ReviewItem>, StoreError> {
        match &self.raw {
            None => Ok(Vec::new()),
            Some(raw) => parse_items(raw.as_bytes()).map_err(|source| StoreError::ParseError {
                path: "<memory>".to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, items: &[ReviewItem]) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::Rejected);
        }

        self.raw = Some(serde_json::to_string(items)?);
        Ok(())
    }
}

fn parse_items(data: &[u8]) -> Result<Vec<ReviewItem>, serde_json::Error> {
    // An empty slot reads like a missing one.
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(data)
}

/// Deduplicated list of missed questions on top of a [`ReviewStore`].
///
/// Storage problems never reach the caller: unreadable or corrupt content
/// lists as empty and failed writes are logged and dropped.
#[derive(Debug, Clone)]
pub struct ReviewQueue<S> {
    store: S,
}

impl<S: ReviewStore> ReviewQueue<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Queued items in insertion order.
    pub fn list(&self) -> Vec<ReviewItem> {
        self.store.load().unwrap_or_else(|error| {
            log::warn!("ignoring unreadable review list: {error}");
            Vec::new()
        })
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Queues `question` unless an equal question is already queued.
    ///
    /// Returns `true` when a new item was appended.
    pub fn add(&mut self, question: ReviewQuestion) -> bool {
        let mut items = self.list();

        if items.iter().any(|item| item.question == question) {
            log::debug!(
                "{} question for poem {} already queued",
                question.kind(),
                question.poem_id()
            );
            return false;
        }

        let id = uuid::Uuid::new_v4().to_string();
        log::debug!(
            "queueing {} question for poem {} as {id}",
            question.kind(),
            question.poem_id()
        );
        items.push(ReviewItem { id, question });
        self.persist(&items);

        true
    }

    /// Drops the item with `id`. Returns `false` when no such item exists.
    pub fn remove(&mut self, id: &str) -> bool {
        let mut items = self.list();
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            return false;
        }

        self.persist(&items);
        true
    }

    fn persist(&mut self, items: &[ReviewItem]) {
        if let Err(error) = self.store.save(items) {
            log::warn!("review list not saved: {error}");
        }
    }
}

/// Position while working through the review queue.
///
/// Skipping moves on and wraps around; removing keeps the position so the
/// item after the removed one comes up next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewCursor {
    index: usize,
}

impl ReviewCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Item under the cursor, or `None` once the queue is empty.
    pub fn current<S: ReviewStore>(&mut self, queue: &ReviewQueue<S>) -> Option<ReviewItem> {
        let mut items = queue.list();
        if items.is_empty() {
            return None;
        }

        self.index = self.index.min(items.len() - 1);
        Some(items.swap_remove(self.index))
    }

    /// Moves to the next item, back to the first after the last.
    pub fn skip<S: ReviewStore>(&mut self, queue: &ReviewQueue<S>) {
        let len = queue.len();
        self.index = if len == 0 { 0 } else { (self.index + 1) % len };
    }

    /// Drops the item with `id` and stays in place.
    pub fn remove<S: ReviewStore>(&mut self, queue: &mut ReviewQueue<S>, id: &str) -> bool {
        let removed = queue.remove(id);
        let len = queue.len();
        self.index = self.index.min(len.saturating_sub(1));
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::bootstrap_poems;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn range_question(poem_id: u32, token: &str) -> ReviewQuestion {
        ReviewQuestion::Range {
            poem_id,
            range: token.parse().expect("valid range token"),
        }
    }

    #[test]
    fn starts_empty() {
        let queue = ReviewQueue::new(MemoryStore::new());
        assert!(queue.list().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn reads_previously_stored_items() {
        let raw = r#"[{"id":"a","type":"range","poemId":1,"range":"1-4"}]"#;
        let queue = ReviewQueue::new(MemoryStore::with_raw(raw));

        assert_eq!(
            queue.list(),
            vec![ReviewItem {
                id: "a".to_string(),
                question: range_question(1, "1-4"),
            }]
        );
    }

    #[test]
    fn reads_every_variant() {
        let raw = r#"[
            {"id":"a","type":"range","poemId":1,"range":"1-4"},
            {"id":"b","type":"all","poemId":57},
            {"id":"c","type":"kami_tricky","poemId":22,"choicePoemIds":[22,20]},
            {"id":"d","type":"shimo_tricky","poemId":81,"choicePoemIds":[2,81,74]}
        ]"#;
        let items = ReviewQueue::new(MemoryStore::with_raw(raw)).list();

        assert_eq!(items.len(), 4);
        assert_eq!(items[1].question, ReviewQuestion::All { poem_id: 57 });
        assert_eq!(
            items[3].question,
            ReviewQuestion::ShimoTricky {
                poem_id: 81,
                choice_poem_ids: vec![2, 81, 74],
            }
        );
    }

    #[test]
    fn corrupt_content_lists_as_empty() {
        for raw in ["not json", "{\"id\":\"a\"}", "[{\"id\":\"a\",\"type\":\"bogus\"}]", "", "  "] {
            let queue = ReviewQueue::new(MemoryStore::with_raw(raw));
            assert!(queue.list().is_empty(), "{raw:?} should read as empty");
        }
    }

    #[test]
    fn one_bad_entry_hides_the_whole_list() {
        let raw = r#"[{"id":"a","type":"all","poemId":3},{"id":"b","type":"bogus","poemId":4}]"#;
        let mut queue = ReviewQueue::new(MemoryStore::with_raw(raw));
        assert!(queue.list().is_empty());

        assert!(queue.add(ReviewQuestion::All { poem_id: 5 }));
        let items = queue.list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, ReviewQuestion::All { poem_id: 5 });
    }

    #[test]
    fn adds_one_item_with_fresh_id() {
        let mut queue = ReviewQueue::new(MemoryStore::new());

        assert!(queue.add(range_question(1, "1-4")));

        let items = queue.list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, range_question(1, "1-4"));
        assert!(!items[0].id.is_empty());
    }

    #[test]
    fn same_question_is_added_once() {
        let mut queue = ReviewQueue::new(MemoryStore::new());

        assert!(queue.add(range_question(1, "1-4")));
        assert!(!queue.add(range_question(1, "1-4")));

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn distinct_keys_are_all_kept() {
        let mut queue = ReviewQueue::new(MemoryStore::new());

        queue.add(range_question(1, "1-4"));
        queue.add(ReviewQuestion::All { poem_id: 1 });
        queue.add(range_question(2, "1-4"));
        queue.add(range_question(1, "1-8"));

        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn tricky_key_includes_choices() {
        let mut queue = ReviewQueue::new(MemoryStore::new());

        queue.add(ReviewQuestion::KamiTricky {
            poem_id: 22,
            choice_poem_ids: vec![22, 20],
        });
        queue.add(ReviewQuestion::KamiTricky {
            poem_id: 22,
            choice_poem_ids: vec![22, 20],
        });
        queue.add(ReviewQuestion::ShimoTricky {
            poem_id: 22,
            choice_poem_ids: vec![22, 20],
        });

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let mut queue = ReviewQueue::new(MemoryStore::new());
        for poem_id in 1..=20 {
            queue.add(ReviewQuestion::All { poem_id });
        }

        let mut ids: Vec<String> = queue.list().into_iter().map(|item| item.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn remove_deletes_only_matching_id() {
        let mut queue = ReviewQueue::new(MemoryStore::new());
        queue.add(range_question(1, "1-4"));
        queue.add(range_question(2, "1-4"));

        let id = queue.list()[0].id.clone();
        assert!(queue.remove(&id));

        let items = queue.list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, range_question(2, "1-4"));
    }

    #[test]
    fn remove_unknown_id_changes_nothing() {
        let mut queue = ReviewQueue::new(MemoryStore::new());
        queue.add(range_question(1, "1-4"));
        let before = queue.store().raw().map(str::to_string);

        assert!(!queue.remove("no-such-id"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.store().raw().map(str::to_string), before);
    }

    #[test]
    fn removed_question_can_be_queued_again() {
        let mut queue = ReviewQueue::new(MemoryStore::new());
        queue.add(ReviewQuestion::All { poem_id: 9 });
        let first_id = queue.list()[0].id.clone();

        queue.remove(&first_id);
        assert!(queue.add(ReviewQuestion::All { poem_id: 9 }));
        assert_ne!(queue.list()[0].id, first_id);
    }

    #[test]
    fn failed_writes_are_swallowed() {
        let mut queue = ReviewQueue::new(MemoryStore::new().rejecting_writes());

        assert!(queue.add(range_question(1, "1-4")));
        assert!(queue.list().is_empty());
        assert!(!queue.remove("anything"));
    }

    #[test]
    fn serialized_shape_uses_camel_case_keys() {
        let item = ReviewItem {
            id: "x".to_string(),
            question: ReviewQuestion::KamiTricky {
                poem_id: 24,
                choice_poem_ids: vec![24, 25],
            },
        };

        let value = serde_json::to_value(&item).expect("item should serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "id": "x",
                "type": "kami_tricky",
                "poemId": 24,
                "choicePoemIds": [24, 25]
            })
        );
    }

    #[test]
    fn range_question_rebuilds_within_its_range() {
        let mut rng = StdRng::seed_from_u64(21);
        let question = range_question(2, "1-3");

        let item = question
            .rebuild(&mut rng, &bootstrap_poems())
            .expect("question rebuilds");

        assert_eq!(
            question.source_range(),
            "1-3".parse::<PoemRange>().expect("valid range token")
        );
        assert_eq!(item.mode, QuizMode::KamiToShimo);
        assert_eq!(item.poem_id, 2);
        let mut ids = item.option_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn full_test_question_rebuilds_from_every_poem() {
        let mut rng = StdRng::seed_from_u64(22);
        let question = ReviewQuestion::All { poem_id: 4 };

        let item = question
            .rebuild(&mut rng, &bootstrap_poems())
            .expect("question rebuilds");

        assert_eq!(question.source_range(), PoemRange::all());
        assert_eq!(item.options.len(), RANGE_OPTION_COUNT);
        assert_eq!(item.options[item.correct_index].poem_id, 4);
    }

    #[test]
    fn tricky_questions_rebuild_with_stored_choices() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut poems = bootstrap_poems();
        poems[0].id = 22;
        poems[1].id = 20;
        poems[2].id = 81;
        poems[3].id = 74;

        let kami = ReviewQuestion::KamiTricky {
            poem_id: 20,
            choice_poem_ids: vec![22, 20],
        }
        .rebuild(&mut rng, &poems)
        .expect("kami question rebuilds");
        assert_eq!(kami.mode, QuizMode::ShimoToKami);
        assert_eq!(kami.prompt, poems[1].shimo_hiragana);
        let mut ids = kami.option_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![20, 22]);

        let shimo = ReviewQuestion::ShimoTricky {
            poem_id: 81,
            choice_poem_ids: vec![20, 81, 74],
        }
        .rebuild(&mut rng, &poems)
        .expect("shimo question rebuilds");
        assert_eq!(shimo.mode, QuizMode::KamiToShimo);
        assert_eq!(shimo.options[shimo.correct_index].text, poems[2].shimo_hiragana);
        let mut ids = shimo.option_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![20, 74, 81]);
    }

    #[test]
    fn tricky_question_needs_every_choice_loaded() {
        let mut rng = StdRng::seed_from_u64(24);
        let question = ReviewQuestion::KamiTricky {
            poem_id: 1,
            choice_poem_ids: vec![1, 77],
        };

        assert_eq!(
            question.rebuild(&mut rng, &bootstrap_poems()),
            Err(QuizError::PoemNotFound { poem_id: 77 })
        );
    }

    #[test]
    fn cursor_skips_with_wraparound_and_stays_on_remove() {
        let mut queue = ReviewQueue::new(MemoryStore::new());
        for poem_id in 1..=3 {
            queue.add(ReviewQuestion::All { poem_id });
        }
        let mut cursor = ReviewCursor::new();

        let first = cursor.current(&queue).expect("queue has items");
        assert_eq!(first.question.poem_id(), 1);

        cursor.skip(&queue);
        cursor.skip(&queue);
        assert_eq!(cursor.current(&queue).map(|item| item.question.poem_id()), Some(3));
        cursor.skip(&queue);
        assert_eq!(cursor.index(), 0);

        cursor.skip(&queue);
        let second = cursor.current(&queue).expect("queue has items");
        assert!(cursor.remove(&mut queue, &second.id));
        assert_eq!(cursor.current(&queue).map(|item| item.question.poem_id()), Some(3));

        let last = cursor.current(&queue).expect("queue has items");
        assert!(cursor.remove(&mut queue, &last.id));
        assert_eq!(cursor.current(&queue).map(|item| item.question.poem_id()), Some(1));

        assert!(cursor.remove(&mut queue, &first.id));
        assert_eq!(cursor.current(&queue), None);
    }
}
