use rand::Rng;

use crate::clears::{ALL_RANGE_TOKEN, ClearStore, TestKind, UserId, mark_cleared};
use crate::poem::Poem;
use crate::quiz::{
    AnswerOutcome, Attempt, QuizError, QuizItem, QuizMode, RANGE_OPTION_COUNT, generate_fixed_quiz,
    generate_quiz,
};
use crate::range::PoemRange;
use crate::review::{ReviewQuestion, ReviewQueue, ReviewStore};
use crate::shuffle::shuffled;
use crate::tricky::{TrickyHalf, batch_questions};

/// What a test covers, which decides how questions are built and how misses are queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestScope {
    /// Block, 8-poem or summary test; distractors come from the same range.
    Range(PoemRange),
    /// All hundred poems.
    All,
    /// Every tricky set of one half, each poem asked against its own set.
    Tricky(TrickyHalf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Question {
    poem_id: u32,
    /// Fixed choices for tricky drills; `None` draws distractors from the whole pool.
    choices: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    /// Questions eventually answered correctly.
    pub score: usize,
    /// Questions answered correctly without a wrong pick.
    pub first_try: usize,
    pub total: usize,
}

impl TestResult {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.first_try == self.total
    }
}

/// One pass through a test, question by question.
#[derive(Debug, Clone)]
pub struct TestSession {
    scope: TestScope,
    poems: Vec<Poem>,
    questions: Vec<Question>,
    position: usize,
    current: Option<(QuizItem, Attempt)>,
    score: usize,
    first_try: usize,
}

impl TestSession {
    /// Asks every poem of `poems` once, in the given order. Tricky drills
    /// skip sets whose poems are not all loaded.
    pub fn new(scope: TestScope, poems: Vec<Poem>) -> Self {
        let questions = match scope {
            TestScope::Range(_) | TestScope::All => poems
                .iter()
                .map(|poem| Question {
                    poem_id: poem.id,
                    choices: None,
                })
                .collect(),
            TestScope::Tricky(half) => batch_questions(half)
                .into_iter()
                .filter(|(_, choices)| {
                    choices
                        .iter()
                        .all(|id| poems.iter().any(|poem| poem.id == *id))
                })
                .map(|(poem_id, choices)| Question {
                    poem_id,
                    choices: Some(choices.to_vec()),
                })
                .collect(),
        };

        Self {
            scope,
            poems,
            questions,
            position: 0,
            current: None,
            score: 0,
            first_try: 0,
        }
    }

    /// Randomises the question order before the first question is asked.
    pub fn shuffled<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        if self.current.is_none() && self.position == 0 {
            self.questions = shuffled(rng, &self.questions);
        }
        self
    }

    pub fn scope(&self) -> TestScope {
        self.scope
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// 0-based index of the question being asked.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.questions.len()
    }

    pub fn poem(&self, poem_id: u32) -> Option<&Poem> {
        self.poems.iter().find(|poem| poem.id == poem_id)
    }

    fn mode(&self) -> QuizMode {
        match self.scope {
            TestScope::Tricky(TrickyHalf::Kami) => QuizMode::ShimoToKami,
            _ => QuizMode::KamiToShimo,
        }
    }

    /// The question being asked, generating it on first access.
    ///
    /// Returns `Ok(None)` once every question has been asked.
    pub fn current<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<&QuizItem>, QuizError> {
        if self.is_finished() {
            return Ok(None);
        }

        if self.current.is_none() {
            let question = &self.questions[self.position];
            let item = match &question.choices {
                Some(choices) => {
                    generate_fixed_quiz(rng, &self.poems, question.poem_id, choices, self.mode())?
                }
                None => generate_quiz(
                    rng,
                    &self.poems,
                    question.poem_id,
                    self.mode(),
                    RANGE_OPTION_COUNT,
                )?,
            };
            let attempt = Attempt::new(item.poem_id);
            self.current = Some((item, attempt));
        }

        Ok(self.current.as_ref().map(|(item, _)| item))
    }

    /// Records a pick for the current question. Without a generated question
    /// the pick is ignored and reported as [`AnswerOutcome::Closed`].
    pub fn answer(&mut self, chosen: u32) -> AnswerOutcome {
        let Some((_, attempt)) = self.current.as_mut() else {
            return AnswerOutcome::Closed;
        };

        let outcome = attempt.answer(chosen);
        if let AnswerOutcome::Correct { first_try } = outcome {
            self.score += 1;
            if first_try {
                self.first_try += 1;
            }
        }

        outcome
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.current.as_ref().map(|(_, attempt)| attempt)
    }

    fn review_question(&self, item: &QuizItem) -> ReviewQuestion {
        let poem_id = item.poem_id;
        let choice_poem_ids = || {
            self.questions
                .get(self.position)
                .and_then(|question| question.choices.clone())
                .unwrap_or_else(|| item.option_ids())
        };

        match self.scope {
            TestScope::Range(range) => ReviewQuestion::Range { poem_id, range },
            TestScope::All => ReviewQuestion::All { poem_id },
            TestScope::Tricky(TrickyHalf::Kami) => ReviewQuestion::KamiTricky {
                poem_id,
                choice_poem_ids: choice_poem_ids(),
            },
            TestScope::Tricky(TrickyHalf::Shimo) => ReviewQuestion::ShimoTricky {
                poem_id,
                choice_poem_ids: choice_poem_ids(),
            },
        }
    }

    /// Whether leaving a question with `attempt` queues it for review.
    ///
    /// Range and hundred-poem tests queue only questions with a wrong pick;
    /// tricky drills queue anything not solved on the first try, skips included.
    fn needs_review(&self, attempt: &Attempt) -> bool {
        match self.scope {
            TestScope::Range(_) | TestScope::All => attempt.missed(),
            TestScope::Tricky(_) => !attempt.first_try(),
        }
    }

    /// Leaves the current question, queueing it for review when it was missed.
    pub fn advance<S: ReviewStore>(&mut self, queue: &mut ReviewQueue<S>) {
        if self.is_finished() {
            return;
        }

        if let Some((item, attempt)) = self.current.take() {
            if self.needs_review(&attempt) {
                queue.add(self.review_question(&item));
            }
        }

        self.position += 1;
    }

    pub fn result(&self) -> TestResult {
        TestResult {
            score: self.score,
            first_try: self.first_try,
            total: self.total(),
        }
    }

    /// Test type and range token recorded when this test is cleared.
    pub fn clear_key(&self) -> Option<(TestKind, String)> {
        match self.scope {
            TestScope::Range(range) => {
                TestKind::classify(range).map(|kind| (kind, range.to_string()))
            }
            TestScope::All => Some((TestKind::Hundred, ALL_RANGE_TOKEN.to_string())),
            TestScope::Tricky(_) => None,
        }
    }

    /// Closes the test and, if every question was right on the first try,
    /// records the clear for a signed-in learner.
    ///
    /// A failing clear store is logged; the result is returned either way.
    pub fn finish<C: ClearStore + ?Sized>(
        &self,
        clears: &mut C,
        user: Option<&UserId>,
    ) -> TestResult {
        let result = self.result();

        if result.is_perfect() {
            if let (Some((kind, range)), Some(user)) = (self.clear_key(), user) {
                if let Err(error) = mark_cleared(clears, Some(user), kind, &range) {
                    log::error!("clear status for {range} not saved: {error}");
                }
            }
        }

        result
    }
}
