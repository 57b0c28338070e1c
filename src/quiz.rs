use rand::Rng;

use crate::poem::Poem;
use crate::shuffle::shuffled;

/// Number of choices offered in block and full-corpus tests.
pub const RANGE_OPTION_COUNT: usize = 4;

/// Quiz type describing the relationship between prompt and answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    /// Prompts with the first half and expects the matching second half.
    KamiToShimo,
    /// Prompts with the second half and expects the matching first half.
    ShimoToKami,
}

impl QuizMode {
    fn prompt_text(self, poem: &Poem) -> &str {
        match self {
            QuizMode::KamiToShimo => &poem.kami_hiragana,
            QuizMode::ShimoToKami => &poem.shimo_hiragana,
        }
    }

    fn option_text(self, poem: &Poem) -> &str {
        match self {
            QuizMode::KamiToShimo => &poem.shimo_hiragana,
            QuizMode::ShimoToKami => &poem.kami_hiragana,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    pub poem_id: u32,
    pub text: String,
}

/// A single generated quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizItem {
    pub mode: QuizMode,
    /// Poem the learner has to recognise.
    pub poem_id: u32,
    /// Text shown as the question prompt.
    pub prompt: String,
    /// Answer options in display order.
    pub options: Vec<QuizOption>,
    /// Index in `options` that contains the correct answer.
    pub correct_index: usize,
}

impl QuizItem {
    pub fn option_ids(&self) -> Vec<u32> {
        self.options.iter().map(|option| option.poem_id).collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("option count must be at least 2")]
    OptionCountTooSmall,
    #[error("poem {poem_id} is not among the loaded poems")]
    PoemNotFound { poem_id: u32 },
    #[error("no other poems available to use as distractors for poem {poem_id}")]
    NoDistractors { poem_id: u32 },
}

/// Generates a question about `poem_id` with distractors drawn from `poems`.
///
/// At most `option_count - 1` distractors are picked at random; a smaller pool
/// simply yields fewer options. The options are shuffled with the supplied
/// random number generator, so a seeded RNG makes generation deterministic.
///
/// # Errors
/// * [`QuizError::OptionCountTooSmall`] if `option_count` is less than 2.
/// * [`QuizError::PoemNotFound`] if `poem_id` is not in `poems`.
/// * [`QuizError::NoDistractors`] if `poems` holds nothing but the target.
pub fn generate_quiz<R: Rng + ?Sized>(
    rng: &mut R,
    poems: &[Poem],
    poem_id: u32,
    mode: QuizMode,
    option_count: usize,
) -> Result<QuizItem, QuizError> {
    if option_count < 2 {
        return Err(QuizError::OptionCountTooSmall);
    }

    let target = poems
        .iter()
        .find(|poem| poem.id == poem_id)
        .ok_or(QuizError::PoemNotFound { poem_id })?;

    let others: Vec<&Poem> = poems.iter().filter(|poem| poem.id != poem_id).collect();
    if others.is_empty() {
        return Err(QuizError::NoDistractors { poem_id });
    }

    let mut selected = vec![target];
    selected.extend(shuffled(rng, &others).into_iter().take(option_count - 1));

    Ok(build_item(rng, target, &selected, mode))
}

/// Generates a question whose options are exactly the poems in `choice_ids`,
/// as used by the tricky-pair drills.
///
/// # Errors
/// * [`QuizError::PoemNotFound`] if the target or any choice is missing from `poems`.
/// * [`QuizError::OptionCountTooSmall`] if fewer than two distinct choices remain.
pub fn generate_fixed_quiz<R: Rng + ?Sized>(
    rng: &mut R,
    poems: &[Poem],
    poem_id: u32,
    choice_ids: &[u32],
    mode: QuizMode,
) -> Result<QuizItem, QuizError> {
    let find = |id: u32| {
        poems
            .iter()
            .find(|poem| poem.id == id)
            .ok_or(QuizError::PoemNotFound { poem_id: id })
    };

    let target = find(poem_id)?;

    let mut selected = vec![target];
    for &id in choice_ids {
        if selected.iter().all(|poem| poem.id != id) {
            selected.push(find(id)?);
        }
    }

    if selected.len() < 2 {
        return Err(QuizError::OptionCountTooSmall);
    }

    Ok(build_item(rng, target, &selected, mode))
}

fn build_item<R: Rng + ?Sized>(
    rng: &mut R,
    target: &Poem,
    selected: &[&Poem],
    mode: QuizMode,
) -> QuizItem {
    let options: Vec<QuizOption> = shuffled(rng, selected)
        .into_iter()
        .map(|poem| QuizOption {
            poem_id: poem.id,
            text: mode.option_text(poem).to_string(),
        })
        .collect();

    // The target is always part of `selected`, so the search cannot miss.
    let correct_index = options
        .iter()
        .position(|option| option.poem_id == target.id)
        .unwrap_or_default();

    QuizItem {
        mode,
        poem_id: target.id,
        prompt: mode.prompt_text(target).to_string(),
        options,
        correct_index,
    }
}

/// Result of picking one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The correct option; `first_try` is false if a wrong option was picked before.
    Correct { first_try: bool },
    /// A wrong option picked for the first time.
    Wrong,
    /// A wrong option that had already been picked.
    Repeated,
    /// The question was already answered correctly; nothing changes.
    Closed,
}

/// Learner's progress on one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    poem_id: u32,
    wrong: Vec<u32>,
    solved: bool,
}

impl Attempt {
    pub fn new(poem_id: u32) -> Self {
        Self {
            poem_id,
            wrong: Vec::new(),
            solved: false,
        }
    }

    pub fn answer(&mut self, chosen: u32) -> AnswerOutcome {
        if self.solved {
            return AnswerOutcome::Closed;
        }

        if chosen == self.poem_id {
            self.solved = true;
            return AnswerOutcome::Correct {
                first_try: self.wrong.is_empty(),
            };
        }

        if self.wrong.contains(&chosen) {
            return AnswerOutcome::Repeated;
        }

        self.wrong.push(chosen);
        AnswerOutcome::Wrong
    }

    pub fn poem_id(&self) -> u32 {
        self.poem_id
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Solved without any wrong pick.
    pub fn first_try(&self) -> bool {
        self.solved && self.wrong.is_empty()
    }

    /// At least one wrong pick; the question belongs in the review queue.
    pub fn missed(&self) -> bool {
        !self.wrong.is_empty()
    }

    pub fn wrong_choices(&self) -> &[u32] {
        &self.wrong
    }
}
