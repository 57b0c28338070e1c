//! Which follow-up tests are offered after each block, kept as data.
//!
//! The defaults reproduce the current cadence: an 8-poem retest on every
//! second block and a summary test from the fourth block on. The result
//! screen and the block menu disagree about the last block, so whether it
//! gets an 8-poem test (over poems 93-100) is a separate switch.

use crate::range::{BLOCK_SIZE, LAST_POEM_ID, PoemRange};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FollowUpSchedule {
    /// Blocks whose index is a multiple of this offer an 8-poem test.
    pub eight_test_every: u32,
    /// First block index that may offer an 8-poem test.
    pub eight_test_from_block: u32,
    /// Blocks whose index is a multiple of this offer a summary test.
    pub summary_every: u32,
    /// First block index that may offer a summary test.
    pub summary_from_block: u32,
    /// The block menu also offers an 8-poem test on the last block.
    pub final_block_eight_test: bool,
}

impl Default for FollowUpSchedule {
    fn default() -> Self {
        Self {
            eight_test_every: 2,
            eight_test_from_block: 2,
            summary_every: 2,
            summary_from_block: 4,
            final_block_eight_test: true,
        }
    }
}

/// Action offered on a test result screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Study the same range again.
    Restudy(PoemRange),
    /// Test this block together with the previous one.
    EightTest(PoemRange),
    /// Test everything learned so far.
    SummaryTest(PoemRange),
    /// Start studying the next block.
    NextBlock(PoemRange),
    BackToList,
}

/// Links shown for one block in the learning list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMenu {
    pub block: PoemRange,
    pub eight_test: Option<PoemRange>,
    pub summary_test: Option<PoemRange>,
}

fn last_block_index() -> u32 {
    LAST_POEM_ID.div_ceil(BLOCK_SIZE)
}

fn cadence(index: u32, every: u32, from: u32) -> bool {
    every > 0 && index >= from && index % every == 0
}

impl FollowUpSchedule {
    fn has_eight_test(&self, block_index: u32) -> bool {
        cadence(block_index, self.eight_test_every, self.eight_test_from_block)
    }

    fn has_summary_test(&self, block_index: u32) -> bool {
        cadence(block_index, self.summary_every, self.summary_from_block)
    }

    /// Eight poems ending with the given block.
    fn eight_range(block_index: u32) -> Option<PoemRange> {
        let to = (block_index * BLOCK_SIZE).min(LAST_POEM_ID);
        PoemRange::new(to.checked_sub(2 * BLOCK_SIZE - 1)?, to).ok()
    }

    /// Learning-list entry for the 1-based block `index`.
    pub fn block_menu(&self, index: u32) -> Option<BlockMenu> {
        let block = PoemRange::block(index)?;

        let final_eight = self.final_block_eight_test && index == last_block_index();
        let eight_test = if self.has_eight_test(index) || final_eight {
            Self::eight_range(index)
        } else {
            None
        };

        let summary_test = if self.has_summary_test(index) {
            PoemRange::new(1, block.to()).ok()
        } else {
            None
        };

        Some(BlockMenu {
            block,
            eight_test,
            summary_test,
        })
    }

    /// Every block of the learning list in order.
    pub fn learning_list(&self) -> Vec<BlockMenu> {
        (1..=last_block_index())
            .filter_map(|index| self.block_menu(index))
            .collect()
    }

    /// Actions offered after finishing a test over `range`.
    pub fn follow_ups(&self, range: PoemRange) -> Vec<FollowUp> {
        let is_summary = range.from() == 1 && range.to() > BLOCK_SIZE;
        let is_four = range.len() == BLOCK_SIZE;
        let is_eight = range.len() == 2 * BLOCK_SIZE;

        let block_index = range.block_index();
        let has_eight = self.has_eight_test(block_index);
        let has_summary = self.has_summary_test(block_index);

        let mut actions = Vec::new();

        if !is_summary {
            actions.push(FollowUp::Restudy(range));
        }

        if is_four && has_eight {
            if let Some(eight) = Self::eight_range(block_index) {
                actions.push(FollowUp::EightTest(eight));
            }
        }

        if is_eight && range.to() >= 4 * BLOCK_SIZE {
            if let Ok(summary) = PoemRange::new(1, range.to()) {
                actions.push(FollowUp::SummaryTest(summary));
            }
        }

        let is_final = is_summary || is_eight || (is_four && !has_eight && !has_summary);
        if is_final && range.to() < LAST_POEM_ID {
            let from = range.to() + 1;
            if let Ok(next) = PoemRange::new(from, (from + BLOCK_SIZE - 1).min(LAST_POEM_ID)) {
                actions.push(FollowUp::NextBlock(next));
            }
        }

        actions.push(FollowUp::BackToList);
        actions
    }
}
