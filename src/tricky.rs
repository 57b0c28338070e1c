//! Groups of poems whose halves are easily confused, drilled side by side.

/// Which half of the poems in a set is easy to mix up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrickyHalf {
    /// Similar first halves: the learner sees a second half and picks its first half.
    Kami,
    /// Similar second halves: the learner sees a first half and picks its second half.
    Shimo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickySet {
    pub id: &'static str,
    pub poem_ids: &'static [u32],
}

pub const KAMI_TRICKY_SETS: &[TrickySet] = &[
    TrickySet { id: "1", poem_ids: &[22, 20] },
    TrickySet { id: "2", poem_ids: &[24, 25] },
    TrickySet { id: "3", poem_ids: &[23, 21] },
    TrickySet { id: "4", poem_ids: &[27, 28] },
    TrickySet { id: "5", poem_ids: &[38, 31] },
    TrickySet { id: "6", poem_ids: &[32, 37] },
    TrickySet { id: "7", poem_ids: &[41, 33] },
    TrickySet { id: "8", poem_ids: &[42, 43] },
    TrickySet { id: "9", poem_ids: &[35, 44] },
    TrickySet { id: "10", poem_ids: &[45, 30] },
    TrickySet { id: "11", poem_ids: &[49, 50] },
    TrickySet { id: "12", poem_ids: &[54, 55] },
    TrickySet { id: "13", poem_ids: &[64, 67] },
    TrickySet { id: "14", poem_ids: &[70, 71] },
    TrickySet { id: "15", poem_ids: &[72, 73] },
    TrickySet { id: "16", poem_ids: &[74, 75] },
    TrickySet { id: "17", poem_ids: &[79, 80] },
    TrickySet { id: "18", poem_ids: &[77, 78] },
    TrickySet { id: "19", poem_ids: &[83, 84] },
    TrickySet { id: "20", poem_ids: &[85, 66] },
    TrickySet { id: "21", poem_ids: &[90, 91] },
    TrickySet { id: "22", poem_ids: &[94, 95] },
    TrickySet { id: "23", poem_ids: &[87, 96] },
    TrickySet { id: "24", poem_ids: &[97, 88] },
    TrickySet { id: "25", poem_ids: &[98, 99] },
];

pub const SHIMO_TRICKY_SETS: &[TrickySet] = &[
    TrickySet { id: "1", poem_ids: &[13, 14] },
    TrickySet { id: "2", poem_ids: &[84, 24] },
    TrickySet { id: "3", poem_ids: &[5, 50] },
    TrickySet { id: "4", poem_ids: &[97, 67] },
    TrickySet { id: "5", poem_ids: &[69, 80] },
    TrickySet { id: "6", poem_ids: &[2, 81, 74] },
    TrickySet { id: "7", poem_ids: &[18, 73] },
    TrickySet { id: "8", poem_ids: &[55, 14, 13] },
    TrickySet { id: "9", poem_ids: &[29, 32] },
    TrickySet { id: "10", poem_ids: &[62, 36] },
    TrickySet { id: "11", poem_ids: &[27, 86, 41] },
    TrickySet { id: "12", poem_ids: &[10, 92] },
    TrickySet { id: "13", poem_ids: &[23, 16] },
    TrickySet { id: "14", poem_ids: &[71, 39, 75] },
    TrickySet { id: "15", poem_ids: &[52, 72, 82] },
    TrickySet { id: "16", poem_ids: &[20, 33, 66] },
    TrickySet { id: "17", poem_ids: &[59, 38] },
    TrickySet { id: "18", poem_ids: &[60, 61] },
    TrickySet { id: "19", poem_ids: &[96, 45] },
    TrickySet { id: "20", poem_ids: &[48, 79] },
    TrickySet { id: "21", poem_ids: &[76, 83] },
    TrickySet { id: "22", poem_ids: &[35, 21, 70] },
    TrickySet { id: "23", poem_ids: &[28, 91] },
    TrickySet { id: "24", poem_ids: &[17, 31] },
];

impl TrickyHalf {
    pub fn sets(self) -> &'static [TrickySet] {
        match self {
            TrickyHalf::Kami => KAMI_TRICKY_SETS,
            TrickyHalf::Shimo => SHIMO_TRICKY_SETS,
        }
    }

    pub fn find(self, set_id: &str) -> Option<&'static TrickySet> {
        self.sets().iter().find(|set| set.id == set_id)
    }
}

/// One question per poem of every set, each offering its whole set as choices.
pub fn batch_questions(half: TrickyHalf) -> Vec<(u32, &'static [u32])> {
    half.sets()
        .iter()
        .flat_map(|set| set.poem_ids.iter().map(move |&id| (id, set.poem_ids)))
        .collect()
}
