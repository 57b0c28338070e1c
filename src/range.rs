use std::fmt;
use std::str::FromStr;

pub const FIRST_POEM_ID: u32 = 1;
pub const LAST_POEM_ID: u32 = 100;

/// Number of poems in one study block.
pub const BLOCK_SIZE: u32 = 4;

/// Inclusive interval of poem ids, always within `1..=100` with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoemRange {
    from: u32,
    to: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range token must look like `<from>-<to>`, got {token:?}")]
    Malformed { token: String },
    #[error("range {from}-{to} is outside 1-100 or reversed")]
    OutOfBounds { from: u32, to: u32 },
}

impl PoemRange {
    pub fn new(from: u32, to: u32) -> Result<Self, RangeError> {
        if from < FIRST_POEM_ID || to > LAST_POEM_ID || from > to {
            return Err(RangeError::OutOfBounds { from, to });
        }

        Ok(Self { from, to })
    }

    /// The first study block, `1-4`.
    pub const fn first_block() -> Self {
        Self {
            from: FIRST_POEM_ID,
            to: BLOCK_SIZE,
        }
    }

    /// Every poem in the corpus.
    pub fn all() -> Self {
        Self {
            from: FIRST_POEM_ID,
            to: LAST_POEM_ID,
        }
    }

    /// The four-poem block with the given 1-based index, clamped at the last poem.
    pub fn block(index: u32) -> Option<Self> {
        if index == 0 {
            return None;
        }
        let from = (index - 1).checked_mul(BLOCK_SIZE)? + 1;
        Self::new(from, from.saturating_add(BLOCK_SIZE - 1).min(LAST_POEM_ID)).ok()
    }

    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn to(&self) -> u32 {
        self.to
    }

    pub fn len(&self) -> u32 {
        self.to - self.from + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, poem_id: u32) -> bool {
        (self.from..=self.to).contains(&poem_id)
    }

    /// 1-based index of the block that `from` falls into.
    pub fn block_index(&self) -> u32 {
        self.from.div_ceil(BLOCK_SIZE)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> {
        self.from..=self.to
    }
}

/// Decodes a range token such as `"9-16"`.
///
/// Returns `None` for a missing token, any shape other than `<digits>-<digits>`,
/// or bounds violating `1 <= from <= to <= 100`.
pub fn parse_range(token: Option<&str>) -> Option<PoemRange> {
    token?.parse().ok()
}

impl FromStr for PoemRange {
    type Err = RangeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || RangeError::Malformed {
            token: token.to_string(),
        };

        let (from, to) = token.split_once('-').ok_or_else(malformed)?;
        let from = parse_digits(from).ok_or_else(malformed)?;
        let to = parse_digits(to).ok_or_else(malformed)?;

        Self::new(from, to)
    }
}

// `u32::from_str` accepts a leading `+`, which a range token must not.
fn parse_digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    // Overflowing digit runs are far beyond the corpus; map them past the upper bound.
    Some(value.parse().unwrap_or(u32::MAX))
}

impl fmt::Display for PoemRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl serde::Serialize for PoemRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PoemRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
