//! Which tests a signed-in learner has passed with every answer right on the first try.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::range::{BLOCK_SIZE, PoemRange};

/// Identity supplied by the sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum TestKind {
    #[serde(rename = "4首")]
    Four,
    #[serde(rename = "8首")]
    Eight,
    #[serde(rename = "まとめ")]
    Summary,
    #[serde(rename = "100首")]
    Hundred,
}

impl TestKind {
    /// Kind of a test over `range`, or `None` for ranges no test screen offers.
    ///
    /// A range starting at 1 and reaching past the first block is a summary test,
    /// even when it also spans exactly eight poems.
    pub fn classify(range: PoemRange) -> Option<Self> {
        if range.from() == 1 && range.to() > BLOCK_SIZE {
            Some(TestKind::Summary)
        } else if range.len() == 2 * BLOCK_SIZE {
            Some(TestKind::Eight)
        } else if range.len() == BLOCK_SIZE {
            Some(TestKind::Four)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestKind::Four => "4首",
            TestKind::Eight => "8首",
            TestKind::Summary => "まとめ",
            TestKind::Hundred => "100首",
        }
    }
}

/// Token stored for the full-corpus test instead of a numeric range.
pub const ALL_RANGE_TOKEN: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClearRecord {
    pub test_type: TestKind,
    pub range: String,
    pub cleared_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClearError {
    #[error("sign-in required to save clear status")]
    Unauthorized,
    #[error("clear store unavailable: {0}")]
    Unavailable(String),
}

/// Backing store keyed by `(user, test type, range token)`.
pub trait ClearStore {
    /// Inserts the key or refreshes its `cleared_at`.
    fn upsert(
        &mut self,
        user: &UserId,
        test_type: TestKind,
        range: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ClearError>;

    /// Records of `user`, ordered by range token then test type.
    fn list_for(&self, user: &UserId) -> Result<Vec<ClearRecord>, ClearError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryClearStore {
    records: BTreeMap<(UserId, String, TestKind), DateTime<Utc>>,
}

impl MemoryClearStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClearStore for MemoryClearStore {
    fn upsert(
        &mut self,
        user: &UserId,
        test_type: TestKind,
        range: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ClearError> {
        self.records
            .insert((user.clone(), range.to_string(), test_type), at);
        Ok(())
    }

    fn list_for(&self, user: &UserId) -> Result<Vec<ClearRecord>, ClearError> {
        Ok(self
            .records
            .iter()
            .filter(|((owner, _, _), _)| owner == user)
            .map(|((_, range, test_type), cleared_at)| ClearRecord {
                test_type: *test_type,
                range: range.clone(),
                cleared_at: *cleared_at,
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct StoredClear {
    user_id: UserId,
    #[serde(flatten)]
    record: ClearRecord,
}

/// Clear records of every user kept as a JSON array in one file.
///
/// A missing file holds no records. Unreadable or malformed content is
/// reported as [`ClearError::Unavailable`] rather than overwritten.
#[derive(Debug, Clone)]
pub struct JsonFileClearStore {
    path: PathBuf,
}

impl JsonFileClearStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, error: impl fmt::Display) -> ClearError {
        ClearError::Unavailable(format!("{}: {error}", self.path.display()))
    }

    fn read(&self) -> Result<Vec<StoredClear>, ClearError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.unavailable(error)),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&data).map_err(|error| self.unavailable(error))
    }

    fn write(&self, records: &[StoredClear]) -> Result<(), ClearError> {
        let data = serde_json::to_vec_pretty(records).map_err(|error| self.unavailable(error))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.unavailable(error))?;
        }

        fs::write(&self.path, data).map_err(|error| self.unavailable(error))
    }
}

impl ClearStore for JsonFileClearStore {
    fn upsert(
        &mut self,
        user: &UserId,
        test_type: TestKind,
        range: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ClearError> {
        let mut records = self.read()?;

        match records.iter_mut().find(|stored| {
            stored.user_id == *user
                && stored.record.test_type == test_type
                && stored.record.range == range
        }) {
            Some(stored) => stored.record.cleared_at = at,
            None => records.push(StoredClear {
                user_id: user.clone(),
                record: ClearRecord {
                    test_type,
                    range: range.to_string(),
                    cleared_at: at,
                },
            }),
        }

        self.write(&records)
    }

    fn list_for(&self, user: &UserId) -> Result<Vec<ClearRecord>, ClearError> {
        let mut records: Vec<ClearRecord> = self
            .read()?
            .into_iter()
            .filter(|stored| stored.user_id == *user)
            .map(|stored| stored.record)
            .collect();

        records.sort_by(|left, right| {
            (&left.range, left.test_type).cmp(&(&right.range, right.test_type))
        });
        Ok(records)
    }
}

/// Whether `records` hold a clear of `test_type` over `range`.
pub fn is_cleared(records: &[ClearRecord], test_type: TestKind, range: &str) -> bool {
    records
        .iter()
        .any(|record| record.test_type == test_type && record.range == range)
}

/// Clear records of the current user; anonymous callers simply have none.
pub fn list_clears<S: ClearStore + ?Sized>(
    store: &S,
    user: Option<&UserId>,
) -> Result<Vec<ClearRecord>, ClearError> {
    match user {
        Some(user) => store.list_for(user),
        None => Ok(Vec::new()),
    }
}

/// Marks a test as cleared for the current user.
///
/// # Errors
/// * [`ClearError::Unauthorized`] without a signed-in user.
/// * Whatever the store reports.
pub fn mark_cleared<S: ClearStore + ?Sized>(
    store: &mut S,
    user: Option<&UserId>,
    test_type: TestKind,
    range: &str,
) -> Result<(), ClearError> {
    let user = user.ok_or(ClearError::Unauthorized)?;
    log::debug!("{user} cleared {} {range}", test_type.label());
    store.upsert(user, test_type, range, Utc::now())
}
