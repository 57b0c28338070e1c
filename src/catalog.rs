use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bootstrap::{bootstrap_poems, bootstrap_range};
use crate::poem::Poem;
use crate::range::PoemRange;

/// Shown to the learner when poems cannot be loaded.
pub const FETCH_FAILED_MESSAGE: &str = "句の取得に失敗しました";

/// Ordered collection of poems keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    poems: BTreeMap<u32, Poem>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read dataset file at {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse dataset file at {path}: {source}")]
    ParseError {
        path: String,
        source: serde_json::Error,
    },
    #[error("poem {id} appears more than once")]
    DuplicatePoem { id: u32 },
    #[error("poem id {id} is outside 1-100")]
    IdOutOfRange { id: u32 },
}

impl PartialEq for CatalogLoadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ReadError { path: left, .. }, Self::ReadError { path: right, .. }) => {
                left == right
            }
            (Self::ParseError { path: left, .. }, Self::ParseError { path: right, .. }) => {
                left == right
            }
            (Self::DuplicatePoem { id: left }, Self::DuplicatePoem { id: right }) => left == right,
            (Self::IdOutOfRange { id: left }, Self::IdOutOfRange { id: right }) => left == right,
            _ => false,
        }
    }
}

impl Eq for CatalogLoadError {}

impl Catalog {
    pub fn new(poems: Vec<Poem>) -> Result<Self, CatalogLoadError> {
        let mut catalog = Self::default();
        catalog.extend(poems)?;
        Ok(catalog)
    }

    /// Loads a JSON array of poems.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        Self::new(read_poem_file(path.as_ref())?)
    }

    /// Loads every `.json` file below `root`, each holding an array of poems.
    pub fn from_directory(root: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let mut files = Vec::new();
        collect_files(root.as_ref(), &mut files)?;
        files.sort();

        let mut catalog = Self::default();
        for file in files {
            catalog.extend(read_poem_file(&file)?)?;
        }

        Ok(catalog)
    }

    fn extend(&mut self, poems: Vec<Poem>) -> Result<(), CatalogLoadError> {
        let corpus = PoemRange::all();

        for poem in poems {
            if !corpus.contains(poem.id) {
                return Err(CatalogLoadError::IdOutOfRange { id: poem.id });
            }
            if self.poems.contains_key(&poem.id) {
                return Err(CatalogLoadError::DuplicatePoem { id: poem.id });
            }
            self.poems.insert(poem.id, poem);
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.poems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poems.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Poem> {
        self.poems.get(&id)
    }

    /// Poems whose id falls in `range`, in id order. Gaps are skipped.
    pub fn in_range(&self, range: PoemRange) -> Vec<Poem> {
        self.poems
            .range(range.from()..=range.to())
            .map(|(_, poem)| poem.clone())
            .collect()
    }
}

fn read_poem_file(path: &Path) -> Result<Vec<Poem>, CatalogLoadError> {
    let data = fs::read(path).map_err(|source| CatalogLoadError::ReadError {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| CatalogLoadError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

fn collect_files(root: &Path, files: &mut Vec<PathBuf>) -> Result<(), CatalogLoadError> {
    let walker = fs::read_dir(root).map_err(|source| CatalogLoadError::ReadError {
        path: root.display().to_string(),
        source,
    })?;

    for entry in walker {
        let entry = entry.map_err(|source| CatalogLoadError::ReadError {
            path: root.display().to_string(),
            source,
        })?;

        let path = entry.path();

        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.extension().and_then(|extension| extension.to_str()) == Some("json") {
            files.push(path);
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoemSourceError {
    #[error("poem store unavailable for {range}: {source}")]
    Unavailable {
        range: PoemRange,
        source: CatalogLoadError,
    },
}

impl PoemSourceError {
    /// Fixed text for the learner, whatever went wrong underneath.
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }
}

/// Where quiz screens get their poems from.
pub trait PoemSource {
    /// Poems with ids in `range`, ordered by id.
    fn poems_in(&self, range: PoemRange) -> Result<Vec<Poem>, PoemSourceError>;
}

impl PoemSource for Catalog {
    fn poems_in(&self, range: PoemRange) -> Result<Vec<Poem>, PoemSourceError> {
        Ok(self.in_range(range))
    }
}

/// Reads the dataset file on every query, so edits and outages show up immediately.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PoemSource for JsonFileSource {
    fn poems_in(&self, range: PoemRange) -> Result<Vec<Poem>, PoemSourceError> {
        let catalog = Catalog::from_file(&self.path)
            .map_err(|source| PoemSourceError::Unavailable { range, source })?;
        Ok(catalog.in_range(range))
    }
}

/// Serves the static first block when the wrapped source fails for exactly `1-4`,
/// so the entry flow always has something to show.
#[derive(Debug, Clone)]
pub struct WithBootstrapFallback<S> {
    inner: S,
}

impl<S: PoemSource> WithBootstrapFallback<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: PoemSource> PoemSource for WithBootstrapFallback<S> {
    fn poems_in(&self, range: PoemRange) -> Result<Vec<Poem>, PoemSourceError> {
        match self.inner.poems_in(range) {
            Ok(poems) => Ok(poems),
            Err(error) if range == bootstrap_range() => {
                log::warn!("serving bundled poems for {range}: {error}");
                Ok(bootstrap_poems())
            }
            Err(error) => {
                log::error!("{error}");
                Err(error)
            }
        }
    }
}
