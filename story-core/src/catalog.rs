//! Story catalog.
//!
//! Stories are authored as rows of a CSV file with the columns `id`,
//! `titulo`, `sinopsis` and one `cap_N` column per chapter summary. The
//! catalog is loaded once at startup and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

const ID_COLUMN: &str = "id";
const TITLE_COLUMN: &str = "titulo";
const SYNOPSIS_COLUMN: &str = "sinopsis";
const CHAPTER_PREFIX: &str = "cap_";

/// Errors raised while loading a catalog. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read story catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed story catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("story catalog is missing the `{0}` column")]
    MissingColumn(&'static str),

    #[error("line {line}: `{value}` is not a valid story id")]
    InvalidId { line: u64, value: String },

    #[error("story id {0} appears more than once")]
    DuplicateId(StoryId),

    #[error("story {0} has no chapters")]
    NoChapters(StoryId),

    #[error("story {story} skips chapter {missing}")]
    ChapterGap { story: StoryId, missing: u32 },

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("chapter column `cap_{0}` appears more than once")]
    DuplicateChapterColumn(u32),

    #[error("story catalog has no `cap_{0}` column")]
    MissingChapterColumn(u32),

    #[error("story catalog contains no stories")]
    Empty,
}

/// Identifier of a story in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u32);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(StoryId)
    }
}

impl From<u32> for StoryId {
    fn from(id: u32) -> Self {
        StoryId(id)
    }
}

/// The authored skeleton of one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRecord {
    id: StoryId,
    title: String,
    synopsis: String,
    /// Chapter summaries; index 0 holds chapter 1.
    chapters: Vec<String>,
}

impl StoryRecord {
    pub fn new(
        id: StoryId,
        title: impl Into<String>,
        synopsis: impl Into<String>,
        chapters: Vec<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            synopsis: synopsis.into(),
            chapters,
        }
    }

    pub fn id(&self) -> StoryId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn synopsis(&self) -> &str {
        &self.synopsis
    }

    /// Summary of chapter `number` (1-based), or `None` past the authored
    /// content.
    pub fn chapter(&self, number: u32) -> Option<&str> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.chapters.get(index).map(String::as_str)
    }

    /// Number of authored chapters.
    pub fn chapter_count(&self) -> u32 {
        self.chapters.len() as u32
    }

    /// Chapters as `(number, summary)` pairs in order.
    pub fn chapters(&self) -> impl Iterator<Item = (u32, &str)> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text.as_str()))
    }
}

/// The fields of a story shown when listing the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySummary {
    pub id: StoryId,
    pub title: String,
    pub synopsis: String,
}

/// In-memory table of stories, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stories: Vec<StoryRecord>,
    index: HashMap<StoryId, usize>,
}

impl Catalog {
    /// Load the catalog from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            stories = catalog.len(),
            "loaded story catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog from any CSV source.
    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let layout = ColumnLayout::from_headers(csv.headers()?)?;

        let mut stories = Vec::new();
        for row in csv.records() {
            stories.push(layout.parse_row(&row?)?);
        }

        Self::from_records(stories)
    }

    /// Build a catalog from already-parsed records.
    pub fn from_records(stories: Vec<StoryRecord>) -> Result<Self, CatalogError> {
        if stories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(stories.len());
        for (position, story) in stories.iter().enumerate() {
            if story.chapters.is_empty() {
                return Err(CatalogError::NoChapters(story.id));
            }
            if index.insert(story.id, position).is_some() {
                return Err(CatalogError::DuplicateId(story.id));
            }
        }

        Ok(Self { stories, index })
    }

    /// Find a story by id. Not finding one is not an error here; callers
    /// decide what that means.
    pub fn lookup(&self, id: StoryId) -> Option<&StoryRecord> {
        self.index.get(&id).map(|&i| &self.stories[i])
    }

    /// `(id, title, synopsis)` for every story, in file order.
    pub fn list_summaries(&self) -> Vec<StorySummary> {
        self.stories
            .iter()
            .map(|s| StorySummary {
                id: s.id,
                title: s.title.clone(),
                synopsis: s.synopsis.clone(),
            })
            .collect()
    }

    /// Story ids in file order.
    pub fn ids(&self) -> Vec<StoryId> {
        self.stories.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

/// Where each field lives in a CSV row.
struct ColumnLayout {
    id: usize,
    title: usize,
    synopsis: usize,
    /// Column index of chapter N at position N-1.
    chapters: Vec<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(CatalogError::MissingColumn(name))
        };

        let mut numbered = BTreeMap::new();
        for (col, header) in headers.iter().enumerate() {
            let Some(number) = chapter_number(header) else {
                continue;
            };
            if numbered.insert(number, col).is_some() {
                return Err(CatalogError::DuplicateChapterColumn(number));
            }
        }

        let mut chapters = Vec::with_capacity(numbered.len());
        for (expected, (number, col)) in (1..).zip(numbered) {
            if number != expected {
                return Err(CatalogError::MissingChapterColumn(expected));
            }
            chapters.push(col);
        }

        debug!(chapter_columns = chapters.len(), "parsed catalog header");

        Ok(Self {
            id: find(ID_COLUMN)?,
            title: find(TITLE_COLUMN)?,
            synopsis: find(SYNOPSIS_COLUMN)?,
            chapters,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> Result<StoryRecord, CatalogError> {
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let required = self.id.max(self.title).max(self.synopsis) + 1;
        if row.len() < required {
            return Err(CatalogError::ShortRow {
                line,
                expected: required,
                found: row.len(),
            });
        }

        // Fields past the end of a short row are absent chapters.
        let field = |col: usize| row.get(col).unwrap_or_default();

        let raw_id = field(self.id);
        let id: StoryId = raw_id.parse().map_err(|_| CatalogError::InvalidId {
            line,
            value: raw_id.to_string(),
        })?;

        let cells: Vec<Option<&str>> = self
            .chapters
            .iter()
            .map(|&col| Some(field(col)).filter(|text| !text.is_empty()))
            .collect();

        // Trailing empty cells only mean the story is shorter than the file.
        let authored = cells.iter().rposition(Option::is_some).map_or(0, |i| i + 1);

        let mut chapters = Vec::with_capacity(authored);
        for (i, cell) in cells[..authored].iter().enumerate() {
            match cell {
                Some(text) => chapters.push(text.to_string()),
                None => {
                    return Err(CatalogError::ChapterGap {
                        story: id,
                        missing: i as u32 + 1,
                    })
                }
            }
        }

        Ok(StoryRecord {
            id,
            title: field(self.title).to_string(),
            synopsis: field(self.synopsis).to_string(),
            chapters,
        })
    }
}

/// `N` for a `cap_N` header, in any case. Other headers are ignored.
fn chapter_number(header: &str) -> Option<u32> {
    let prefix = header.get(..CHAPTER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(CHAPTER_PREFIX) {
        return None;
    }
    let number = header[CHAPTER_PREFIX.len()..].parse::<u32>().ok()?;
    (number > 0).then_some(number)
}
