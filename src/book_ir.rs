//! Output IR: typed book pages, the table of contents, and the page map
//! used to keep a reader's position stable across repagination.

use serde::{Deserialize, Serialize};

use crate::story::PhotoRef;

/// One laid-out book page.
///
/// A closed sum type so the rendering layer must match every page kind
/// exhaustively; extending the book with a new page kind is a compile error
/// at every render site until handled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookPage {
    /// Table-of-contents page (the TOC may span several pages).
    TableOfContents(TocPage),
    /// Section divider inserted before the first story of a decade.
    DecadeMarker(DecadeMarkerPage),
    /// First page of a story: header blocks plus the first text chunk.
    StoryStart(StoryStartPage),
    /// Later text chunk of a story that overflowed its start page.
    StoryContinuation(StoryContinuationPage),
}

impl BookPage {
    /// 1-based page number.
    pub fn page_number(&self) -> usize {
        match self {
            Self::TableOfContents(page) => page.page_number,
            Self::DecadeMarker(page) => page.page_number,
            Self::StoryStart(page) => page.page_number,
            Self::StoryContinuation(page) => page.page_number,
        }
    }

    /// Source story id, for story pages.
    pub fn story_id(&self) -> Option<&str> {
        match self {
            Self::StoryStart(page) => Some(&page.story_id),
            Self::StoryContinuation(page) => Some(&page.story_id),
            Self::TableOfContents(_) | Self::DecadeMarker(_) => None,
        }
    }

    /// Text lines carried by this page. Empty for marker and TOC pages.
    pub fn lines(&self) -> &[String] {
        match self {
            Self::StoryStart(page) => &page.lines,
            Self::StoryContinuation(page) => &page.lines,
            Self::TableOfContents(_) | Self::DecadeMarker(_) => &[],
        }
    }
}

/// Table-of-contents page payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TocPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Entries shown on this TOC page, in book order.
    pub entries: Vec<TocEntry>,
}

/// Decade divider page payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecadeMarkerPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Decade display label.
    pub label: String,
    /// First year of the decade.
    pub start_year: i32,
    /// Number of stories in the decade.
    pub story_count: usize,
}

/// Story start page payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryStartPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Source story id.
    pub story_id: String,
    /// Story title (title block).
    pub title: String,
    /// Story year (date block).
    pub year: i32,
    /// Hero photo, when the story has photos.
    pub photo: Option<PhotoRef>,
    /// Whether the audio-player block is reserved.
    pub has_audio: bool,
    /// First chunk of wrapped body lines.
    pub lines: Vec<String>,
}

/// Story continuation page payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryContinuationPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Source story id.
    pub story_id: String,
    /// Which continuation chunk this is, starting at 1.
    pub ordinal: usize,
    /// Wrapped body lines for this chunk.
    pub lines: Vec<String>,
}

/// Navigation target of a TOC entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum TocTarget {
    /// Entry points at a decade-marker page.
    Decade,
    /// Entry points at a story's start page.
    Story {
        /// Target story id.
        story_id: String,
    },
}

/// One table-of-contents entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Display title (story title or decade label).
    pub title: String,
    /// 1-based page number where the target begins.
    pub page_number: usize,
    /// What the entry points at.
    #[serde(flatten)]
    pub target: TocTarget,
}

/// Stable layout profile id.
///
/// Deterministic digest of a `PaginationConfig`; identical ids imply
/// identical pagination for any story collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutProfileId(pub [u8; 32]);

impl LayoutProfileId {
    /// Build a deterministic profile id from arbitrary payload bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        fn fnv64(seed: u64, payload: &[u8]) -> u64 {
            let mut hash = seed;
            for b in payload {
                hash ^= *b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            hash
        }
        let mut out = [0u8; 32];
        let h0 = fnv64(0xcbf29ce484222325, bytes).to_le_bytes();
        let h1 = fnv64(0x9e3779b97f4a7c15, bytes).to_le_bytes();
        let h2 = fnv64(0xd6e8feb86659fd93, bytes).to_le_bytes();
        let h3 = fnv64(0xa0761d6478bd642f, bytes).to_le_bytes();
        out[0..8].copy_from_slice(&h0);
        out[8..16].copy_from_slice(&h1);
        out[16..24].copy_from_slice(&h2);
        out[24..32].copy_from_slice(&h3);
        Self(out)
    }
}

/// Per-page progress metrics for reader chrome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// Global page index (0-based).
    pub global_page_index: usize,
    /// Total pages in the book.
    pub global_page_count: usize,
    /// Book progress in `[0.0, 1.0]`.
    pub progress_book: f32,
    /// Within-story page index (0-based), for story pages.
    pub story_page_index: Option<usize>,
    /// Total pages of the containing story, for story pages.
    pub story_page_count: Option<usize>,
    /// Story progress in `[0.0, 1.0]`, for story pages.
    pub progress_story: Option<f32>,
}

/// Story-level page span inside the assembled book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPageMapEntry {
    /// Source story id.
    pub story_id: String,
    /// First global page index for this story (0-based).
    pub first_page_index: usize,
    /// Page count for this story (start page plus continuations).
    pub page_count: usize,
}

impl BookPageMapEntry {
    fn contains_global_page(&self, global_page_index: usize) -> bool {
        if self.page_count == 0 {
            return false;
        }
        let start = self.first_page_index;
        let end = start.saturating_add(self.page_count);
        global_page_index >= start && global_page_index < end
    }
}

/// Persisted reading position.
///
/// Stores story identity plus normalized story/book progress so callers can
/// remap a reader's position after the book is repaginated under a
/// different [`PaginationConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingPositionToken {
    /// Story the reader was on, when the page belonged to a story.
    #[serde(default)]
    pub story_id: Option<String>,
    /// Page offset within that story in the source pagination.
    #[serde(default)]
    pub story_page_index: usize,
    /// Total pages of that story in the source pagination.
    #[serde(default)]
    pub story_page_count: usize,
    /// Story progress ratio in `[0.0, 1.0]`.
    #[serde(default)]
    pub story_progress: f32,
    /// Global page index in the source pagination.
    pub global_page_index: usize,
    /// Total global pages in the source pagination.
    pub global_page_count: usize,
}

impl ReadingPositionToken {
    fn normalized_story_progress(&self) -> f32 {
        if self.story_page_count > 1 {
            return page_progress_from_count(self.story_page_index, self.story_page_count);
        }
        normalize_progress(self.story_progress)
    }

    fn normalized_global_progress(&self) -> f32 {
        page_progress_from_count(self.global_page_index, self.global_page_count)
    }
}

/// Compact story-level page index for navigation and position remapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPageMap {
    entries: Vec<BookPageMapEntry>,
    total_pages: usize,
}

impl BookPageMap {
    /// Build a page map from story spans and the total page count.
    ///
    /// Spans are interpreted as 0-based global page indices and must not
    /// overlap; the assembler produces them in book order.
    pub fn new(entries: Vec<BookPageMapEntry>, total_pages: usize) -> Self {
        Self {
            entries,
            total_pages,
        }
    }

    /// Story-level entries in book order.
    pub fn entries(&self) -> &[BookPageMapEntry] {
        &self.entries
    }

    /// Total page count of the assembled book.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Resolve the start page index (0-based) for `story_id`.
    pub fn story_start_page_index(&self, story_id: &str) -> Option<usize> {
        self.entry_for_story(story_id)
            .map(|entry| entry.first_page_index)
    }

    /// Resolve the global page range for `story_id`.
    pub fn story_page_range(&self, story_id: &str) -> Option<core::ops::Range<usize>> {
        self.entry_for_story(story_id).map(|entry| {
            entry.first_page_index..entry.first_page_index.saturating_add(entry.page_count)
        })
    }

    /// Progress metrics for a global page index, clamped into range.
    pub fn metrics_for_page(&self, global_page_index: usize) -> Option<PageMetrics> {
        if self.total_pages == 0 {
            return None;
        }
        let clamped = global_page_index.min(self.total_pages - 1);
        let story = self.entry_for_global_page(clamped);
        let (story_page_index, story_page_count, progress_story) = match story {
            Some(entry) => {
                let offset = clamped.saturating_sub(entry.first_page_index);
                (
                    Some(offset),
                    Some(entry.page_count),
                    Some(page_progress_from_count(offset, entry.page_count)),
                )
            }
            None => (None, None, None),
        };
        Some(PageMetrics {
            global_page_index: clamped,
            global_page_count: self.total_pages,
            progress_book: page_progress_from_count(clamped, self.total_pages),
            story_page_index,
            story_page_count,
            progress_story,
        })
    }

    /// Build a persisted reading-position token for a global page index.
    ///
    /// Out-of-range indices clamp to the nearest valid page.
    pub fn position_token_for_page_index(
        &self,
        global_page_index: usize,
    ) -> Option<ReadingPositionToken> {
        if self.total_pages == 0 {
            return None;
        }
        let clamped = global_page_index.min(self.total_pages - 1);
        let story = self.entry_for_global_page(clamped);
        let (story_id, story_page_index, story_page_count) = match story {
            Some(entry) => (
                Some(entry.story_id.clone()),
                clamped.saturating_sub(entry.first_page_index),
                entry.page_count.max(1),
            ),
            None => (None, 0, 0),
        };
        Some(ReadingPositionToken {
            story_id,
            story_page_index,
            story_page_count,
            story_progress: if story_page_count > 0 {
                page_progress_from_count(story_page_index, story_page_count)
            } else {
                0.0
            },
            global_page_index: clamped,
            global_page_count: self.total_pages.max(1),
        })
    }

    /// Remap a persisted position token into this page map.
    ///
    /// Keeps story identity when the story still has pages here; otherwise
    /// falls back to global-progress remapping. Returns a 0-based global
    /// page index.
    pub fn remap_position_token(&self, token: &ReadingPositionToken) -> Option<usize> {
        if self.total_pages == 0 {
            return None;
        }
        if let Some(story_id) = token.story_id.as_deref() {
            if let Some(entry) = self.entry_for_story(story_id) {
                let local_index =
                    progress_to_page_index(token.normalized_story_progress(), entry.page_count);
                return Some(entry.first_page_index.saturating_add(local_index));
            }
        }
        Some(progress_to_page_index(
            token.normalized_global_progress(),
            self.total_pages,
        ))
    }

    fn entry_for_story(&self, story_id: &str) -> Option<&BookPageMapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.story_id == story_id && entry.page_count > 0)
    }

    fn entry_for_global_page(&self, global_page_index: usize) -> Option<&BookPageMapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.contains_global_page(global_page_index))
    }
}

pub(crate) fn normalize_progress(progress: f32) -> f32 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(crate) fn page_progress_from_count(page_index: usize, page_count: usize) -> f32 {
    if page_count <= 1 {
        return 0.0;
    }
    page_index.min(page_count - 1) as f32 / (page_count - 1) as f32
}

pub(crate) fn progress_to_page_index(progress: f32, page_count: usize) -> usize {
    if page_count <= 1 {
        return 0;
    }
    let scaled = normalize_progress(progress) * (page_count - 1) as f32;
    (scaled.round() as usize).min(page_count - 1)
}
