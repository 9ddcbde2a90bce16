//! Book assembly: from a story collection to a numbered page sequence.

use std::sync::Arc;

use crate::book_ir::{
    BookPage, BookPageMap, BookPageMapEntry, DecadeMarkerPage, StoryContinuationPage,
    StoryStartPage, TocEntry, TocPage, TocTarget,
};
use crate::layout::{split_story_lines, wrap_text, PaginationConfig};
use crate::measure::{GlyphClassMeasurer, TextMeasurer};
use crate::story::{DecadeGroup, Story};

/// Summary emitted per story after layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoryLayoutSummary {
    /// Source story id.
    pub story_id: String,
    /// Pages produced for this story (start page plus continuations).
    pub page_count: usize,
    /// Wrapped body line count.
    pub line_count: usize,
}

/// Assembled book: the full page sequence plus derived navigation data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookLayout {
    /// All pages in reading order, numbered 1..=n with no gaps.
    pub pages: Vec<BookPage>,
    /// Flat table of contents (also embedded in the TOC pages).
    pub toc: Vec<TocEntry>,
    /// Story-level page spans for navigation and position remapping.
    pub page_map: BookPageMap,
    /// Per-story layout summaries in book order.
    pub summaries: Vec<StoryLayoutSummary>,
}

/// Deterministic whole-book assembler.
///
/// A pure function of `(stories, PaginationConfig, measurer)`: no I/O, no
/// randomness, no caching. Callers re-invoke it wholesale when the viewport
/// or font size changes and use [`BookPageMap::remap_position_token`] to
/// keep the reader on the same content.
#[derive(Clone)]
pub struct BookAssembler {
    cfg: PaginationConfig,
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for BookAssembler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BookAssembler")
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl BookAssembler {
    /// Create an assembler with the default glyph-class measurer.
    pub fn new(cfg: PaginationConfig) -> Self {
        Self {
            cfg,
            measurer: Arc::new(GlyphClassMeasurer),
        }
    }

    /// Install a shared text measurer for width-accurate line fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Active layout configuration.
    pub fn config(&self) -> &PaginationConfig {
        &self.cfg
    }

    /// Lay out the whole book.
    ///
    /// Stories are sorted chronologically and grouped by decade; TOC pages
    /// come first, then per decade a marker page followed by each story's
    /// pages. An empty collection yields an empty layout.
    pub fn assemble(&self, stories: &[Story]) -> BookLayout {
        if stories.is_empty() {
            return BookLayout::default();
        }

        let groups = DecadeGroup::group(stories);
        let story_total: usize = groups.iter().map(|group| group.stories.len()).sum();
        let toc_cap = self.cfg.toc_capacity();
        let toc_page_count = (groups.len() + story_total).div_ceil(toc_cap);

        let mut content = Vec::with_capacity(story_total * 2 + groups.len());
        let mut toc = Vec::with_capacity(groups.len() + story_total);
        let mut map_entries = Vec::with_capacity(story_total);
        let mut summaries = Vec::with_capacity(story_total);
        // Content numbering starts after the TOC pages; the TOC entry count
        // is known up front, so no fixpoint pass is needed.
        let mut page_number = toc_page_count;

        for group in &groups {
            page_number += 1;
            toc.push(TocEntry {
                title: group.label.clone(),
                page_number,
                target: TocTarget::Decade,
            });
            content.push(BookPage::DecadeMarker(DecadeMarkerPage {
                page_number,
                label: group.label.clone(),
                start_year: group.start_year,
                story_count: group.stories.len(),
            }));

            for story in &group.stories {
                let lines = wrap_text(&story.body, &self.cfg, self.measurer.as_ref());
                let line_count = lines.len();
                let first_cap = self.cfg.start_page_capacity(story);
                let mut slices = split_story_lines(lines, first_cap, &self.cfg).into_iter();

                page_number += 1;
                toc.push(TocEntry {
                    title: story.title.clone(),
                    page_number,
                    target: TocTarget::Story {
                        story_id: story.id.clone(),
                    },
                });
                let first_page_index = page_number - 1;
                content.push(BookPage::StoryStart(StoryStartPage {
                    page_number,
                    story_id: story.id.clone(),
                    title: story.title.clone(),
                    year: story.year,
                    photo: story.hero_photo().cloned(),
                    has_audio: story.audio.is_some(),
                    lines: slices.next().unwrap_or_default(),
                }));
                let mut story_pages = 1usize;
                for (idx, chunk) in slices.enumerate() {
                    page_number += 1;
                    story_pages += 1;
                    content.push(BookPage::StoryContinuation(StoryContinuationPage {
                        page_number,
                        story_id: story.id.clone(),
                        ordinal: idx + 1,
                        lines: chunk,
                    }));
                }
                map_entries.push(BookPageMapEntry {
                    story_id: story.id.clone(),
                    first_page_index,
                    page_count: story_pages,
                });
                summaries.push(StoryLayoutSummary {
                    story_id: story.id.clone(),
                    page_count: story_pages,
                    line_count,
                });
            }
        }

        let mut pages = Vec::with_capacity(toc_page_count + content.len());
        for (idx, entries) in toc.chunks(toc_cap).enumerate() {
            pages.push(BookPage::TableOfContents(TocPage {
                page_number: idx + 1,
                entries: entries.to_vec(),
            }));
        }
        pages.extend(content);
        let total_pages = pages.len();
        log::debug!(
            "assembled {story_total} stories across {} decades into {total_pages} pages",
            groups.len()
        );

        BookLayout {
            pages,
            toc,
            page_map: BookPageMap::new(map_entries, total_pages),
            summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BookAssembler, BookLayout};
    use crate::layout::PaginationConfig;

    #[test]
    fn empty_collection_yields_empty_layout() {
        let assembler = BookAssembler::new(PaginationConfig::default());
        assert_eq!(assembler.assemble(&[]), BookLayout::default());
    }
}
