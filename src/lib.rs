//! Deterministic page layout engine for life-story book collections.
//!
//! Turns an ordered collection of [`Story`] records into a flat sequence of
//! typed [`BookPage`]s (table-of-contents pages, decade dividers, story
//! start pages, and continuation pages) plus a table of contents and a
//! [`BookPageMap`] for navigation. The whole pipeline is a pure function of
//! `(stories, PaginationConfig, measurer)`: same inputs, byte-identical
//! output.
//!
//! Text measurement sits behind the [`TextMeasurer`] trait so the splitting
//! and balancing algorithms stay testable without a rendering surface;
//! install a font-metrics-backed measurer in production and a fixed-advance
//! one in tests.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod book_ir;
mod engine;
mod layout;
mod measure;
mod story;

pub use book_ir::{
    BookPage, BookPageMap, BookPageMapEntry, DecadeMarkerPage, LayoutProfileId, PageMetrics,
    ReadingPositionToken, StoryContinuationPage, StoryStartPage, TocEntry, TocPage, TocTarget,
};
pub use engine::{BookAssembler, BookLayout, StoryLayoutSummary};
pub use layout::{
    ends_sentence, extract_chunk, split_story_lines, wrap_text, HeaderBlock, HeaderReservations,
    PaginationConfig,
};
pub use measure::{FixedAdvanceMeasurer, FontSpec, GlyphClassMeasurer, TextMeasurer};
pub use story::{
    decade_label_for_year, decade_start_year, AudioRef, DecadeGroup, PhotoRef, Story,
};
