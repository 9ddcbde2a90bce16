//! Text width measurement behind a trait seam.
//!
//! The splitting and balancing algorithms never touch a rendering surface;
//! they only ever ask "how wide is this text at this font". Production
//! callers can install a glyph-accurate measurer backed by real font
//! metrics, while tests inject a deterministic fixed-advance measurer.

/// Font parameters relevant to width measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    /// Size in pixels.
    pub size_px: f32,
    /// Letter spacing in px.
    pub letter_spacing: f32,
    /// Bold weight flag.
    pub bold: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size_px: 16.0,
            letter_spacing: 0.0,
            bold: false,
        }
    }
}

/// Text measurement hook for width-accurate line fitting.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width for the provided font.
    fn measure_px(&self, text: &str, font: &FontSpec) -> f32;

    /// Conservative (safe upper-bound) width estimate.
    ///
    /// Default delegates to `measure_px`.
    fn conservative_px(&self, text: &str, font: &FontSpec) -> f32 {
        self.measure_px(text, font)
    }
}

/// Default measurer using a per-glyph-class proportional width model.
///
/// More stable across font sizes than a single average-width scalar, and
/// close enough to common serif body faces for page-capacity purposes.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphClassMeasurer;

impl TextMeasurer for GlyphClassMeasurer {
    fn measure_px(&self, text: &str, font: &FontSpec) -> f32 {
        let chars = text.chars().count();
        if chars == 0 {
            return 0.0;
        }
        let mut em_sum = 0.0f32;
        for ch in text.chars() {
            em_sum += glyph_em_width(ch);
        }
        let mut scale = 1.0f32;
        if font.bold {
            scale += 0.03;
        }
        if font.size_px >= 24.0 {
            scale += 0.01;
        }
        let mut width = em_sum * font.size_px * scale;
        if chars > 1 {
            width += (chars as f32 - 1.0) * font.letter_spacing;
        }
        width
    }

    fn conservative_px(&self, text: &str, font: &FontSpec) -> f32 {
        // Small safety band against right-edge glyph overhang.
        self.measure_px(text, font) * 1.04
    }
}

/// Fixed-advance measurer for deterministic tests and monospace rendering.
///
/// Every glyph advances by `advance_em * size_px`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMeasurer {
    /// Glyph advance as a fraction of the em size.
    pub advance_em: f32,
}

impl FixedAdvanceMeasurer {
    /// Measurer with a typical monospace advance.
    pub const fn monospace() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure_px(&self, text: &str, font: &FontSpec) -> f32 {
        let chars = text.chars().count();
        if chars == 0 {
            return 0.0;
        }
        let mut width = chars as f32 * self.advance_em * font.size_px;
        if chars > 1 {
            width += (chars as f32 - 1.0) * font.letter_spacing;
        }
        width
    }
}

fn glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}
