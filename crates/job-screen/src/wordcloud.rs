//! Word clouds rendered as SVG.

use std::fmt::Write;

use ahash::AHashMap;
use job_screen_preprocessing::pre_processor::{is_stop_word, normalize, word_tokens};

/// Texts shorter than this (after trimming) are not rendered.
pub const MIN_WORDCLOUD_CHARS: usize = 10;

const VIRIDIS: &[&str] = &["#440154", "#3b528b", "#21918c", "#5ec962", "#a5c21f"];
const REDS: &[&str] = &["#67000d", "#a50f15", "#cb181d", "#ef3b2c", "#fb6a4a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Reds,
}

impl Palette {
    fn colors(self) -> &'static [&'static str] {
        match self {
            Self::Viridis => VIRIDIS,
            Self::Reds => REDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgWordCloud {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    pub min_font: f64,
    pub max_font: f64,
    pub palette: Palette,
}

impl Default for SvgWordCloud {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            max_words: 100,
            min_font: 12.0,
            max_font: 64.0,
            palette: Palette::Viridis,
        }
    }
}

fn escape(word: &str) -> String {
    word.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Word frequencies of `text`, most frequent first, stop words and single
/// characters excluded. Ties are ordered alphabetically.
#[must_use]
pub fn word_frequencies(text: &str) -> Vec<(String, usize)> {
    let cleaned = normalize(text);
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for word in word_tokens(&cleaned) {
        if word.len() > 1 && !is_stop_word(word) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    let mut frequencies = counts
        .into_iter()
        .map(|(word, count)| (word.to_owned(), count))
        .collect::<Vec<_>>();
    frequencies.sort_by(|(a_word, a), (b_word, b)| b.cmp(a).then_with(|| a_word.cmp(b_word)));
    frequencies
}

impl SvgWordCloud {
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Render the words of `text`, or `None` if the text is too short or has
    /// nothing worth drawing.
    #[must_use]
    pub fn render(&self, text: &str) -> Option<Vec<u8>> {
        if text.trim().chars().count() < MIN_WORDCLOUD_CHARS {
            return None;
        }
        self.render_frequencies(&word_frequencies(text))
    }

    /// Render pre-computed `(word, count)` pairs, largest first.
    ///
    /// Words are laid out left to right in rows; font size scales linearly
    /// with frequency. Words that do not fit in the canvas are dropped.
    #[must_use]
    pub fn render_frequencies(&self, frequencies: &[(String, usize)]) -> Option<Vec<u8>> {
        let words = frequencies
            .iter()
            .filter(|(_, count)| *count > 0)
            .take(self.max_words)
            .collect::<Vec<_>>();
        let max = words.iter().map(|(_, c)| *c).max()?;
        let min = words.iter().map(|(_, c)| *c).min()?;

        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let margin = 8.0;
        let colors = self.palette.colors();

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="white"/>"#,
            w = self.width,
            h = self.height
        );

        let (mut x, mut baseline, mut row_height) = (margin, margin, 0.0_f64);
        for (i, (word, count)) in words.iter().enumerate() {
            let size = if max == min {
                self.max_font
            } else {
                self.min_font
                    + (self.max_font - self.min_font) * (*count - min) as f64 / (max - min) as f64
            };
            // Rough advance width of a sans-serif glyph
            let word_width = size * 0.6 * word.chars().count() as f64;

            if x + word_width > width - margin && x > margin {
                x = margin;
                baseline += row_height * 1.15;
                row_height = 0.0;
            }
            if row_height == 0.0 {
                row_height = size;
            }
            if baseline + row_height > height - margin || word_width > width - 2.0 * margin {
                continue;
            }

            let _ = write!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" font-family="sans-serif" font-size="{size:.1}" fill="{color}">{word}</text>"#,
                y = baseline + row_height,
                color = colors[i % colors.len()],
                word = escape(word),
            );
            x += word_width + size * 0.3;
        }
        svg.push_str("</svg>");
        Some(svg.into_bytes())
    }
}

/// Render a word cloud of `text` with default settings.
///
/// Returns `None` for empty text or text under ten characters.
#[must_use]
pub fn render_wordcloud(text: &str) -> Option<Vec<u8>> {
    SvgWordCloud::default().render(text)
}
