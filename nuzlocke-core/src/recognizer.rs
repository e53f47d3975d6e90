//! Fixed-height bitmap text recognition.
//!
//! Every glyph is exactly one row tall, so template matching only slides
//! horizontally. For each column the best-scoring glyph (normalized
//! cross-correlation) is accepted when it clears [`MATCH_THRESHOLD`]; an
//! accepted glyph blocks the columns it covers, and runs of covered columns
//! are read back as words.
use image::RgbImage;

use crate::constants::{FLAT_EPSILON, MATCH_THRESHOLD, ROW_HEIGHT};
use crate::glyph::{CharacterSet, Glyph};

/// Whether background pixels of a template take part in the correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Plain,
    Masked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Unassigned,
    Occupied,
    Glyph(usize),
}

/// Template with per-channel means removed, ready to correlate.
struct Prepared {
    width: u32,
    total: f64,
    weights: Vec<f64>,
    centered: Vec<[f64; 3]>,
    norm: f64,
}

impl Prepared {
    fn new(glyph: &Glyph, mode: MatchMode) -> Self {
        let template = glyph.template();
        let weights: Vec<f64> = match mode {
            MatchMode::Plain => vec![1.0; (template.width() * template.height()) as usize],
            MatchMode::Masked => glyph
                .mask()
                .pixels()
                .map(|px| if px.0[0] == 0 { 0.0 } else { 1.0 })
                .collect(),
        };
        let total: f64 = weights.iter().sum();
        let mut mean = [0.0f64; 3];
        if total > 0.0 {
            for (px, w) in template.pixels().zip(&weights) {
                for c in 0..3 {
                    mean[c] += w * f64::from(px.0[c]);
                }
            }
            for m in &mut mean {
                *m /= total;
            }
        }
        let mut norm = 0.0;
        let centered = template
            .pixels()
            .zip(&weights)
            .map(|(px, w)| {
                let mut out = [0.0; 3];
                for c in 0..3 {
                    out[c] = w * (f64::from(px.0[c]) - mean[c]);
                    norm += out[c] * out[c];
                }
                out
            })
            .collect();
        Self {
            width: template.width(),
            total,
            weights,
            centered,
            norm,
        }
    }

    /// Correlation of this template against `row` with its left edge at `x0`.
    fn score(&self, row: &RgbImage, x0: u32) -> f64 {
        let total = self.total;
        if total <= 0.0 || self.norm <= FLAT_EPSILON {
            return 0.0;
        }
        let mut mean = [0.0f64; 3];
        for y in 0..ROW_HEIGHT {
            for x in 0..self.width {
                let w = self.weights[(y * self.width + x) as usize];
                let px = row.get_pixel(x0 + x, y).0;
                for c in 0..3 {
                    mean[c] += w * f64::from(px[c]);
                }
            }
        }
        for m in &mut mean {
            *m /= total;
        }

        let mut cross = 0.0;
        let mut energy = 0.0;
        for y in 0..ROW_HEIGHT {
            for x in 0..self.width {
                let i = (y * self.width + x) as usize;
                let w = self.weights[i];
                let px = row.get_pixel(x0 + x, y).0;
                for c in 0..3 {
                    let v = w * (f64::from(px[c]) - mean[c]);
                    cross += self.centered[i][c] * v;
                    energy += v * v;
                }
            }
        }
        let denom = (self.norm * energy).sqrt();
        if denom <= FLAT_EPSILON {
            0.0
        } else {
            cross / denom
        }
    }
}

/// Recognize every text row in `region`, returning words in reading order.
///
/// `region` should be a whole number of rows tall; a trailing partial row is
/// ignored. Empty regions and regions without confident matches yield an
/// empty list.
#[must_use]
pub fn parse_text(region: &RgbImage, charset: &CharacterSet, mode: MatchMode) -> Vec<String> {
    let rows = region.height() / ROW_HEIGHT;
    if region.height() % ROW_HEIGHT != 0 {
        log::warn!(
            "text region is {}px tall, not a multiple of {ROW_HEIGHT}; ignoring partial row",
            region.height()
        );
    }
    if rows == 0 || region.width() == 0 || charset.glyphs().is_empty() {
        return Vec::new();
    }
    let prepared = prepare(charset, mode);
    (0..rows)
        .flat_map(|row| {
            let strip =
                image::imageops::crop_imm(region, 0, row * ROW_HEIGHT, region.width(), ROW_HEIGHT)
                    .to_image();
            read_row(&strip, charset, &prepared)
        })
        .collect()
}

/// Recognize a single row exactly [`ROW_HEIGHT`] pixels tall.
#[must_use]
pub fn parse_text_row(row: &RgbImage, charset: &CharacterSet, mode: MatchMode) -> Vec<String> {
    if row.height() != ROW_HEIGHT || row.width() == 0 || charset.glyphs().is_empty() {
        return Vec::new();
    }
    read_row(row, charset, &prepare(charset, mode))
}

fn prepare(charset: &CharacterSet, mode: MatchMode) -> Vec<Prepared> {
    charset
        .glyphs()
        .iter()
        .map(|glyph| Prepared::new(glyph, mode))
        .collect()
}

fn read_row(row: &RgbImage, charset: &CharacterSet, prepared: &[Prepared]) -> Vec<String> {
    let columns = assign_columns(row, prepared);
    let glyphs = charset.glyphs();

    let mut words = Vec::new();
    let mut current = String::new();
    for column in columns {
        match column {
            Column::Unassigned => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            Column::Occupied => {}
            Column::Glyph(i) => current.push(glyphs[i].character()),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Greedy left-to-right assignment: the first accepted match wins and
/// blocks the columns under it, with no backtracking.
fn assign_columns(row: &RgbImage, prepared: &[Prepared]) -> Vec<Column> {
    let width = row.width();
    let mut columns = vec![Column::Unassigned; width as usize];
    let mut x = 0;
    while x < width {
        if columns[x as usize] == Column::Occupied {
            x += 1;
            continue;
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, template) in prepared.iter().enumerate() {
            if x + template.width > width {
                continue;
            }
            let score = template.score(row, x);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        if let Some((i, score)) = best
            && score > MATCH_THRESHOLD
        {
            columns[x as usize] = Column::Glyph(i);
            let end = (x + prepared[i].width).min(width);
            for covered in &mut columns[(x + 1) as usize..end as usize] {
                *covered = Column::Occupied;
            }
        }
        x += 1;
    }
    columns
}
