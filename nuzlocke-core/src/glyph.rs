//! Glyph templates, the glyph store, and per-context character sets.
use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{
    PALETTE_BACKGROUND, PALETTE_INK, PALETTE_SHADOW, PRIORITY_WIDTH_SHIFT, ROW_HEIGHT,
    SPACE_WIDTH, SPRITE_INK_LUMA, SPRITE_SHADOW_LUMA,
};
use crate::fontmap::FontMap;

/// Fatal asset and configuration errors raised while building character sets.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("character {character:?} requested, but no template is mapped for it")]
    NoTemplateMapped { character: char },
    #[error("character {character:?} is mapped to {filename:?}, but no image data was found")]
    TemplateDataMissing { character: char, filename: String },
    #[error("duplicate character {character:?} in font index")]
    DuplicateCharacter { character: char },
    #[error("duplicate sprite filename {filename:?} in font index")]
    DuplicateFilename { filename: String },
    #[error("font index key {key:?} is not a single character")]
    BadIndexKey { key: String },
    #[error("template for {character:?} is {height}px tall, expected {expected}px")]
    TemplateHeight {
        character: char,
        height: u32,
        expected: u32,
    },
    #[error("template for {character:?} has no width")]
    EmptyTemplate { character: char },
    #[error("sprite data holds {len} indices, expected {width}x{height}")]
    SpriteShape { width: u32, height: u32, len: usize },
    #[error("{context} characters {missing:?} are not in the dialog vocabulary")]
    CharsetNotSubset {
        context: &'static str,
        missing: Vec<char>,
    },
    #[error("failed to decode sprite {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read sprite directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Colours a sprite takes on in one screen context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPalette {
    pub background: [u8; 3],
    pub shadow: [u8; 3],
    pub ink: [u8; 3],
}

impl ContextPalette {
    #[must_use]
    pub const fn color(&self, index: u8) -> [u8; 3] {
        match index {
            PALETTE_SHADOW => self.shadow,
            PALETTE_INK => self.ink,
            _ => self.background,
        }
    }
}

/// Palette-indexed glyph bitmap as exported from the font sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: u32,
    height: u32,
    indices: Vec<u8>,
}

impl Sprite {
    /// Wrap raw palette indices (row-major, `0` background, `1` shadow, `2` ink).
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError::SpriteShape`] if the buffer does not hold exactly
    /// `width * height` indices.
    pub fn from_indices(width: u32, height: u32, indices: Vec<u8>) -> Result<Self, GlyphError> {
        if indices.len() != (width as usize) * (height as usize) {
            return Err(GlyphError::SpriteShape {
                width,
                height,
                len: indices.len(),
            });
        }
        Ok(Self {
            width,
            height,
            indices,
        })
    }

    /// Decode an exported RGBA sprite: transparent pixels are background,
    /// opaque pixels are split into ink and shadow by luminance.
    #[must_use]
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let indices = image
            .pixels()
            .map(|px| {
                let [r, g, b, a] = px.0;
                if a == 0 {
                    return PALETTE_BACKGROUND;
                }
                let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
                if luma < SPRITE_INK_LUMA {
                    PALETTE_INK
                } else if luma < SPRITE_SHADOW_LUMA {
                    PALETTE_SHADOW
                } else {
                    PALETTE_BACKGROUND
                }
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            indices,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> u8 {
        self.indices[(y * self.width + x) as usize]
    }
}

/// One recognizable character: recoloured template plus transparency mask.
#[derive(Debug, Clone)]
pub struct Glyph {
    character: char,
    priority: u32,
    template: RgbImage,
    mask: GrayImage,
}

impl Glyph {
    /// Recolour `sprite` with `palette`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sprite is not exactly one text row tall or has
    /// no columns.
    pub fn from_sprite(
        character: char,
        sprite: &Sprite,
        palette: &ContextPalette,
    ) -> Result<Self, GlyphError> {
        if sprite.height() != ROW_HEIGHT {
            return Err(GlyphError::TemplateHeight {
                character,
                height: sprite.height(),
                expected: ROW_HEIGHT,
            });
        }
        if sprite.width() == 0 {
            return Err(GlyphError::EmptyTemplate { character });
        }
        let template = RgbImage::from_fn(sprite.width(), sprite.height(), |x, y| {
            Rgb(palette.color(sprite.index(x, y)))
        });
        let mask = GrayImage::from_fn(sprite.width(), sprite.height(), |x, y| {
            if sprite.index(x, y) == PALETTE_BACKGROUND {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let ink = mask.pixels().filter(|px| px.0[0] != 0).count() as u32;
        Ok(Self {
            character,
            priority: (sprite.width() << PRIORITY_WIDTH_SHIFT) + ink,
            template,
            mask,
        })
    }

    #[must_use]
    pub const fn character(&self) -> char {
        self.character
    }

    /// Matching priority: wider glyphs first, then glyphs with more ink.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.template.width()
    }

    #[must_use]
    pub const fn template(&self) -> &RgbImage {
        &self.template
    }

    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }
}

/// Sprites for every mapped character of one font.
#[derive(Debug, Clone, Default)]
pub struct GlyphStore {
    font_map: FontMap,
    sprites: HashMap<String, Sprite>,
}

impl GlyphStore {
    #[must_use]
    pub fn new(font_map: FontMap) -> Self {
        Self {
            font_map,
            sprites: HashMap::new(),
        }
    }

    /// Register sprite data under its filename.
    pub fn insert_sprite(&mut self, filename: impl Into<String>, sprite: Sprite) {
        self.sprites.insert(filename.into(), sprite);
    }

    /// Load `<dir>/<filename>.png` for every filename in `font_map`.
    ///
    /// Files that do not exist are skipped; asking a character set for
    /// their character later fails with [`GlyphError::TemplateDataMissing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a present sprite
    /// cannot be decoded.
    pub fn load_dir(font_map: FontMap, dir: &Path) -> Result<Self, GlyphError> {
        if !dir.is_dir() {
            return Err(GlyphError::Io {
                path: dir.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }
        let mut store = Self::new(font_map);
        let filenames: Vec<String> = store.font_map.filenames().map(str::to_string).collect();
        for filename in filenames {
            let path = dir.join(format!("{filename}.png"));
            if !path.is_file() {
                log::debug!("sprite {} not present", path.display());
                continue;
            }
            let decoded = image::open(&path).map_err(|source| GlyphError::Image {
                path: path.clone(),
                source,
            })?;
            store.insert_sprite(filename, Sprite::from_rgba(&decoded.to_rgba8()));
        }
        Ok(store)
    }

    /// Sprite for `character`.
    ///
    /// # Errors
    ///
    /// Distinguishes a character with no mapped filename from one whose
    /// filename has no sprite data.
    pub fn sprite(&self, character: char) -> Result<&Sprite, GlyphError> {
        let filename = self
            .font_map
            .filename(character)
            .ok_or(GlyphError::NoTemplateMapped { character })?;
        self.sprites
            .get(filename)
            .ok_or_else(|| GlyphError::TemplateDataMissing {
                character,
                filename: filename.to_string(),
            })
    }

    #[must_use]
    pub const fn font_map(&self) -> &FontMap {
        &self.font_map
    }
}

/// Ordered glyphs for one recognition context.
///
/// Order is descending priority and is significant: when two glyphs score
/// the same at a column, the earlier one wins.
#[derive(Debug, Clone)]
pub struct CharacterSet {
    glyphs: Vec<Glyph>,
    palette: ContextPalette,
}

impl CharacterSet {
    /// Build a character set for `characters` recoloured with `palette`.
    ///
    /// # Errors
    ///
    /// Fails on the first requested character the store cannot provide.
    pub fn build(
        store: &GlyphStore,
        characters: &BTreeSet<char>,
        palette: ContextPalette,
    ) -> Result<Self, GlyphError> {
        let glyphs = characters
            .iter()
            .map(|&character| Glyph::from_sprite(character, store.sprite(character)?, &palette))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_glyphs(glyphs, palette))
    }

    /// Order pre-built glyphs by priority (ties by character).
    #[must_use]
    pub fn from_glyphs(mut glyphs: Vec<Glyph>, palette: ContextPalette) -> Self {
        glyphs.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.character.cmp(&b.character))
        });
        Self { glyphs, palette }
    }

    #[must_use]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[must_use]
    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.character == character)
    }

    #[must_use]
    pub fn contains(&self, character: char) -> bool {
        self.glyph(character).is_some()
    }

    #[must_use]
    pub const fn palette(&self) -> &ContextPalette {
        &self.palette
    }

    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.iter().map(Glyph::character)
    }

    /// Draw one line of reference text as the game would show it.
    ///
    /// Spaces become [`SPACE_WIDTH`] background columns; the line is padded
    /// with one background gap on each side.
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError::NoTemplateMapped`] for characters outside the set.
    pub fn render(&self, text: &str) -> Result<RgbImage, GlyphError> {
        let mut pieces = Vec::with_capacity(text.len());
        for character in text.chars() {
            if character == ' ' {
                pieces.push(None);
            } else {
                let glyph = self
                    .glyph(character)
                    .ok_or(GlyphError::NoTemplateMapped { character })?;
                pieces.push(Some(glyph));
            }
        }
        let content: u32 = pieces
            .iter()
            .map(|piece| piece.map_or(SPACE_WIDTH, Glyph::width))
            .sum();
        let mut line = RgbImage::from_pixel(
            content + 2 * SPACE_WIDTH,
            ROW_HEIGHT,
            Rgb(self.palette.background),
        );
        let mut x = SPACE_WIDTH;
        for piece in pieces {
            match piece {
                Some(glyph) => {
                    image::imageops::replace(&mut line, glyph.template(), i64::from(x), 0);
                    x += glyph.width();
                }
                None => x += SPACE_WIDTH,
            }
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: ContextPalette = ContextPalette {
        background: [255, 255, 255],
        shadow: [146, 146, 163],
        ink: [1, 1, 1],
    };

    fn column_sprite(width: u32, ink_columns: u32) -> Sprite {
        let mut indices = vec![0u8; (width * ROW_HEIGHT) as usize];
        for y in 2..12 {
            for x in 0..ink_columns {
                indices[(y * width + x) as usize] = PALETTE_INK;
            }
        }
        Sprite::from_indices(width, ROW_HEIGHT, indices).unwrap()
    }

    #[test]
    fn priority_prefers_width_then_ink() {
        let narrow_dark = Glyph::from_sprite('i', &column_sprite(3, 2), &PALETTE).unwrap();
        let wide_light = Glyph::from_sprite('m', &column_sprite(6, 1), &PALETTE).unwrap();
        let wide_dark = Glyph::from_sprite('w', &column_sprite(6, 4), &PALETTE).unwrap();
        assert_eq!(narrow_dark.priority(), (3 << 10) + 20);
        let set = CharacterSet::from_glyphs(vec![narrow_dark, wide_light, wide_dark], PALETTE);
        let order: String = set.characters().collect();
        assert_eq!(order, "wmi");
    }

    #[test]
    fn template_and_mask_follow_palette() {
        let glyph = Glyph::from_sprite('l', &column_sprite(3, 1), &PALETTE).unwrap();
        assert_eq!(glyph.template().get_pixel(0, 5).0, PALETTE.ink);
        assert_eq!(glyph.template().get_pixel(2, 5).0, PALETTE.background);
        assert_eq!(glyph.mask().get_pixel(0, 5).0, [255]);
        assert_eq!(glyph.mask().get_pixel(2, 5).0, [0]);
    }

    #[test]
    fn wrong_height_is_rejected() {
        let sprite = Sprite::from_indices(2, 8, vec![0; 16]).unwrap();
        let err = Glyph::from_sprite('x', &sprite, &PALETTE).unwrap_err();
        assert!(matches!(err, GlyphError::TemplateHeight { height: 8, .. }));
        assert!(matches!(
            Sprite::from_indices(2, 2, vec![0; 3]),
            Err(GlyphError::SpriteShape { len: 3, .. })
        ));
    }

    #[test]
    fn store_distinguishes_missing_mapping_from_missing_data() {
        let map = FontMap::from_pairs([('A', "upper_a"), ('B', "upper_b")]).unwrap();
        let mut store = GlyphStore::new(map);
        store.insert_sprite("upper_a", column_sprite(4, 2));

        assert!(store.sprite('A').is_ok());
        assert!(matches!(
            store.sprite('B'),
            Err(GlyphError::TemplateDataMissing { character: 'B', ref filename }) if filename == "upper_b"
        ));
        assert!(matches!(
            store.sprite('C'),
            Err(GlyphError::NoTemplateMapped { character: 'C' })
        ));

        let wanted: BTreeSet<char> = ['A', 'B'].into_iter().collect();
        assert!(matches!(
            CharacterSet::build(&store, &wanted, PALETTE),
            Err(GlyphError::TemplateDataMissing { .. })
        ));
    }

    #[test]
    fn decode_rgba_sprite() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([150, 150, 150, 255]));
        let sprite = Sprite::from_rgba(&image);
        assert_eq!(sprite.index(0, 0), PALETTE_INK);
        assert_eq!(sprite.index(1, 0), PALETTE_SHADOW);
        let transparent = RgbaImage::new(1, 1);
        assert_eq!(Sprite::from_rgba(&transparent).index(0, 0), PALETTE_BACKGROUND);
    }

    #[test]
    fn render_lays_out_glyphs_and_spaces() {
        let map = FontMap::from_pairs([('a', "a")]).unwrap();
        let mut store = GlyphStore::new(map);
        store.insert_sprite("a", column_sprite(3, 1));
        let set = CharacterSet::build(&store, &['a'].into_iter().collect(), PALETTE).unwrap();
        let line = set.render("a a").unwrap();
        assert_eq!(line.width(), 3 + SPACE_WIDTH + 3 + 2 * SPACE_WIDTH);
        assert_eq!(line.height(), ROW_HEIGHT);
        assert_eq!(line.get_pixel(SPACE_WIDTH, 4).0, PALETTE.ink);
        assert!(matches!(
            set.render("b"),
            Err(GlyphError::NoTemplateMapped { character: 'b' })
        ));
    }
}
