//! Centralized recognition and tracking constants.
//!
//! The font geometry and match threshold are properties of the game's text
//! renderer, not user preferences, so they live here rather than in the
//! JSON configuration.

// Recognition --------------------------------------------------------------
/// Height in pixels of one line of glyphs (and of every glyph template).
pub const ROW_HEIGHT: u32 = 16;
/// Minimum normalized cross-correlation a column needs to accept a glyph.
pub const MATCH_THRESHOLD: f64 = 0.95;
/// Correlation denominators below this are treated as flat (score 0).
pub(crate) const FLAT_EPSILON: f64 = 1e-9;
/// Shift applied to glyph width when computing the matching priority.
pub(crate) const PRIORITY_WIDTH_SHIFT: u32 = 10;
/// Background columns emitted for a space when rendering reference text.
pub const SPACE_WIDTH: u32 = 4;

// Sprite decoding -----------------------------------------------------------
pub(crate) const PALETTE_BACKGROUND: u8 = 0;
pub(crate) const PALETTE_SHADOW: u8 = 1;
pub(crate) const PALETTE_INK: u8 = 2;
/// Opaque sprite pixels darker than this luminance decode as ink.
pub(crate) const SPRITE_INK_LUMA: u32 = 96;
/// Opaque sprite pixels darker than this (but not ink) decode as shadow.
pub(crate) const SPRITE_SHADOW_LUMA: u32 = 224;

// Tracker defaults ---------------------------------------------------------
/// Location shown before the first location strip has been recognized.
pub const DEFAULT_LOCATION: &str = "???";
/// Foes in a single battle.
pub(crate) const SINGLE_FOES: u8 = 1;
/// Foes in a double battle.
pub(crate) const DOUBLE_FOES: u8 = 2;
