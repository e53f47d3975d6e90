//! Fixed vocabularies and palettes for each on-screen text context.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::glyph::{CharacterSet, ContextPalette, GlyphError, GlyphStore};

const LOWER_ALPHA: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_ALPHA: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

const LOCATIONS_EXTRA: &str = "’";
const DIALOG_EXTRA: &str = "é’-&♂♀";
const SPECIES_EXTRA: &str = "é’-&♂♀";
const DISPLAY_EXTRA: &str = "é’-(),♂♀";

const LOCATIONS_PALETTE: ContextPalette = ContextPalette {
    background: [0xFF, 0xFF, 0xFF],
    shadow: [0x92, 0x92, 0xA3],
    ink: [0x01, 0x01, 0x01],
};

const DIALOG_PALETTE: ContextPalette = ContextPalette {
    background: [0xFD, 0xFD, 0xFD],
    shadow: [0xA2, 0xA2, 0xAA],
    ink: [0x51, 0x51, 0x59],
};

const SPECIES_PALETTE: ContextPalette = ContextPalette {
    background: [0x69, 0x71, 0x59],
    shadow: [0x28, 0x30, 0x28],
    ink: [0xFD, 0xFD, 0xFD],
};

/// Where on screen a piece of text is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextContext {
    Locations,
    Dialog,
    Species,
    Display,
}

impl TextContext {
    pub const ALL: [Self; 4] = [Self::Locations, Self::Dialog, Self::Species, Self::Display];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locations => "locations",
            Self::Dialog => "dialog",
            Self::Species => "species",
            Self::Display => "display",
        }
    }

    /// Characters this context can ever show.
    #[must_use]
    pub fn vocabulary(self) -> BTreeSet<char> {
        let extra = match self {
            Self::Locations => LOCATIONS_EXTRA,
            Self::Dialog => DIALOG_EXTRA,
            Self::Species => SPECIES_EXTRA,
            Self::Display => DISPLAY_EXTRA,
        };
        LOWER_ALPHA
            .chars()
            .chain(UPPER_ALPHA.chars())
            .chain(DIGITS.chars())
            .chain(extra.chars())
            .collect()
    }

    #[must_use]
    pub const fn palette(self) -> ContextPalette {
        match self {
            Self::Locations | Self::Display => LOCATIONS_PALETTE,
            Self::Dialog => DIALOG_PALETTE,
            Self::Species => SPECIES_PALETTE,
        }
    }
}

impl fmt::Display for TextContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character sets for every context, built once at startup.
#[derive(Debug, Clone)]
pub struct Charsets {
    pub locations: CharacterSet,
    pub dialog: CharacterSet,
    pub species: CharacterSet,
    pub display: CharacterSet,
}

impl Charsets {
    /// Build every context's character set from `store`.
    ///
    /// # Errors
    ///
    /// Fails if the species vocabulary is not covered by the dialog
    /// vocabulary (nicknames are read from dialog text and compared against
    /// species names) or if any requested glyph is unavailable.
    pub fn build(store: &GlyphStore) -> Result<Self, GlyphError> {
        let dialog = TextContext::Dialog.vocabulary();
        let missing: Vec<char> = TextContext::Species
            .vocabulary()
            .difference(&dialog)
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(GlyphError::CharsetNotSubset {
                context: TextContext::Species.as_str(),
                missing,
            });
        }

        let build = |context: TextContext| {
            CharacterSet::build(store, &context.vocabulary(), context.palette())
        };
        Ok(Self {
            locations: build(TextContext::Locations)?,
            dialog: build(TextContext::Dialog)?,
            species: build(TextContext::Species)?,
            display: build(TextContext::Display)?,
        })
    }

    /// Sets with no glyphs, which recognize nothing. For sessions driven by
    /// already-recognized text.
    #[must_use]
    pub fn empty() -> Self {
        let empty = |context: TextContext| CharacterSet::from_glyphs(Vec::new(), context.palette());
        Self {
            locations: empty(TextContext::Locations),
            dialog: empty(TextContext::Dialog),
            species: empty(TextContext::Species),
            display: empty(TextContext::Display),
        }
    }

    #[must_use]
    pub const fn get(&self, context: TextContext) -> &CharacterSet {
        match context {
            TextContext::Locations => &self.locations,
            TextContext::Dialog => &self.dialog,
            TextContext::Species => &self.species,
            TextContext::Display => &self.display,
        }
    }

    /// Every character any context may request.
    #[must_use]
    pub fn all_characters() -> BTreeSet<char> {
        TextContext::ALL
            .into_iter()
            .flat_map(TextContext::vocabulary)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_vocabulary_is_within_dialog() {
        let dialog = TextContext::Dialog.vocabulary();
        assert!(TextContext::Species.vocabulary().is_subset(&dialog));
        assert!(dialog.contains(&'é'));
        assert!(!TextContext::Locations.vocabulary().contains(&'-'));
    }

    #[test]
    fn display_adds_punctuation() {
        let display = TextContext::Display.vocabulary();
        for c in ['(', ')', ','] {
            assert!(display.contains(&c));
        }
        assert_eq!(Charsets::all_characters().len(), 26 * 2 + 10 + 9);
    }

    #[test]
    fn missing_glyph_is_fatal() {
        let store = GlyphStore::default();
        assert!(matches!(
            Charsets::build(&store),
            Err(GlyphError::NoTemplateMapped { .. })
        ));
    }
}
