//! Character to sprite-filename association.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use thiserror::Error;

use crate::glyph::GlyphError;

/// Which side of a [`Bijection`] rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BijectionError {
    #[error("left value already mapped")]
    DuplicateLeft,
    #[error("right value already mapped")]
    DuplicateRight,
}

/// Two-way map that refuses to overwrite on either side.
#[derive(Debug, Clone)]
pub struct Bijection<L, R> {
    forward: HashMap<L, R>,
    backward: HashMap<R, L>,
}

impl<L, R> Default for Bijection<L, R> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<L, R> Bijection<L, R>
where
    L: Eq + Hash + Clone,
    R: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is already present; the map is left
    /// untouched in that case.
    pub fn insert(&mut self, left: L, right: R) -> Result<(), BijectionError> {
        if self.forward.contains_key(&left) {
            return Err(BijectionError::DuplicateLeft);
        }
        if self.backward.contains_key(&right) {
            return Err(BijectionError::DuplicateRight);
        }
        self.forward.insert(left.clone(), right.clone());
        self.backward.insert(right, left);
        Ok(())
    }

    #[must_use]
    pub fn get_by_left(&self, left: &L) -> Option<&R> {
        self.forward.get(left)
    }

    #[must_use]
    pub fn get_by_right(&self, right: &R) -> Option<&L> {
        self.backward.get(right)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&L, &R)> {
        self.forward.iter()
    }
}

/// On-disk font index: every character the tracker may ask for, keyed to the
/// sprite filename (without extension) exported from the font sheet.
///
/// An empty filename marks a character that has no template in this font.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontIndex {
    pub glyphs: BTreeMap<String, String>,
}

impl FontIndex {
    /// Parse a font index from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a font index.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Bijection between characters and sprite filenames.
#[derive(Debug, Clone, Default)]
pub struct FontMap {
    pairs: Bijection<char, String>,
}

impl FontMap {
    /// Build the map from `(character, filename)` pairs.
    ///
    /// Pairs with an empty filename are skipped, so those characters later
    /// report [`GlyphError::NoTemplateMapped`].
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError::DuplicateCharacter`] or
    /// [`GlyphError::DuplicateFilename`] when the association is not one to
    /// one.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, GlyphError>
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        let mut map = Bijection::new();
        for (character, filename) in pairs {
            let filename = filename.into();
            if filename.is_empty() {
                log::debug!("font map skips {character:?}: no filename");
                continue;
            }
            map.insert(character, filename.clone())
                .map_err(|err| match err {
                    BijectionError::DuplicateLeft => GlyphError::DuplicateCharacter { character },
                    BijectionError::DuplicateRight => GlyphError::DuplicateFilename { filename },
                })?;
        }
        Ok(Self { pairs: map })
    }

    /// Build the map from a parsed [`FontIndex`].
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not exactly one character or if the
    /// association is not one to one.
    pub fn from_index(index: &FontIndex) -> Result<Self, GlyphError> {
        let mut pairs = Vec::with_capacity(index.glyphs.len());
        for (key, filename) in &index.glyphs {
            let mut chars = key.chars();
            let (Some(character), None) = (chars.next(), chars.next()) else {
                return Err(GlyphError::BadIndexKey { key: key.clone() });
            };
            pairs.push((character, filename.as_str()));
        }
        Self::from_pairs(pairs)
    }

    #[must_use]
    pub fn filename(&self, character: char) -> Option<&str> {
        self.pairs.get_by_left(&character).map(String::as_str)
    }

    #[must_use]
    pub fn character(&self, filename: &str) -> Option<char> {
        self.pairs.get_by_right(&filename.to_string()).copied()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, filename)| filename.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_rejects_duplicates_on_both_sides() {
        let mut map = Bijection::new();
        map.insert('a', "00a1".to_string()).unwrap();
        assert_eq!(
            map.insert('a', "00a2".to_string()),
            Err(BijectionError::DuplicateLeft)
        );
        assert_eq!(
            map.insert('b', "00a1".to_string()),
            Err(BijectionError::DuplicateRight)
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_right(&"00a1".to_string()), Some(&'a'));
    }

    #[test]
    fn font_map_reports_duplicate_kinds() {
        let dup_char = FontMap::from_pairs([('A', "x1"), ('A', "x2")]).unwrap_err();
        assert!(matches!(dup_char, GlyphError::DuplicateCharacter { character: 'A' }));

        let dup_file = FontMap::from_pairs([('A', "x1"), ('B', "x1")]).unwrap_err();
        assert!(matches!(dup_file, GlyphError::DuplicateFilename { ref filename } if filename == "x1"));
    }

    #[test]
    fn font_map_skips_empty_filenames() {
        let map = FontMap::from_pairs([('A', "x1"), ('B', "")]).unwrap();
        assert_eq!(map.filename('A'), Some("x1"));
        assert_eq!(map.filename('B'), None);
        assert_eq!(map.character("x1"), Some('A'));
    }

    #[test]
    fn font_index_parses_and_validates_keys() {
        let index = FontIndex::from_json(r#"{"glyphs": {"é": "e_acute", "’": "apos"}}"#).unwrap();
        let map = FontMap::from_index(&index).unwrap();
        assert_eq!(map.filename('é'), Some("e_acute"));

        let bad = FontIndex::from_json(r#"{"glyphs": {"ab": "x"}}"#).unwrap();
        assert!(matches!(
            FontMap::from_index(&bad),
            Err(GlyphError::BadIndexKey { .. })
        ));
    }
}
