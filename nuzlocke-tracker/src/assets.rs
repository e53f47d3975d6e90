use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use nuzlocke_core::{Charsets, FontIndex, FontMap, GlyphStore, TrackerConfig, ValidityTables};

/// Everything the tracker loads once at startup.
#[derive(Debug, Clone)]
pub struct TrackerAssets {
    pub charsets: Charsets,
    pub tables: ValidityTables,
    pub config: TrackerConfig,
}

impl TrackerAssets {
    pub fn load(
        font_index: &Path,
        sprites: &Path,
        config: Option<&Path>,
        names: Option<&Path>,
    ) -> Result<Self> {
        let charsets = load_charsets(font_index, sprites)?;
        let config = match config {
            Some(path) => TrackerConfig::from_json(&read_text(path)?)
                .with_context(|| format!("failed to parse config {}", path.display()))?,
            None => TrackerConfig::default(),
        };
        let tables = match names {
            Some(path) => ValidityTables::from_json(&read_text(path)?)
                .with_context(|| format!("failed to parse name tables {}", path.display()))?,
            None => ValidityTables::load_bundled().context("bundled name tables are invalid")?,
        };
        Ok(Self {
            charsets,
            tables,
            config,
        })
    }
}

/// Font index + sprite directory -> character sets for every context.
pub fn load_charsets(font_index: &Path, sprites: &Path) -> Result<Charsets> {
    let index = FontIndex::from_json(&read_text(font_index)?)
        .with_context(|| format!("failed to parse font index {}", font_index.display()))?;
    let font_map = FontMap::from_index(&index)
        .with_context(|| format!("invalid font index {}", font_index.display()))?;
    log::debug!("font index maps {} sprite files", font_map.len());
    let store = GlyphStore::load_dir(font_map, sprites)
        .with_context(|| format!("failed to load sprites from {}", sprites.display()))?;
    Charsets::build(&store).context("failed to build character sets")
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
