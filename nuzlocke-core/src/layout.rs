//! Screen regions the tracker reads text from.
use image::{Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Pixel rectangle in native (downscaled) screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Copy this rectangle out of `frame`, clamped to the frame bounds.
    ///
    /// A rectangle entirely outside the frame yields an empty image.
    #[must_use]
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        if self.x >= frame.width() || self.y >= frame.height() {
            return RgbImage::new(0, 0);
        }
        let width = self.width.min(frame.width() - self.x);
        let height = self.height.min(frame.height() - self.y);
        image::imageops::crop_imm(frame, self.x, self.y, width, height).to_image()
    }
}

/// Species strips on one side of the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideLayout {
    pub single: Rect,
    pub double: [Rect; 2],
}

/// Which species strip to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeciesSlot {
    FoeSingle,
    FoeLeft,
    FoeRight,
    AllySingle,
    AllyLeft,
    AllyRight,
}

/// Where each logical text element sits on the game screen.
///
/// Defaults describe the 256x192 top screen; every region is a whole number
/// of text rows tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    #[serde(default = "ScreenLayout::default_location")]
    pub location: Rect,
    #[serde(default = "ScreenLayout::default_dialog")]
    pub dialog: Rect,
    #[serde(default = "ScreenLayout::default_foe")]
    pub foe: SideLayout,
    #[serde(default = "ScreenLayout::default_ally")]
    pub ally: SideLayout,
}

impl ScreenLayout {
    const fn default_location() -> Rect {
        Rect::new(8, 8, 128, 16)
    }

    const fn default_dialog() -> Rect {
        Rect::new(16, 152, 224, 32)
    }

    const fn default_foe() -> SideLayout {
        SideLayout {
            single: Rect::new(8, 24, 96, 16),
            double: [Rect::new(8, 16, 96, 16), Rect::new(8, 40, 96, 16)],
        }
    }

    const fn default_ally() -> SideLayout {
        SideLayout {
            single: Rect::new(144, 104, 96, 16),
            double: [Rect::new(144, 96, 96, 16), Rect::new(144, 120, 96, 16)],
        }
    }

    #[must_use]
    pub const fn species(&self, slot: SpeciesSlot) -> Rect {
        match slot {
            SpeciesSlot::FoeSingle => self.foe.single,
            SpeciesSlot::FoeLeft => self.foe.double[0],
            SpeciesSlot::FoeRight => self.foe.double[1],
            SpeciesSlot::AllySingle => self.ally.single,
            SpeciesSlot::AllyLeft => self.ally.double[0],
            SpeciesSlot::AllyRight => self.ally.double[1],
        }
    }
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            location: Self::default_location(),
            dialog: Self::default_dialog(),
            foe: Self::default_foe(),
            ally: Self::default_ally(),
        }
    }
}

/// Turn a raw capture into a native-resolution RGB frame.
///
/// Alpha is dropped and the image is shrunk by `scale` with
/// nearest-neighbour sampling so glyph pixels stay exact.
#[must_use]
pub fn frame_from_capture(capture: &RgbaImage, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let width = capture.width() / scale;
    let height = capture.height() / scale;
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = capture.get_pixel(x * scale, y * scale).0;
        Rgb([r, g, b])
    })
}
