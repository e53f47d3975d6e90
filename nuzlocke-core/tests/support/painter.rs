#![allow(dead_code)]

use image::{Rgb, RgbImage};
use nuzlocke_core::{Charsets, Rect, ScreenLayout, TextContext, constants::ROW_HEIGHT};

/// Paints text into layout regions the way the game draws it.
pub struct FramePainter<'a> {
    charsets: &'a Charsets,
    layout: ScreenLayout,
    frame: RgbImage,
}

impl<'a> FramePainter<'a> {
    pub fn new(charsets: &'a Charsets) -> Self {
        Self {
            charsets,
            layout: ScreenLayout::default(),
            frame: RgbImage::new(256, 192),
        }
    }

    pub fn paint(mut self, rect: Rect, context: TextContext, lines: &[&str]) -> Self {
        let set = self.charsets.get(context);
        let background = Rgb(set.palette().background);
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.frame.put_pixel(x, y, background);
            }
        }
        for (row, line) in lines.iter().enumerate() {
            let rendered = set.render(line).unwrap();
            let width = rendered.width().min(rect.width);
            let clipped = image::imageops::crop_imm(&rendered, 0, 0, width, ROW_HEIGHT).to_image();
            let y = rect.y + ROW_HEIGHT * row as u32;
            image::imageops::replace(&mut self.frame, &clipped, i64::from(rect.x), i64::from(y));
        }
        self
    }

    pub fn location(self, name: &str) -> Self {
        let rect = self.layout.location;
        self.paint(rect, TextContext::Locations, &[name])
    }

    pub fn dialog(self, lines: &[&str]) -> Self {
        let rect = self.layout.dialog;
        self.paint(rect, TextContext::Dialog, lines)
    }

    pub fn foe(self, species: &str) -> Self {
        let rect = self.layout.foe.single;
        self.paint(rect, TextContext::Species, &[species])
    }

    pub fn foes(self, left: &str, right: &str) -> Self {
        let [left_rect, right_rect] = self.layout.foe.double;
        self.paint(left_rect, TextContext::Species, &[left])
            .paint(right_rect, TextContext::Species, &[right])
    }

    pub fn ally(self, species: &str) -> Self {
        let rect = self.layout.ally.single;
        self.paint(rect, TextContext::Species, &[species])
    }

    pub fn finish(self) -> RgbImage {
        self.frame
    }

    pub fn save(self, path: impl AsRef<std::path::Path>) {
        self.frame.save_with_format(path, image::ImageFormat::Png).unwrap();
    }
}
