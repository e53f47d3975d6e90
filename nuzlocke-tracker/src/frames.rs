use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

/// PNG captures in `dir`, in file name order.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read frames {}", dir.display()))?;
    let mut frames = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read frames {}", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

pub fn load_capture(path: &Path) -> Result<RgbaImage> {
    let decoded =
        image::open(path).with_context(|| format!("failed to decode frame {}", path.display()))?;
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_png_files_are_listed_in_order() {
        let dir = std::env::temp_dir().join(format!(
            "nuzlocke-frames-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        let blank = RgbaImage::new(4, 4);
        for name in ["0002.png", "0001.PNG", "0010.png"] {
            blank.save_with_format(dir.join(name), image::ImageFormat::Png).unwrap();
        }
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let frames = list_frames(&dir).unwrap();
        let names: Vec<_> = frames
            .iter()
            .filter_map(|path| path.file_name()?.to_str())
            .collect();
        assert_eq!(names, ["0001.PNG", "0002.png", "0010.png"]);
        assert_eq!(load_capture(&frames[0]).unwrap().dimensions(), (4, 4));
        let _ = fs::remove_dir_all(dir);
    }
}
