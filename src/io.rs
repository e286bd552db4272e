// ============================================================================
// IMAGE IO — decoding, display re-encoding, file dialogs
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use rfd::FileDialog;

/// Default JPEG quality for previews and saved files.
pub const JPEG_QUALITY: u8 = 90;

/// The format the edited image is re-encoded in for display and export.
/// JPEG display is lossy on purpose: the preview shows exactly what the
/// encoded bytes would look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayFormat {
    Jpeg,
    Png,
}

impl DisplayFormat {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayFormat::Jpeg => "JPEG",
            DisplayFormat::Png => "PNG",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DisplayFormat::Jpeg => "jpg",
            DisplayFormat::Png => "png",
        }
    }

    /// Infer from a file extension; `None` for anything unrecognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(DisplayFormat::Jpeg),
            "png" => Some(DisplayFormat::Png),
            _ => None,
        }
    }
}

/// Read and decode an image file. Returns the pixels and the raw file bytes
/// (the bytes feed the session signature).
pub fn load_image(path: &Path) -> Result<(RgbaImage, Vec<u8>), String> {
    let bytes =
        fs::read(path).map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| format!("could not decode '{}': {}", path.display(), e))?
        .into_rgba8();
    Ok((img, bytes))
}

/// Encode to in-memory bytes. JPEG drops alpha (flattened against nothing —
/// channels pass through).
pub fn encode_image(
    image: &RgbaImage,
    format: DisplayFormat,
    quality: u8,
) -> Result<Vec<u8>, String> {
    let (w, h) = image.dimensions();
    let mut buf = Vec::new();
    match format {
        DisplayFormat::Png => {
            PngEncoder::new(&mut buf)
                .write_image(image.as_raw(), w, h, ColorType::Rgba8)
                .map_err(|e| format!("PNG encode failed: {}", e))?;
        }
        DisplayFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality)
                .write_image(rgb.as_raw(), w, h, ColorType::Rgb8)
                .map_err(|e| format!("JPEG encode failed: {}", e))?;
        }
    }
    Ok(buf)
}

/// Decode in-memory preview bytes back to pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|img| img.into_rgba8())
        .map_err(|e| format!("preview decode failed: {}", e))
}

/// Run the replay result through the display pipeline: encode in the chosen
/// format, decode again. The decoded image is what the view and the
/// histogram actually show.
pub fn render_preview(
    image: &RgbaImage,
    format: DisplayFormat,
    quality: u8,
) -> Result<RgbaImage, String> {
    let bytes = encode_image(image, format, quality)?;
    decode_image(&bytes)
}

/// Encode and write to disk.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: DisplayFormat,
    quality: u8,
) -> Result<(), String> {
    let bytes = encode_image(image, format, quality)?;
    fs::write(path, bytes).map_err(|e| format!("could not write '{}': {}", path.display(), e))
}

/// Gradient placeholder shown before any file is opened.
pub fn placeholder_image() -> RgbaImage {
    let (w, h) = (640u32, 480u32);
    RgbaImage::from_fn(w, h, |x, y| {
        let fx = x as f32 / (w - 1) as f32;
        let fy = y as f32 / (h - 1) as f32;
        Rgba([
            (40.0 + 180.0 * fx) as u8,
            (40.0 + 140.0 * fy) as u8,
            (200.0 - 120.0 * fx * fy) as u8,
            255,
        ])
    })
}

// ============================================================================
// File dialogs
// ============================================================================

pub fn pick_image_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp", "tiff", "tif"])
        .pick_file()
}

pub fn pick_save_image_file(format: DisplayFormat) -> Option<PathBuf> {
    FileDialog::new()
        .add_filter(format.label(), &[format.extension()])
        .set_file_name(&format!("edited.{}", format.extension()))
        .save_file()
}

pub fn pick_session_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Session", &["json"])
        .pick_file()
}

pub fn pick_save_session_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Session", &["json"])
        .set_file_name("session.json")
        .save_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_preview_is_lossless() {
        let img = placeholder_image();
        let preview = render_preview(&img, DisplayFormat::Png, JPEG_QUALITY).unwrap();
        assert_eq!(preview, img);
    }

    #[test]
    fn jpeg_preview_keeps_dimensions() {
        let img = placeholder_image();
        let preview = render_preview(&img, DisplayFormat::Jpeg, JPEG_QUALITY).unwrap();
        assert_eq!(preview.dimensions(), img.dimensions());
    }

    #[test]
    fn format_inference_from_extension() {
        assert_eq!(DisplayFormat::from_extension("JPG"), Some(DisplayFormat::Jpeg));
        assert_eq!(DisplayFormat::from_extension("jpeg"), Some(DisplayFormat::Jpeg));
        assert_eq!(DisplayFormat::from_extension("png"), Some(DisplayFormat::Png));
        assert_eq!(DisplayFormat::from_extension("webp"), None);
    }

    #[test]
    fn encode_and_write_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = placeholder_image();
        encode_and_write(&img, &path, DisplayFormat::Png, JPEG_QUALITY).unwrap();

        let (loaded, bytes) = load_image(&path).unwrap();
        assert_eq!(loaded, img);
        assert!(!bytes.is_empty());
    }
}
