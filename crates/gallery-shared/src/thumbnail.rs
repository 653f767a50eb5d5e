use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::constants::THUMBNAIL_DIVISOR;
use crate::error::ThumbnailError;

/// Thumbnail size for an original of `width` x `height`: a tenth of each
/// side, rounded down, never smaller than one pixel.
pub fn thumbnail_dimensions(width: u32, height: u32) -> (u32, u32) {
    (
        (width / THUMBNAIL_DIVISOR).max(1),
        (height / THUMBNAIL_DIVISOR).max(1),
    )
}

/// Decode the image at `source` and write its JPEG thumbnail to `dest`.
///
/// The source format is sniffed from the file contents, so uploads with a
/// missing or misleading extension still decode. Returns the thumbnail
/// dimensions.
pub fn write_thumbnail(source: &Path, dest: &Path) -> Result<(u32, u32), ThumbnailError> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let thumb = make_thumbnail(&img);
    let dims = (thumb.width(), thumb.height());

    thumb.save_with_format(dest, ImageFormat::Jpeg)?;
    Ok(dims)
}

// JPEG has no alpha channel, so everything is flattened to RGB8.
fn make_thumbnail(img: &DynamicImage) -> DynamicImage {
    let (width, height) = thumbnail_dimensions(img.width(), img.height());
    let resized = img.resize_exact(width, height, FilterType::Triangle);
    DynamicImage::ImageRgb8(resized.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn write_png(path: &Path, width: u32, height: u32) {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, _| Rgba([(x % 255) as u8, 0, 0, 128]));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn test_dimensions_are_a_tenth() {
        assert_eq!(thumbnail_dimensions(1000, 500), (100, 50));
        assert_eq!(thumbnail_dimensions(1999, 209), (199, 20));
    }

    #[test]
    fn test_dimensions_never_zero() {
        assert_eq!(thumbnail_dimensions(5, 9), (1, 1));
        assert_eq!(thumbnail_dimensions(0, 0), (1, 1));
    }

    #[test]
    fn test_write_thumbnail_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("original.png");
        let dest = dir.path().join("thumbnail.jpg");
        write_png(&source, 120, 45);

        let dims = write_thumbnail(&source, &dest).unwrap();
        assert_eq!(dims, (12, 4));

        let thumb = image::open(&dest).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (12, 4));
    }

    #[test]
    fn test_extensionless_source_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("upload");
        let dest = dir.path().join("thumbnail.jpg");
        write_png(&dir.path().join("tmp.png"), 30, 30);
        std::fs::rename(dir.path().join("tmp.png"), &source).unwrap();

        assert_eq!(write_thumbnail(&source, &dest).unwrap(), (3, 3));
    }

    #[test]
    fn test_non_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"definitely not an image").unwrap();

        let result = write_thumbnail(&source, &dir.path().join("thumbnail.jpg"));
        assert!(result.is_err());
    }
}
