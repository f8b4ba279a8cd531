//! Converting cached images to the embed format.

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};

use crate::error::Result;

/// Converts a source image into a JPEG at `dest`.
pub trait Convert {
    fn convert(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// In-process raster conversion using the `image` crate.
///
/// Only the first frame of animated sources is decoded. Transparent pixels
/// are composited onto a white background, since JPEG has no alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterConverter;

impl Convert for RasterConverter {
    fn convert(&self, source: &Path, dest: &Path) -> Result<()> {
        let decoded = ImageReader::open(source)?.with_guessed_format()?.decode()?;
        flatten_onto_white(&decoded).save_with_format(dest, ImageFormat::Jpeg)?;
        Ok(())
    }
}

/// Composite an image onto an opaque white background.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u32::from(pixel[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_transparent_becomes_white() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_half_transparent_blends() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        // 255 * 127 / 255
        assert_eq!(flat.get_pixel(0, 0), &Rgb([127, 127, 127]));
    }

    #[test]
    fn test_convert_png_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        let dest = dir.path().join("out.jpg");
        RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255]))
            .save(&source)
            .unwrap();

        RasterConverter.convert(&source, &dest).unwrap();

        let written = image::open(&dest).unwrap();
        assert_eq!((written.width(), written.height()), (4, 4));
        assert_eq!(image::ImageFormat::from_path(&dest).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_convert_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = RasterConverter.convert(&dir.path().join("nope.png"), &dir.path().join("x.jpg"));
        assert!(result.is_err());
    }
}
