//! Post-processing for downloaded logos.

use crate::domain::model::{DominantColor, LogoFormat, LogoResult};
use crate::utils::error::{LogoError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::collections::HashMap;
use std::io::Cursor;

/// Longest side SVGs are rasterized to.
pub const SVG_RASTER_SIZE: u32 = 512;
pub const ENHANCED_MAX_SIZE: u32 = 512;
const BACKGROUND_THRESHOLD: i16 = 30;
const CONTRAST_FACTOR: f32 = 1.5;
const JPEG_QUALITY: u8 = 95;
const ICO_MAX_SIZE: u32 = 256;
const COLOR_SAMPLE_SIZE: u32 = 100;
pub const MIN_DIMENSION: u32 = 10;
pub const MAX_DIMENSION: u32 = 2000;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode a result into a raster, rasterizing SVGs.
    pub fn decode(result: &LogoResult) -> Result<DynamicImage> {
        if !result.has_image() {
            return Err(LogoError::processing(format!(
                "No image data for {} ({})",
                result.company_name, result.source
            )));
        }
        Self::decode_bytes(&result.image_data, Some(result.format))
    }

    pub fn decode_bytes(data: &[u8], hint: Option<LogoFormat>) -> Result<DynamicImage> {
        let format = LogoFormat::from_bytes(data).or(hint);
        if format == Some(LogoFormat::Svg) {
            let rgba = Self::rasterize_svg(data, SVG_RASTER_SIZE)?;
            return Ok(DynamicImage::ImageRgba8(rgba));
        }
        Ok(image::load_from_memory(data)?)
    }

    /// Render an SVG so that its longest side is `max_side` pixels.
    pub fn rasterize_svg(data: &[u8], max_side: u32) -> Result<RgbaImage> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|e| {
            LogoError::SvgError {
                message: e.to_string(),
            }
        })?;

        let size = tree.size();
        let scale = max_side as f32 / size.width().max(size.height());
        let width = ((size.width() * scale).round() as u32).max(1);
        let height = ((size.height() * scale).round() as u32).max(1);

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| LogoError::SvgError {
            message: format!("Cannot allocate {}x{} canvas", width, height),
        })?;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        // tiny-skia stores premultiplied alpha
        let mut rgba = RgbaImage::new(width, height);
        for (pixel, out) in pixmap.pixels().iter().zip(rgba.pixels_mut()) {
            let c = pixel.demultiply();
            *out = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(rgba)
    }

    /// Replace the image data of `result` with `image` encoded as PNG.
    pub fn update_result(result: &mut LogoResult, image: &DynamicImage) -> Result<()> {
        result.image_data = Self::convert(image, LogoFormat::Png)?;
        result.format = LogoFormat::Png;
        result.width = Some(image.width());
        result.height = Some(image.height());
        Ok(())
    }

    /// Fill in missing width/height from the image data. Leaves the result
    /// untouched if the data cannot be decoded.
    pub fn measure(result: &mut LogoResult) {
        if result.width.is_some() && result.height.is_some() {
            return;
        }
        match Self::decode(result) {
            Ok(image) => {
                result.width = Some(image.width());
                result.height = Some(image.height());
            }
            Err(e) => tracing::debug!("Cannot measure {} logo: {}", result.source, e),
        }
    }

    /// Make the background transparent.
    ///
    /// The background colour is the most frequent of the four corner pixels;
    /// every pixel within the per-channel threshold of it is cleared. Images
    /// with a transparent corner come back unchanged.
    pub fn remove_background(image: &DynamicImage) -> DynamicImage {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }

        let corners = [
            *rgba.get_pixel(0, 0),
            *rgba.get_pixel(width - 1, 0),
            *rgba.get_pixel(0, height - 1),
            *rgba.get_pixel(width - 1, height - 1),
        ];
        if corners.iter().any(|corner| corner[3] == 0) {
            return DynamicImage::ImageRgba8(rgba);
        }
        let background = corners
            .iter()
            .max_by_key(|candidate| corners.iter().filter(|c| c == candidate).count())
            .copied()
            .unwrap_or(corners[0]);

        let close = |a: u8, b: u8| (a as i16 - b as i16).abs() < BACKGROUND_THRESHOLD;
        let output = RgbaImage::from_fn(width, height, |x, y| {
            let pixel = rgba.get_pixel(x, y);
            if close(pixel[0], background[0])
                && close(pixel[1], background[1])
                && close(pixel[2], background[2])
            {
                Rgba([0, 0, 0, 0])
            } else {
                *pixel
            }
        });

        DynamicImage::ImageRgba8(output)
    }

    /// Boost contrast, sharpen and shrink to fit 512x512.
    pub fn enhance(image: &DynamicImage) -> DynamicImage {
        let contrasted = Self::adjust_contrast(&image.to_rgba8(), CONTRAST_FACTOR);
        let sharpened = DynamicImage::ImageRgba8(contrasted).unsharpen(1.0, 2);
        Self::fit_within(&sharpened, ENHANCED_MAX_SIZE, ENHANCED_MAX_SIZE)
    }

    /// Scale each channel's distance from the mean grey level by `factor`.
    fn adjust_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
        let pixel_count = (image.width() as u64 * image.height() as u64).max(1);
        let luminance_sum: f64 = image
            .pixels()
            .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
            .sum();
        let mean = (luminance_sum / pixel_count as f64) as f32;

        let adjust = |v: u8| (mean + factor * (v as f32 - mean)).round().clamp(0.0, 255.0) as u8;
        let mut output = image.clone();
        for pixel in output.pixels_mut() {
            pixel[0] = adjust(pixel[0]);
            pixel[1] = adjust(pixel[1]);
            pixel[2] = adjust(pixel[2]);
        }
        output
    }

    /// Shrink to fit inside `max_width` x `max_height`, keeping aspect ratio.
    /// Never upscales.
    pub fn fit_within(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        let (width, height) = image.dimensions();
        if width <= max_width && height <= max_height {
            return image.clone();
        }
        image.resize(max_width, max_height, FilterType::Lanczos3)
    }

    pub fn resize(
        image: &DynamicImage,
        width: u32,
        height: u32,
        maintain_aspect_ratio: bool,
    ) -> Result<DynamicImage> {
        for (field, value) in [("width", width), ("height", height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(LogoError::validation(format!(
                    "{} must be between {} and {}, got {}",
                    field, MIN_DIMENSION, MAX_DIMENSION, value
                )));
            }
        }

        if maintain_aspect_ratio {
            Ok(Self::fit_within(image, width, height))
        } else {
            Ok(image.resize_exact(width, height, FilterType::Lanczos3))
        }
    }

    /// Encode into `format`. SVG is not a raster target and is rejected.
    pub fn convert(image: &DynamicImage, format: LogoFormat) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            LogoFormat::Png => {
                image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
            }
            LogoFormat::Jpg => {
                let flattened = Self::flatten_onto_white(&image.to_rgba8());
                let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
                flattened.write_with_encoder(encoder)?;
            }
            LogoFormat::Webp => {
                let encoder = WebPEncoder::new_lossless(&mut buffer);
                image.to_rgba8().write_with_encoder(encoder)?;
            }
            LogoFormat::Ico => {
                let icon = Self::fit_within(image, ICO_MAX_SIZE, ICO_MAX_SIZE);
                DynamicImage::ImageRgba8(icon.to_rgba8())
                    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Ico)?;
            }
            LogoFormat::Svg => {
                return Err(LogoError::processing("Unsupported format: svg"));
            }
        }
        Ok(buffer)
    }

    fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
        RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let p = image.get_pixel(x, y);
            let alpha = p[3] as f32 / 255.0;
            let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
            Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
        })
    }

    /// Most frequent opaque colours, most common first.
    pub fn dominant_colors(image: &DynamicImage, num_colors: usize) -> Vec<DominantColor> {
        let (width, height) = image.dimensions();
        let sample = if width > COLOR_SAMPLE_SIZE || height > COLOR_SAMPLE_SIZE {
            image.resize(COLOR_SAMPLE_SIZE, COLOR_SAMPLE_SIZE, FilterType::Nearest)
        } else {
            image.clone()
        };

        let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
        for pixel in sample.to_rgba8().pixels() {
            if pixel[3] == 0 {
                continue;
            }
            *counts.entry([pixel[0], pixel[1], pixel[2]]).or_default() += 1;
        }

        let mut sorted: Vec<([u8; 3], usize)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        sorted
            .into_iter()
            .take(num_colors)
            .map(|([r, g, b], count)| DominantColor {
                hex: format!("#{:02x}{:02x}{:02x}", r, g, b),
                count,
            })
            .collect()
    }
}
