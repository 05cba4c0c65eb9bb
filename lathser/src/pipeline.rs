/*!
Image to job document pipeline.

Loads a silhouette image, traces and simplifies its outline, places it on
the bed and assembles the [`Document`] handed to the encoder.
*/

use crate::config::PipelineConfig;
use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use image::GrayImage;
use lathser_core::{
    simplify_all, trace_outlines, Bitmap, BoundingBox, Document, JobSettings, Polyline, Raster,
    Transform,
};
use std::path::Path;
use tracing::{debug, info};

/// Load an image file as 8-bit grayscale
pub fn load_gray(path: &Path, invert: bool) -> Result<GrayImage> {
    let mut gray = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .into_luma8();
    if invert {
        imageops::invert(&mut gray);
    }
    debug!("Loaded {}x{} image from {}", gray.width(), gray.height(), path.display());
    Ok(gray)
}

/// Convert a grayscale image into the core bitmap type
pub fn to_bitmap(gray: GrayImage) -> Result<Bitmap> {
    let (width, height) = gray.dimensions();
    Ok(Bitmap::new(width as usize, height as usize, gray.into_raw())?)
}

/// Trace the outline and simplify it, in source pixel coordinates
pub fn outline_paths(bitmap: &Bitmap, epsilon: f64) -> Result<Vec<Polyline>> {
    let raw = trace_outlines(bitmap)?;
    let simplified = simplify_all(&raw, epsilon)?;
    Ok(simplified)
}

/// Transform from source pixels to device dots at the configured position
pub fn placement(
    paths: &[Polyline],
    pipeline: &PipelineConfig,
    settings: &JobSettings,
) -> Result<Transform> {
    let dpi = f64::from(settings.resolution);
    let origin_x = pipeline.final_x_in * dpi;
    let origin_y = pipeline.final_y_in * dpi;

    let transform = match pipeline.fit_size_in {
        Some(size_in) => {
            let bbox = BoundingBox::from_points(paths.iter().flatten());
            let size = size_in * dpi;
            // Fit the outline into a size x size square whose corner is the origin
            Transform::make_map(&bbox, size, size)?.translated(origin_x, origin_y)
        }
        None => {
            if pipeline.pixels_per_inch <= 0.0 {
                bail!("pixels_per_inch must be positive, got {}", pipeline.pixels_per_inch);
            }
            Transform::new(dpi / pipeline.pixels_per_inch, origin_x, origin_y)
        }
    };

    debug!("Placement transform: {:?}", transform);
    Ok(transform)
}

/// Document with one cut per traced outline
pub fn cut_document(
    title: &str,
    bitmap: &Bitmap,
    pipeline: &PipelineConfig,
    settings: &JobSettings,
) -> Result<Document> {
    let paths = outline_paths(bitmap, pipeline.epsilon)?;
    let transform = placement(&paths, pipeline, settings)?;

    let mut doc = Document::new(title);
    doc.add_paths(&paths, &transform, pipeline.cut);
    info!("✂️ {} cut(s), {} point(s)", doc.cuts.len(), doc.point_count());
    Ok(doc)
}

/// Document with one raster block, resampled to the device resolution
pub fn engrave_document(
    title: &str,
    gray: &GrayImage,
    pipeline: &PipelineConfig,
    settings: &JobSettings,
) -> Result<Document> {
    if pipeline.pixels_per_inch <= 0.0 {
        bail!("pixels_per_inch must be positive, got {}", pipeline.pixels_per_inch);
    }
    let dpi = f64::from(settings.resolution);
    let factor = dpi / pipeline.pixels_per_inch;
    let width = (f64::from(gray.width()) * factor).round() as u32;
    let height = (f64::from(gray.height()) * factor).round() as u32;

    let resampled = if (width, height) == gray.dimensions() {
        gray.clone()
    } else {
        imageops::resize(gray, width, height, FilterType::Nearest)
    };

    let bitmap = to_bitmap(resampled)?;
    let x = (pipeline.final_x_in * dpi) as i64;
    let y = (pipeline.final_y_in * dpi) as i64;

    let mut doc = Document::new(title);
    doc.add_raster(Raster::new(
        bitmap,
        x,
        y,
        settings.raster_speed,
        settings.raster_power,
    ));
    info!("🖼️ Raster {}x{} at ({}, {})", width, height, x, y);
    Ok(doc)
}
