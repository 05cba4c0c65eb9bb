/*!
# Laser Job Core

Turns a rasterized silhouette into cuttable vector paths and serializes them,
with optional raster engraving, into the PRN byte stream understood by
Epilog laser cutters.

## Pipeline

raster → [`trace`] → raw polylines → [`simplify`] → simplified polylines →
[`Document`] (assembled by the caller) → [`prn`] → bytes

## Modules

- [`geometry`] - Vectors, transforms and bounding boxes
- [`bitmap`] - Grayscale bitmaps and the foreground classification
- [`trace`] - Contour tracing over pixel-boundary edges
- [`simplify`] - Ramer-Douglas-Peucker simplification
- [`document`] - Cuts, rasters and the job document
- [`prn`] - Device profiles, job settings and the PRN encoder
- [`export`] - Plain-text and JSON polyline output
- [`error`] - Common error types
*/

pub mod bitmap;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod prn;
pub mod simplify;
pub mod trace;

// Re-export commonly used types
pub use bitmap::{Bitmap, Silhouette};
pub use document::{Cut, CutParams, Document, Raster};
pub use error::{LaserError, Result};
pub use geometry::{BoundingBox, Point2, Transform, Vector2};
pub use prn::{encode, encode_to_vec, DeviceKind, DeviceProfile, JobSettings, VectorFraming};
pub use simplify::{simplify, simplify_all};
pub use trace::{trace_outlines, Polyline};

/// Version information for the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// Intensities above this are foreground, both for tracing and engraving
    pub const INTENSITY_THRESHOLD: u8 = 128;

    /// Default resolution in dots per inch (the Fusion driver default)
    pub const DEFAULT_RESOLUTION: u32 = 600;

    /// Maximum number of points in one vector span
    pub const DEFAULT_MAX_SPAN_POINTS: usize = 100;

    /// Longest literal run one count byte can describe
    pub const MAX_LITERAL_RUN: usize = 128;

    /// Packed raster rows are padded to a multiple of this many bytes
    pub const RASTER_ROW_ALIGNMENT: usize = 8;

    /// No-op count byte used to pad packed raster rows
    pub const RASTER_FILLER_BYTE: u8 = 0x80;

    /// Raster compression mode written in the page setup (TIFF packbits)
    pub const RASTER_COMPRESSION_MODE: i64 = 2;

    /// Maximum laser power, in percent
    pub const MAX_POWER: u32 = 100;

    /// Speed range, in percent
    pub const MIN_SPEED: u32 = 1;
    pub const MAX_SPEED: u32 = 100;
}
