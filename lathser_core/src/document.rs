/*!
In-memory model of one laser job: vector cuts and raster engravings.

A [`Document`] is assembled once by the caller and handed to the encoder,
which only reads it. Device-facing policy (resolution, bed size, air assist
and so on) is configuration and lives in [`crate::prn::JobSettings`].
*/

use crate::bitmap::Bitmap;
use crate::geometry::{Point2, Transform};
use crate::trace::Polyline;
use serde::{Deserialize, Serialize};

/// Laser parameters shared by every span of a cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutParams {
    /// Head speed, percent
    pub speed: u32,
    /// Laser power, percent
    pub power: u32,
    /// Pulse frequency, device units
    pub frequency: u32,
}

impl CutParams {
    pub fn new(speed: u32, power: u32, frequency: u32) -> Self {
        Self {
            speed,
            power,
            frequency,
        }
    }
}

impl Default for CutParams {
    fn default() -> Self {
        // Slow, full power cut used for through-cutting
        Self::new(4, 100, 50)
    }
}

/// One continuous vector cut, in device units
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub params: CutParams,
    pub points: Vec<Point2>,
}

impl Cut {
    pub fn with_points(params: CutParams, points: Vec<Point2>) -> Self {
        Self { params, points }
    }

    pub fn add_point(&mut self, p: Point2) {
        self.points.push(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Split the path into spans of at most `max_points` points.
    ///
    /// Consecutive spans share one point so no segment is lost at a span
    /// boundary. `max_points` below 2 is treated as 2.
    pub fn spans(&self, max_points: usize) -> Spans<'_> {
        Spans {
            rest: &self.points,
            max_points: max_points.max(2),
            done: false,
        }
    }

    /// Number of spans [`Cut::spans`] yields
    pub fn span_count(&self, max_points: usize) -> usize {
        self.spans(max_points).count()
    }
}

/// Iterator over the overlapping spans of a cut
#[derive(Debug, Clone)]
pub struct Spans<'a> {
    rest: &'a [Point2],
    max_points: usize,
    done: bool,
}

impl<'a> Iterator for Spans<'a> {
    type Item = &'a [Point2];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rest.is_empty() {
            return None;
        }

        let end = self.max_points.min(self.rest.len());
        let span = &self.rest[..end];
        if end == self.rest.len() {
            self.done = true;
        } else {
            // Overlap by one point
            self.rest = &self.rest[end - 1..];
        }
        Some(span)
    }
}

/// A raster block to engrave
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub image: Bitmap,
    /// Upper-left corner, device pixels
    pub x: i64,
    pub y: i64,
    /// Not encoded per block: the job carries one global raster speed/power
    pub speed: u32,
    pub power: u32,
}

impl Raster {
    pub fn new(image: Bitmap, x: i64, y: i64, speed: u32, power: u32) -> Self {
        Self {
            image,
            x,
            y,
            speed,
            power,
        }
    }
}

/// One job for the laser cutter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub title: String,
    pub cuts: Vec<Cut>,
    pub rasters: Vec<Raster>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            cuts: Vec::new(),
            rasters: Vec::new(),
        }
    }

    pub fn add_cut(&mut self, cut: Cut) {
        self.cuts.push(cut);
    }

    pub fn add_raster(&mut self, raster: Raster) {
        self.rasters.push(raster);
    }

    /// Add one cut per polyline, mapping points to device units
    pub fn add_paths(&mut self, paths: &[Polyline], transform: &Transform, params: CutParams) {
        for path in paths {
            let points = path.iter().map(|&p| transform.apply(p)).collect();
            self.cuts.push(Cut::with_points(params, points));
        }
    }

    /// Whether the job has a vector layer
    pub fn has_cuts(&self) -> bool {
        !self.cuts.is_empty()
    }

    /// Whether the job has a raster layer
    pub fn has_rasters(&self) -> bool {
        !self.rasters.is_empty()
    }

    /// Total number of vector points across all cuts
    pub fn point_count(&self) -> usize {
        self.cuts.iter().map(Cut::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_cut(n: usize) -> Cut {
        let points = (0..n).map(|i| Point2::new(i as f64, 0.0)).collect();
        Cut::with_points(CutParams::default(), points)
    }

    #[test]
    fn test_spans_overlap_by_one_point() {
        let cut = line_cut(250);
        let spans: Vec<_> = cut.spans(100).collect();

        let sizes: Vec<_> = spans.iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![100, 100, 52]);

        for pair in spans.windows(2) {
            assert_eq!(pair[0].last(), pair[1].first());
        }
        assert_eq!(spans[0].first(), cut.points.first());
        assert_eq!(spans[2].last(), cut.points.last());
    }

    #[test]
    fn test_span_at_exact_limit() {
        assert_eq!(line_cut(100).span_count(100), 1);
        assert_eq!(line_cut(101).span_count(100), 2);
        assert_eq!(line_cut(2).span_count(100), 1);
        assert_eq!(line_cut(0).span_count(100), 0);
    }

    #[test]
    fn test_add_point_extends_path() {
        let mut cut = Cut::with_points(CutParams::default(), Vec::new());
        assert!(cut.is_empty());
        cut.add_point(Point2::new(1.0, 2.0));
        cut.add_point(Point2::new(3.0, 4.0));
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.points[1], Point2::new(3.0, 4.0));
        assert_eq!(cut.span_count(100), 1);
    }

    #[test]
    fn test_tiny_span_limit_still_terminates() {
        let cut = line_cut(4);
        let spans: Vec<_> = cut.spans(0).collect();
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn test_add_paths_maps_to_device_units() {
        let mut doc = Document::new("Untitled-1");
        assert!(!doc.has_cuts());
        assert!(!doc.has_rasters());

        let paths = vec![
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)],
            vec![Point2::new(2.0, 0.0), Point2::new(2.0, 3.0), Point2::new(0.0, 3.0)],
        ];
        let transform = Transform::new(600.0, 100.0, 200.0);
        doc.add_paths(&paths, &transform, CutParams::new(4, 100, 50));

        assert!(doc.has_cuts());
        assert_eq!(doc.cuts.len(), 2);
        assert_eq!(doc.point_count(), 5);
        assert_eq!(doc.cuts[0].points[1], Point2::new(700.0, 800.0));
        assert_eq!(doc.cuts[1].params.speed, 4);
    }
}
