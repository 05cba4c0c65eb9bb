/*!
Ramer-Douglas-Peucker polyline simplification.

Endpoints are always kept. An interior point survives only if it lies more
than `epsilon` from the chord of the segment it was split from.
*/

use crate::error::{LaserError, Result};
use crate::geometry::Point2;
use crate::trace::Polyline;
use tracing::debug;

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// When `a == b` there is no line, so the distance to that shared point is
/// used instead.
pub fn chord_distance(p: Point2, a: Point2, b: Point2) -> Result<f64> {
    if a == b {
        return Ok(p.distance(a));
    }
    let normal = (a - b).reciprocal().normalized()?;
    Ok((p - a).dot(normal).abs())
}

/// Simplify one polyline.
///
/// The result starts and ends with the input's endpoints and contains only
/// input points, in input order.
pub fn simplify(points: &[Point2], epsilon: f64) -> Result<Polyline> {
    if epsilon.is_nan() || epsilon < 0.0 {
        return Err(LaserError::InvalidTolerance(epsilon));
    }
    if points.len() < 2 {
        return Err(LaserError::degenerate(format!(
            "cannot simplify a polyline of {} point(s)",
            points.len()
        )));
    }

    let last = points.len() - 1;
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    // Pending (first, last) segments; an explicit stack keeps long contours
    // off the call stack.
    let mut pending = vec![(0usize, last)];
    while let Some((first, last)) = pending.pop() {
        let mut max_dist = 0.0;
        let mut index = first;
        for i in first + 1..last {
            let dist = chord_distance(points[i], points[first], points[last])?;
            if dist > max_dist {
                index = i;
                max_dist = dist;
            }
        }

        if max_dist > epsilon {
            kept[index] = true;
            pending.push((index, last));
            pending.push((first, index));
        }
    }

    Ok(points
        .iter()
        .zip(&kept)
        .filter(|&(_, keep)| *keep)
        .map(|(&p, _)| p)
        .collect())
}

/// Simplify every polyline with the same tolerance
pub fn simplify_all(paths: &[Polyline], epsilon: f64) -> Result<Vec<Polyline>> {
    let simplified = paths
        .iter()
        .map(|path| simplify(path, epsilon))
        .collect::<Result<Vec<_>>>()?;

    let before: usize = paths.iter().map(Vec::len).sum();
    let after: usize = simplified.iter().map(Vec::len).sum();
    debug!(
        "Simplified {} paths from {} to {} vertices (epsilon {})",
        paths.len(),
        before,
        after,
        epsilon
    );

    Ok(simplified)
}
