/*!
Polyline export.

Text format: one polyline per line, points as `x,y` separated by single
spaces. JSON format: an array of polylines, each an array of `{x, y}`
objects.
*/

use crate::error::Result;
use crate::trace::Polyline;
use std::io::Write;

/// Write polylines in the plain-text format
pub fn write_polylines<W: Write>(paths: &[Polyline], mut out: W) -> Result<()> {
    for path in paths {
        for (i, p) in path.iter().enumerate() {
            if i > 0 {
                out.write_all(b" ")?;
            }
            write!(out, "{},{}", p.x, p.y)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Write polylines as pretty-printed JSON
pub fn write_polylines_json<W: Write>(paths: &[Polyline], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, paths)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
