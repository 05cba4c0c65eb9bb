/*!
PRN job writer.

Emits, in order: PJL header, page setup, raster layer, vector layer, job
footer and device trailer. The writer only reads the document; the settings
must already have been validated against it.
*/

use super::command::{self, Command};
use super::packbits::{pack_literal, row_bits, row_stride};
use super::profile::{page_setup, DeviceProfile, JobSettings, VectorFraming};
use crate::document::{Cut, Document, Raster};
use crate::error::Result;
use crate::geometry::Point2;
use std::io::{self, Write};
use tracing::debug;

/// Write adapter that counts bytes passed through
struct CountingWriter<W> {
    inner: W,
    count: usize,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streams one job into a byte sink
pub struct PrnWriter<'a, W: Write> {
    out: CountingWriter<W>,
    settings: &'a JobSettings,
    profile: DeviceProfile,
}

impl<'a, W: Write> PrnWriter<'a, W> {
    pub fn new(sink: W, settings: &'a JobSettings) -> Self {
        Self {
            out: CountingWriter {
                inner: sink,
                count: 0,
            },
            settings,
            profile: settings.profile(),
        }
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.out.count
    }

    /// Write the complete job and flush the sink
    pub fn write_job(&mut self, doc: &Document) -> Result<()> {
        self.write_header(&doc.title)?;
        self.write_commands(&page_setup(self.settings))?;

        for raster in &doc.rasters {
            self.write_raster(raster)?;
        }

        if doc.has_cuts() {
            self.write_vector_layer(&doc.cuts)?;
        }

        self.write_footer()?;
        self.out.write_all(&self.profile.trailer())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_commands(&mut self, commands: &[Command]) -> Result<()> {
        for cmd in commands {
            cmd.write_to(&mut self.out)?;
        }
        Ok(())
    }

    fn write_header(&mut self, title: &str) -> Result<()> {
        self.out.write_all(command::PJL_HEADER_START)?;
        self.out.write_all(title.as_bytes())?;
        self.out.write_all(command::PJL_HEADER_END)?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        command::HPGL_START.write_to(&mut self.out)?;
        self.out.write_all(command::PEN_UP)?;
        self.write_commands(&[command::PCL_RESET, command::PJL_FOOTER])
    }

    /// One raster block. Rows alternate direction, starting left-to-right.
    fn write_raster(&mut self, raster: &Raster) -> Result<()> {
        let image = &raster.image;
        let stride = row_stride(image.width()) as i64;
        debug!(
            "Raster block {}x{} at ({}, {})",
            image.width(),
            image.height(),
            raster.x,
            raster.y
        );

        self.write_commands(&[command::RASTER_DIRECTION.with(0), command::RASTER_START])?;

        for row in 0..image.height() {
            let packed = pack_literal(&row_bits(image, row));
            let direction = if row % 2 == 0 { stride } else { -stride };

            self.write_commands(&[
                command::POSITION_Y.with(raster.y + row as i64),
                command::POSITION_X.with(raster.x),
                command::ROW_UNPACKED_BYTES.with(direction),
                command::ROW_PACKED_BYTES.with(packed.len() as i64),
            ])?;
            self.out.write_all(&packed)?;
        }

        self.write_commands(&[command::RASTER_END])
    }

    fn write_vector_layer(&mut self, cuts: &[Cut]) -> Result<()> {
        match self.settings.vector_framing {
            VectorFraming::PerDocument => {
                self.open_vector_frame()?;
                for cut in cuts {
                    self.write_cut(cut)?;
                }
                self.write_commands(&[command::HPGL_END])
            }
            VectorFraming::PerCut => {
                for cut in cuts {
                    self.open_vector_frame()?;
                    self.write_cut(cut)?;
                    self.write_commands(&[command::HPGL_END])?;
                }
                Ok(())
            }
        }
    }

    fn open_vector_frame(&mut self) -> Result<()> {
        command::HPGL_START.write_to(&mut self.out)?;
        self.out.write_all(command::VECTOR_INIT)?;
        self.out.write_all(command::SEP)?;
        Ok(())
    }

    fn write_cut(&mut self, cut: &Cut) -> Result<()> {
        let spans = cut.span_count(self.settings.max_span_points);
        debug!("Cut with {} points in {} span(s)", cut.len(), spans);

        for span in cut.spans(self.settings.max_span_points) {
            let (first, rest) = match span.split_first() {
                Some(split) => split,
                None => continue,
            };

            let params = &cut.params;
            write!(
                self.out,
                "YP{:03};ZS{:03};{};",
                params.power,
                params.speed,
                self.profile.format_frequency(params.frequency)
            )?;
            self.out.write_all(command::VECTOR_UNKNOWN_1)?;
            self.out.write_all(command::SEP)?;
            self.out.write_all(command::VECTOR_UNKNOWN_2)?;
            self.out.write_all(command::SEP)?;

            self.out.write_all(command::LINE_TYPE)?;
            self.out.write_all(command::PEN_UP)?;
            write_coordinate(&mut self.out, *first)?;
            self.out.write_all(command::SEP)?;

            self.out.write_all(command::PEN_DOWN)?;
            for (i, &p) in rest.iter().enumerate() {
                if i > 0 {
                    self.out.write_all(b",")?;
                }
                write_coordinate(&mut self.out, p)?;
            }
            self.out.write_all(command::SEP)?;
        }
        Ok(())
    }
}

/// Device coordinates are integers; fractions are truncated toward zero
fn write_coordinate<W: Write>(out: &mut W, p: Point2) -> io::Result<()> {
    write!(out, "{},{}", p.x as i64, p.y as i64)
}
