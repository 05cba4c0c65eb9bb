/*!
Epilog PRN job encoding.

A PRN job is a PJL envelope around a PCL page setup, an optional PCL raster
layer and an optional HP-GL vector layer, followed by a device-specific
trailer. Output is a pure function of the document and the settings.

## Modules

- [`command`] - Opcode templates and fixed byte sequences
- [`profile`] - Device profiles, job settings and validation
- [`packbits`] - Raster row packing
- [`encoder`] - The streaming job writer
*/

pub mod command;
pub mod encoder;
pub mod packbits;
pub mod profile;

pub use encoder::PrnWriter;
pub use profile::{page_setup, DeviceKind, DeviceProfile, JobSettings, VectorFraming};

use crate::document::Document;
use crate::error::Result;
use std::io::Write;
use tracing::info;

/// Encode `doc` into `sink`, returning the number of bytes written.
///
/// Settings and document are validated first; on a validation error nothing
/// is written.
pub fn encode<W: Write>(doc: &Document, settings: &JobSettings, sink: W) -> Result<usize> {
    settings.validate(doc)?;

    let mut writer = PrnWriter::new(sink, settings);
    writer.write_job(doc)?;

    info!(
        "📦 Encoded {} job '{}': {} cut(s), {} raster(s), {} bytes",
        settings.device.as_str(),
        doc.title,
        doc.cuts.len(),
        doc.rasters.len(),
        writer.bytes_written()
    );
    Ok(writer.bytes_written())
}

/// Encode into a fresh buffer
pub fn encode_to_vec(doc: &Document, settings: &JobSettings) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode(doc, settings, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::document::{Cut, CutParams, Raster};
    use crate::error::LaserError;
    use crate::geometry::Point2;
    use std::io;

    fn pt(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn fusion_empty_job() -> Vec<u8> {
        let mut expected = Vec::new();
        expected.extend_from_slice(b"\x1B%-12345X@PJL JOB NAME=Untitled-1\r\n\x1BE@PJL ENTER LANGUAGE=PCL \r\n");
        expected.extend_from_slice(b"\x1B*v1536A\x1B&y130001300003220S\x1B&y20150311204531D");
        expected.extend_from_slice(b"\x1B&y0V\x1B&y0L\x1B&y0T\x1B&y0C\x1B&y0Z");
        expected.extend_from_slice(b"\x1B&l0U\x1B&l0Z\x1B&u600D\x1B*p0X\x1B*p0Y\x1B*t600R\x1B*r0F");
        expected.extend_from_slice(b"\x1B&z0C\x1B&y50P\x1B&z50S\x1B&y50R\x1B&y-1A");
        expected.extend_from_slice(b"\x1B&z2A\x1B*r12000T\x1B*r19200S\x1B*b2M");
        expected.extend_from_slice(b"\x1B%1BPU\x1BE\x1B%-12345X@PJL EOJ \r\n");
        expected.extend(std::iter::repeat_n(b' ', 4090));
        expected.extend_from_slice(b"FusionKYMC");
        expected
    }

    #[test]
    fn test_empty_fusion_job_is_exact() {
        let doc = Document::new("Untitled-1");
        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert_eq!(bytes, fusion_empty_job());
    }

    #[test]
    fn test_empty_job_length_is_constant() {
        let doc = Document::new("Untitled-1");
        let baseline = encode_to_vec(&doc, &JobSettings::fusion()).unwrap().len();

        let mut settings = JobSettings::fusion();
        settings.air_assist = false;
        settings.vector_framing = VectorFraming::PerCut;
        assert_eq!(encode_to_vec(&doc, &settings).unwrap().len(), baseline);
    }

    #[test]
    fn test_helix_trailer() {
        let doc = Document::new("Untitled-1");
        let bytes = encode_to_vec(&doc, &JobSettings::helix()).unwrap();
        assert!(bytes.ends_with(b"Mini]\n"));
        assert_eq!(&bytes[bytes.len() - 4098..bytes.len() - 6], &[b' '; 4092][..]);
        assert!(find(&bytes, b"\x1B*v1536A").is_none());
        assert!(find(&bytes, b"\x1B&y-1A\x1B&y1C\x1B&y0Z").is_some());
    }

    #[test]
    fn test_single_cut_span_bytes() {
        let mut doc = Document::new("Untitled-1");
        doc.add_cut(Cut::with_points(
            CutParams::new(4, 100, 50),
            vec![pt(1200.0, 1300.0), pt(1400.0, 1500.0)],
        ));

        let fusion = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        let span: &[u8] =
            b"\x1B%1BIN;YP100;ZS004;XR50;XS0;XP1;LTPU1200,1300;PD1400,1500;\x1B%0B";
        let at = find(&fusion, span).expect("vector layer present");
        // Vector layer follows the page setup and precedes the footer
        assert!(at > find(&fusion, b"\x1B*b2M").unwrap());
        assert!(at < find(&fusion, b"\x1B%1BPU\x1BE").unwrap());

        let helix = encode_to_vec(&doc, &JobSettings::helix()).unwrap();
        assert!(find(&helix, b"YP100;ZS004;XR0050;XS0;XP1;").is_some());
    }

    #[test]
    fn test_coordinates_truncate() {
        let mut doc = Document::new("t");
        doc.add_cut(Cut::with_points(
            CutParams::default(),
            vec![pt(10.9, 20.2), pt(-3.7, 5.5), pt(7.0, 8.999)],
        ));
        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert!(find(&bytes, b"LTPU10,20;PD-3,5,7,8;").is_some());
    }

    #[test]
    fn test_long_cut_is_chunked() {
        let points = (0..250).map(|i| pt(i as f64, 0.0)).collect();
        let mut doc = Document::new("t");
        doc.add_cut(Cut::with_points(CutParams::default(), points));

        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert_eq!(count(&bytes, b"LTPU"), 3);
        // Each span restarts at the previous span's last point
        assert!(find(&bytes, b"LTPU99,0;").is_some());
        assert!(find(&bytes, b"LTPU198,0;").is_some());
        assert!(bytes.windows(7).any(|w| w == b",249,0;"));
    }

    #[test]
    fn test_vector_framing() {
        let mut doc = Document::new("t");
        for i in 0..3 {
            let x = i as f64 * 100.0;
            doc.add_cut(Cut::with_points(CutParams::default(), vec![pt(x, 0.0), pt(x, 50.0)]));
        }

        let per_doc = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert_eq!(count(&per_doc, b"\x1B%1BIN;"), 1);
        assert_eq!(count(&per_doc, b"\x1B%0B"), 1);

        let mut settings = JobSettings::fusion();
        settings.vector_framing = VectorFraming::PerCut;
        let per_cut = encode_to_vec(&doc, &settings).unwrap();
        assert_eq!(count(&per_cut, b"\x1B%1BIN;"), 3);
        assert_eq!(count(&per_cut, b"\x1B%0B"), 3);
    }

    #[test]
    fn test_raster_block_bytes() {
        let image = Bitmap::from_fn(10, 2, |x, y| if y == 0 && (x == 0 || x == 9) { 255 } else { 0 });
        let mut doc = Document::new("t");
        doc.add_raster(Raster::new(image, 100, 200, 50, 50));

        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();

        let mut block = Vec::new();
        block.extend_from_slice(b"\x1B&y0O\x1B*r1A");
        block.extend_from_slice(b"\x1B*p200Y\x1B*p100X\x1B*b2A\x1B*b8W");
        block.extend_from_slice(&[1, 0x80, 0x40, 0x80, 0x80, 0x80, 0x80, 0x80]);
        block.extend_from_slice(b"\x1B*p201Y\x1B*p100X\x1B*b-2A\x1B*b8W");
        block.extend_from_slice(&[1, 0x00, 0x00, 0x80, 0x80, 0x80, 0x80, 0x80]);
        block.extend_from_slice(b"\x1B*rC");

        let at = find(&bytes, &block).expect("raster block present");
        assert!(at > find(&bytes, b"\x1B*b2M").unwrap());
    }

    #[test]
    fn test_raster_block_values_not_encoded() {
        let image = Bitmap::from_fn(8, 2, |_, _| 255);
        let mut doc = Document::new("t");
        doc.add_raster(Raster::new(image, 0, 0, 20, 10));

        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        // Only the global raster power/speed from the settings is written
        assert_eq!(count(&bytes, b"\x1B&y50P\x1B&z50S"), 1);
        assert!(find(&bytes, b"\x1B&y10P").is_none());
        assert!(find(&bytes, b"\x1B&z20S").is_none());
    }

    #[test]
    fn test_raster_precedes_vector() {
        let mut doc = Document::new("t");
        doc.add_cut(Cut::with_points(CutParams::default(), vec![pt(0.0, 0.0), pt(1.0, 1.0)]));
        doc.add_raster(Raster::new(Bitmap::from_fn(4, 4, |_, _| 255), 0, 0, 50, 50));

        let bytes = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert!(find(&bytes, b"\x1B*rC").unwrap() < find(&bytes, b"\x1B%1BIN;").unwrap());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut doc = Document::new("repeat");
        doc.add_cut(Cut::with_points(
            CutParams::new(10, 80, 20),
            vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)],
        ));
        doc.add_raster(Raster::new(Bitmap::from_fn(9, 3, |x, y| if (x + y) % 2 == 0 { 255 } else { 0 }), 5, 5, 50, 50));

        let settings = JobSettings::helix();
        assert_eq!(
            encode_to_vec(&doc, &settings).unwrap(),
            encode_to_vec(&doc, &settings).unwrap()
        );
    }

    #[test]
    fn test_invalid_job_writes_nothing() {
        let mut doc = Document::new("t");
        doc.add_cut(Cut::with_points(CutParams::new(4, 150, 50), vec![pt(0.0, 0.0), pt(1.0, 1.0)]));

        let mut sink = Vec::new();
        let result = encode(&doc, &JobSettings::fusion(), &mut sink);
        assert!(matches!(result, Err(LaserError::InvalidDeviceParameter(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_empty_raster_rejected() {
        let mut doc = Document::new("t");
        doc.add_raster(Raster::new(Bitmap::blank(0, 0), 0, 0, 50, 50));
        assert!(matches!(
            encode_to_vec(&doc, &JobSettings::fusion()),
            Err(LaserError::DegenerateGeometry(_))
        ));
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_reported() {
        let doc = Document::new("t");
        let result = encode(&doc, &JobSettings::fusion(), BrokenSink);
        assert!(matches!(result, Err(LaserError::SinkWriteFailed(_))));
    }

    #[test]
    fn test_byte_count_matches_output() {
        let mut doc = Document::new("count");
        doc.add_cut(Cut::with_points(CutParams::default(), vec![pt(0.0, 0.0), pt(5.0, 5.0)]));
        let mut sink = Vec::new();
        let n = encode(&doc, &JobSettings::fusion(), &mut sink).unwrap();
        assert_eq!(n, sink.len());
    }
}
