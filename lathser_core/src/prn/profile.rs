/*!
Device profiles and per-job settings.

The two supported Epilog variants differ in bed size, vendor initialization
sequences, frequency field width and trailer signature. Everything that
varies lives in [`DeviceProfile`]; [`JobSettings`] is the explicit
configuration value threaded into the encoder.
*/

use super::command::{
    self, Command, AUTOFOCUS, CENTER_ENGRAVE, COLOR_COMPONENT_ONE, FUSION_DATESTAMP,
    FUSION_MYSTERY_1, FUSION_MYSTERY_2, FUSION_MYSTERY_3, FUSION_MYSTERY_4, GLOBAL_AIR_ASSIST,
};
use crate::document::{Cut, CutParams, Document};
use crate::error::{LaserError, Result};
use crate::protocol::{DEFAULT_MAX_SPAN_POINTS, DEFAULT_RESOLUTION, MAX_POWER, MAX_SPEED, MIN_SPEED};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Supported laser cutter families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Fusion,
    Helix,
}

impl DeviceKind {
    pub fn profile(self) -> DeviceProfile {
        match self {
            DeviceKind::Fusion => DeviceProfile::FUSION,
            DeviceKind::Helix => DeviceProfile::HELIX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Fusion => "fusion",
            DeviceKind::Helix => "helix",
        }
    }
}

/// Where the vector layer's `ESC%1B IN; ... ESC%0B` framing goes.
///
/// Both conventions occur in driver output and neither has been validated
/// against every firmware, so this is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorFraming {
    /// One frame around all cuts
    PerDocument,
    /// One frame around each cut
    PerCut,
}

/// Fixed protocol facts for one device family
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub kind: DeviceKind,
    /// Zero-padded width of the `XR` frequency field
    pub frequency_digits: usize,
    pub frequency_range: RangeInclusive<u32>,
    /// Default bed size, inches
    pub bed_width_in: f64,
    pub bed_height_in: f64,
    /// Spaces written after the job footer
    pub trailer_padding: usize,
    pub trailer_signature: &'static [u8],
}

impl DeviceProfile {
    pub const FUSION: DeviceProfile = DeviceProfile {
        kind: DeviceKind::Fusion,
        frequency_digits: 2,
        frequency_range: 1..=99,
        bed_width_in: 32.0,
        bed_height_in: 20.0,
        trailer_padding: 4090,
        trailer_signature: b"FusionKYMC",
    };

    pub const HELIX: DeviceProfile = DeviceProfile {
        kind: DeviceKind::Helix,
        frequency_digits: 4,
        frequency_range: 1..=5000,
        bed_width_in: 24.0,
        bed_height_in: 18.0,
        trailer_padding: 4092,
        trailer_signature: b"Mini]\n",
    };

    /// Commands right after the PJL header
    pub fn preamble(&self, settings: &JobSettings) -> Vec<Command> {
        match self.kind {
            DeviceKind::Fusion => vec![
                COLOR_COMPONENT_ONE.with(1536),
                FUSION_MYSTERY_1,
                FUSION_DATESTAMP,
                FUSION_MYSTERY_2,
            ],
            DeviceKind::Helix => vec![
                AUTOFOCUS.with(settings.autofocus_value()),
                GLOBAL_AIR_ASSIST.with(i64::from(settings.air_assist)),
                CENTER_ENGRAVE.with(i64::from(settings.center_engrave)),
            ],
        }
    }

    /// Commands following the raster orientation
    pub fn after_orientation(&self) -> Vec<Command> {
        match self.kind {
            DeviceKind::Fusion => vec![FUSION_MYSTERY_3.with(0)],
            DeviceKind::Helix => Vec::new(),
        }
    }

    /// Commands following the global raster power and speed
    pub fn after_raster_speed(&self, settings: &JobSettings) -> Vec<Command> {
        match self.kind {
            DeviceKind::Fusion => vec![
                FUSION_MYSTERY_4.with(50),
                AUTOFOCUS.with(settings.autofocus_value()),
            ],
            DeviceKind::Helix => Vec::new(),
        }
    }

    /// `XR` frequency field, zero padded to the device's width
    pub fn format_frequency(&self, frequency: u32) -> String {
        format!("XR{:0width$}", frequency, width = self.frequency_digits)
    }

    /// The padding and signature closing every job file
    pub fn trailer(&self) -> Vec<u8> {
        let mut trailer = vec![b' '; self.trailer_padding];
        trailer.extend_from_slice(self.trailer_signature);
        trailer
    }
}

/// Device-facing configuration for one encode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub device: DeviceKind,

    /// Dots per inch; vector coordinates are in these units
    pub resolution: u32,

    /// Bed size override in inches; the device default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_width_in: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_height_in: Option<f64>,

    pub air_assist: bool,
    pub autofocus: bool,
    pub center_engrave: bool,

    pub vector_framing: VectorFraming,

    /// Maximum points per vector span
    pub max_span_points: usize,

    /// Split long cuts into overlapping spans; when off, long cuts are rejected
    pub chunk_spans: bool,

    /// Global raster power and speed, percent
    pub raster_power: u32,
    pub raster_speed: u32,
}

impl JobSettings {
    /// Defaults for the given device
    pub fn for_device(device: DeviceKind) -> Self {
        Self {
            device,
            resolution: DEFAULT_RESOLUTION,
            bed_width_in: None,
            bed_height_in: None,
            air_assist: true,
            autofocus: false,
            center_engrave: false,
            vector_framing: VectorFraming::PerDocument,
            max_span_points: DEFAULT_MAX_SPAN_POINTS,
            chunk_spans: true,
            raster_power: 50,
            raster_speed: 50,
        }
    }

    pub fn fusion() -> Self {
        Self::for_device(DeviceKind::Fusion)
    }

    pub fn helix() -> Self {
        Self::for_device(DeviceKind::Helix)
    }

    pub fn profile(&self) -> DeviceProfile {
        self.device.profile()
    }

    /// Bed size in device dots (width, height)
    pub fn bed_size_dots(&self) -> (i64, i64) {
        let profile = self.profile();
        let width = self.bed_width_in.unwrap_or(profile.bed_width_in);
        let height = self.bed_height_in.unwrap_or(profile.bed_height_in);
        let dpi = f64::from(self.resolution);
        ((width * dpi) as i64, (height * dpi) as i64)
    }

    /// The firmware reads -1 as "autofocus off"
    pub fn autofocus_value(&self) -> i64 {
        if self.autofocus {
            1
        } else {
            -1
        }
    }

    /// Check the settings and the document against device limits.
    ///
    /// Runs before any byte is written so a rejected job leaves the sink
    /// untouched.
    pub fn validate(&self, doc: &Document) -> Result<()> {
        let profile = self.profile();

        if self.resolution == 0 {
            return Err(LaserError::invalid_parameter("resolution must be positive"));
        }
        if self.max_span_points < 2 {
            return Err(LaserError::invalid_parameter(format!(
                "max_span_points must be at least 2, got {}",
                self.max_span_points
            )));
        }
        for (name, inches) in [("bed width", self.bed_width_in), ("bed height", self.bed_height_in)] {
            if let Some(inches) = inches {
                if !(inches.is_finite() && inches > 0.0) {
                    return Err(LaserError::invalid_parameter(format!("{} {} is not positive", name, inches)));
                }
            }
        }
        check_percent("raster power", self.raster_power, 0..=MAX_POWER)?;
        check_percent("raster speed", self.raster_speed, MIN_SPEED..=MAX_SPEED)?;

        if doc.title.chars().any(char::is_control) {
            return Err(LaserError::invalid_parameter(format!(
                "job title {:?} contains control characters",
                doc.title
            )));
        }

        for (index, cut) in doc.cuts.iter().enumerate() {
            self.validate_cut(&profile, index, cut)?;
        }

        for (index, raster) in doc.rasters.iter().enumerate() {
            if raster.image.is_empty() {
                return Err(LaserError::degenerate(format!("raster {} has an empty image", index)));
            }
            check_percent("raster block power", raster.power, 0..=MAX_POWER)?;
            check_percent("raster block speed", raster.speed, MIN_SPEED..=MAX_SPEED)?;
        }

        Ok(())
    }

    fn validate_cut(&self, profile: &DeviceProfile, index: usize, cut: &Cut) -> Result<()> {
        let CutParams {
            speed,
            power,
            frequency,
        } = cut.params;

        check_percent("power", power, 0..=MAX_POWER)?;
        check_percent("speed", speed, MIN_SPEED..=MAX_SPEED)?;
        if !profile.frequency_range.contains(&frequency) {
            return Err(LaserError::invalid_parameter(format!(
                "frequency {} outside {:?} for {}",
                frequency,
                profile.frequency_range,
                profile.kind.as_str()
            )));
        }

        if cut.len() < 2 {
            return Err(LaserError::degenerate(format!(
                "cut {} has {} point(s), at least 2 are needed",
                index,
                cut.len()
            )));
        }
        if !self.chunk_spans && cut.len() > self.max_span_points {
            return Err(LaserError::invalid_parameter(format!(
                "cut {} has {} points, more than the {} allowed without span chunking",
                index,
                cut.len(),
                self.max_span_points
            )));
        }
        if let Some(p) = cut.points.iter().find(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(LaserError::degenerate(format!(
                "cut {} has non-finite point ({}, {})",
                index, p.x, p.y
            )));
        }

        Ok(())
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self::fusion()
    }
}

fn check_percent(name: &str, value: u32, range: RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(LaserError::invalid_parameter(format!(
            "{} {} outside {:?}",
            name, value, range
        )))
    }
}

/// Fixed page-setup table, in stream order.
///
/// The device parses these as positional opcodes, so order is part of the
/// protocol.
pub fn page_setup(settings: &JobSettings) -> Vec<Command> {
    let profile = settings.profile();
    let dpi = i64::from(settings.resolution);
    let (bed_width, bed_height) = settings.bed_size_dots();

    let mut table = profile.preamble(settings);
    table.extend([
        command::OFFSET_X.with(0),
        command::OFFSET_Y.with(0),
        command::PRINT_RESOLUTION.with(dpi),
        command::POSITION_X.with(0),
        command::POSITION_Y.with(0),
        command::RASTER_RESOLUTION.with(dpi),
        // 0 = logical page, 3 = physical page
        command::RASTER_ORIENTATION.with(0),
    ]);
    table.extend(profile.after_orientation());
    table.extend([
        command::RASTER_POWER.with(i64::from(settings.raster_power)),
        command::RASTER_SPEED.with(i64::from(settings.raster_speed)),
    ]);
    table.extend(profile.after_raster_speed(settings));
    table.extend([
        command::RASTER_AIR_ASSIST.with(if settings.air_assist { 2 } else { 0 }),
        command::BED_HEIGHT.with(bed_height),
        command::BED_WIDTH.with(bed_width),
        command::RASTER_COMPRESSION.with(crate::protocol::RASTER_COMPRESSION_MODE),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;

    fn cut(params: CutParams, n: usize) -> Cut {
        Cut::with_points(
            params,
            (0..n).map(|i| Point2::new(i as f64, i as f64)).collect(),
        )
    }

    #[test]
    fn test_frequency_field_width() {
        assert_eq!(DeviceProfile::FUSION.format_frequency(50), "XR50");
        assert_eq!(DeviceProfile::FUSION.format_frequency(5), "XR05");
        assert_eq!(DeviceProfile::HELIX.format_frequency(50), "XR0050");
    }

    #[test]
    fn test_bed_size() {
        assert_eq!(JobSettings::fusion().bed_size_dots(), (19200, 12000));
        assert_eq!(JobSettings::helix().bed_size_dots(), (14400, 10800));

        let mut settings = JobSettings::fusion();
        settings.resolution = 1200;
        settings.bed_width_in = Some(12.0);
        assert_eq!(settings.bed_size_dots(), (14400, 24000));
    }

    #[test]
    fn test_helix_preamble_follows_settings() {
        let mut settings = JobSettings::helix();
        settings.air_assist = false;
        settings.center_engrave = true;
        let bytes: Vec<u8> = settings
            .profile()
            .preamble(&settings)
            .iter()
            .flat_map(|c| c.to_bytes())
            .collect();
        assert_eq!(bytes, b"\x1B&y-1A\x1B&y0C\x1B&y1Z");
    }

    #[test]
    fn test_page_setup_order() {
        let table = page_setup(&JobSettings::helix());
        let bytes: Vec<u8> = table.iter().flat_map(|c| c.to_bytes()).collect();
        let expected: &[u8] = b"\x1B&y-1A\x1B&y1C\x1B&y0Z\
\x1B&l0U\x1B&l0Z\x1B&u600D\x1B*p0X\x1B*p0Y\x1B*t600R\x1B*r0F\
\x1B&y50P\x1B&z50S\
\x1B&z2A\x1B*r10800T\x1B*r14400S\x1B*b2M";
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_validate_parameter_ranges() {
        let settings = JobSettings::fusion();

        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::new(4, 100, 50), 3));
        assert!(settings.validate(&doc).is_ok());

        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::new(4, 101, 50), 3));
        assert!(matches!(settings.validate(&doc), Err(LaserError::InvalidDeviceParameter(_))));

        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::new(0, 100, 50), 3));
        assert!(matches!(settings.validate(&doc), Err(LaserError::InvalidDeviceParameter(_))));

        // Four-digit frequency only fits the Helix field
        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::new(4, 100, 500), 3));
        assert!(settings.validate(&doc).is_err());
        assert!(JobSettings::helix().validate(&doc).is_ok());
    }

    #[test]
    fn test_validate_geometry_and_limits() {
        let mut settings = JobSettings::fusion();

        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::default(), 1));
        assert!(matches!(settings.validate(&doc), Err(LaserError::DegenerateGeometry(_))));

        let mut doc = Document::new("job");
        doc.add_cut(cut(CutParams::default(), 150));
        assert!(settings.validate(&doc).is_ok());
        settings.chunk_spans = false;
        assert!(matches!(settings.validate(&doc), Err(LaserError::InvalidDeviceParameter(_))));

        let doc = Document::new("two\r\nlines");
        assert!(JobSettings::fusion().validate(&doc).is_err());

        let mut settings = JobSettings::fusion();
        settings.max_span_points = 1;
        assert!(settings.validate(&Document::new("job")).is_err());
    }
}
