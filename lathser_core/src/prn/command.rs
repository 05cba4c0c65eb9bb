/*!
PCL/PJL/HP-GL command vocabulary.

A parameterized PCL escape has the shape `ESC <family> <group> <value>
<terminator>`, e.g. `ESC & y 50 P`. An [`Opcode`] is the template without
the value; [`Opcode::with`] fills it in.
*/

use std::io::{self, Write};

pub const ESC: u8 = 0x1B;

/// Template of a parameterized PCL escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    family: u8,
    group: u8,
    terminator: u8,
}

impl Opcode {
    pub const fn new(family: u8, group: u8, terminator: u8) -> Self {
        Self {
            family,
            group,
            terminator,
        }
    }

    /// Bind a value to the template
    pub const fn with(self, value: i64) -> Command {
        Command::Pcl {
            opcode: self,
            value,
        }
    }
}

/// One command in the job stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Parameterized escape, e.g. `ESC&u600D`
    Pcl { opcode: Opcode, value: i64 },
    /// Fixed byte sequence
    Raw(&'static [u8]),
}

impl Command {
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        match *self {
            Command::Pcl { opcode, value } => {
                out.write_all(&[ESC, opcode.family, opcode.group])?;
                write!(out, "{}", value)?;
                out.write_all(&[opcode.terminator])
            }
            Command::Raw(bytes) => out.write_all(bytes),
        }
    }

    /// Rendered bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            Command::Pcl { opcode, value } => {
                let mut buf = vec![ESC, opcode.family, opcode.group];
                buf.extend_from_slice(value.to_string().as_bytes());
                buf.push(opcode.terminator);
                buf
            }
            Command::Raw(bytes) => bytes.to_vec(),
        }
    }
}

// PJL (job layer)

/// Universal exit, then the job name line. The title goes between the two.
pub const PJL_HEADER_START: &[u8] = b"\x1B%-12345X@PJL JOB NAME=";
/// Reset PCL and switch the interpreter to PCL
pub const PJL_HEADER_END: &[u8] = b"\r\n\x1BE@PJL ENTER LANGUAGE=PCL \r\n";
/// End of job, back to PJL
pub const PJL_FOOTER: Command = Command::Raw(b"\x1B%-12345X@PJL EOJ \r\n");

// PCL page setup

pub const COLOR_COMPONENT_ONE: Opcode = Opcode::new(b'*', b'v', b'A');
pub const AUTOFOCUS: Opcode = Opcode::new(b'&', b'y', b'A');
pub const GLOBAL_AIR_ASSIST: Opcode = Opcode::new(b'&', b'y', b'C');
pub const CENTER_ENGRAVE: Opcode = Opcode::new(b'&', b'y', b'Z');
/// Left (long-edge) offset registration
pub const OFFSET_X: Opcode = Opcode::new(b'&', b'l', b'U');
/// Top (short-edge) offset registration
pub const OFFSET_Y: Opcode = Opcode::new(b'&', b'l', b'Z');
pub const PRINT_RESOLUTION: Opcode = Opcode::new(b'&', b'u', b'D');
pub const RASTER_RESOLUTION: Opcode = Opcode::new(b'*', b't', b'R');
pub const POSITION_X: Opcode = Opcode::new(b'*', b'p', b'X');
pub const POSITION_Y: Opcode = Opcode::new(b'*', b'p', b'Y');
pub const RASTER_AIR_ASSIST: Opcode = Opcode::new(b'&', b'z', b'A');
pub const PCL_RESET: Command = Command::Raw(b"\x1BE");

// Vendor sequences seen in Fusion driver output; meaning unknown.
pub const FUSION_MYSTERY_1: Command = Command::Raw(b"\x1B&y130001300003220S");
/// Looks like a date stamp; fixed so output stays deterministic
pub const FUSION_DATESTAMP: Command = Command::Raw(b"\x1B&y20150311204531D");
pub const FUSION_MYSTERY_2: Command =
    Command::Raw(b"\x1B&y0V\x1B&y0L\x1B&y0T\x1B&y0C\x1B&y0Z");
pub const FUSION_MYSTERY_3: Opcode = Opcode::new(b'&', b'z', b'C');
pub const FUSION_MYSTERY_4: Opcode = Opcode::new(b'&', b'y', b'R');

// PCL raster

pub const RASTER_ORIENTATION: Opcode = Opcode::new(b'*', b'r', b'F');
pub const RASTER_POWER: Opcode = Opcode::new(b'&', b'y', b'P');
pub const RASTER_SPEED: Opcode = Opcode::new(b'&', b'z', b'S');
pub const BED_HEIGHT: Opcode = Opcode::new(b'*', b'r', b'T');
pub const BED_WIDTH: Opcode = Opcode::new(b'*', b'r', b'S');
/// 0 = unencoded, 1 = run length, 2 = TIFF
pub const RASTER_COMPRESSION: Opcode = Opcode::new(b'*', b'b', b'M');
/// 0 = top-down, 1 = bottom-up
pub const RASTER_DIRECTION: Opcode = Opcode::new(b'&', b'y', b'O');
pub const RASTER_START: Command = Opcode::new(b'*', b'r', b'A').with(1);
pub const RASTER_END: Command = Command::Raw(b"\x1B*rC");
/// Unpacked bytes in the row; negative means right-to-left
pub const ROW_UNPACKED_BYTES: Opcode = Opcode::new(b'*', b'b', b'A');
pub const ROW_PACKED_BYTES: Opcode = Opcode::new(b'*', b'b', b'W');

// HP-GL (vector layer)

pub const HPGL_START: Command = Command::Raw(b"\x1B%1B");
pub const HPGL_END: Command = Command::Raw(b"\x1B%0B");
pub const SEP: &[u8] = b";";
pub const VECTOR_INIT: &[u8] = b"IN";
pub const PEN_UP: &[u8] = b"PU";
pub const PEN_DOWN: &[u8] = b"PD";
/// The Windows driver emits LT without terminator right before PU
pub const LINE_TYPE: &[u8] = b"LT";
// Unknown; always emitted by the Windows driver
pub const VECTOR_UNKNOWN_1: &[u8] = b"XS0";
pub const VECTOR_UNKNOWN_2: &[u8] = b"XP1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterized_command_bytes() {
        assert_eq!(PRINT_RESOLUTION.with(600).to_bytes(), b"\x1B&u600D");
        assert_eq!(AUTOFOCUS.with(-1).to_bytes(), b"\x1B&y-1A");
        assert_eq!(RASTER_START.to_bytes(), b"\x1B*r1A");
        assert_eq!(ROW_UNPACKED_BYTES.with(-13).to_bytes(), b"\x1B*b-13A");
    }

    #[test]
    fn test_raw_command_bytes() {
        assert_eq!(PCL_RESET.to_bytes(), vec![0x1B, b'E']);
        assert_eq!(HPGL_START.to_bytes(), b"\x1B%1B");
    }

    #[test]
    fn test_to_bytes_matches_stream_output() {
        for cmd in [RASTER_POWER.with(75), PJL_FOOTER, POSITION_X.with(-40)] {
            let mut streamed = Vec::new();
            cmd.write_to(&mut streamed).unwrap();
            assert_eq!(cmd.to_bytes(), streamed);
        }
    }
}
