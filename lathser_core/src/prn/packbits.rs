/*!
Raster row packing.

Pixels become bits (MSB first, foreground = 1), the bits are emitted as
TIFF-packbits literal runs, and the row is padded with no-op count bytes.
No repeat runs are produced.
*/

use crate::bitmap::Silhouette;
use crate::protocol::{MAX_LITERAL_RUN, RASTER_FILLER_BYTE, RASTER_ROW_ALIGNMENT};

/// Unpacked byte count of a row `width` pixels wide
pub fn row_stride(width: usize) -> usize {
    width.div_ceil(8)
}

/// One row as bits, most significant bit = leftmost pixel.
///
/// A partial final byte keeps its pixels in the high bits; the unused low
/// bits stay zero.
pub fn row_bits<S: Silhouette>(image: &S, y: usize) -> Vec<u8> {
    let mut bits = vec![0u8; row_stride(image.width())];
    for x in 0..image.width() {
        if image.is_foreground(x, y) {
            bits[x / 8] |= 0x80 >> (x % 8);
        }
    }
    bits
}

/// Emit `bits` as literal runs and pad to the row alignment
pub fn pack_literal(bits: &[u8]) -> Vec<u8> {
    let runs = bits.len().div_ceil(MAX_LITERAL_RUN);
    let mut packed = Vec::with_capacity(bits.len() + runs + RASTER_ROW_ALIGNMENT);

    for run in bits.chunks(MAX_LITERAL_RUN) {
        // Count byte n means n + 1 literal bytes follow
        packed.push((run.len() - 1) as u8);
        packed.extend_from_slice(run);
    }

    let padded = packed.len().next_multiple_of(RASTER_ROW_ALIGNMENT);
    packed.resize(padded, RASTER_FILLER_BYTE);
    packed
}
