//! Axis reordering between the two linearizations of a 16x16x16 section.
//!
//! Memory uses XZY (`x << 8 | z << 4 | y`), disk uses YZX
//! (`y << 8 | z << 4 | x`). Both directions go through the same generic
//! permutation, so forward and backward are inverses by construction.

use crate::section::{BLOCKS_PER_SECTION, NIBBLES_PER_SECTION};

/// Enumeration order of a 16x16x16 cuboid, most significant axis first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisOrder {
    Xzy,
    Yzx,
}

/// Order used by [`crate::SubChunk`] arrays.
pub const MEMORY_ORDER: AxisOrder = AxisOrder::Xzy;
/// Order used by the `Blocks`/`Data`/`*Light` arrays of stored sections.
pub const DISK_ORDER: AxisOrder = AxisOrder::Yzx;

impl AxisOrder {
    /// Flat index of block `(x, y, z)`, each coordinate in `0..16`.
    #[inline]
    pub const fn index(self, x: usize, y: usize, z: usize) -> usize {
        match self {
            AxisOrder::Xzy => (x << 8) | (z << 4) | y,
            AxisOrder::Yzx => (y << 8) | (z << 4) | x,
        }
    }
}

/// Permutes a one-byte-per-block array from `from` order into `to` order.
pub fn reorder_bytes(
    src: &[u8; BLOCKS_PER_SECTION],
    from: AxisOrder,
    to: AxisOrder,
) -> Box<[u8; BLOCKS_PER_SECTION]> {
    let mut dst = Box::new([0u8; BLOCKS_PER_SECTION]);
    if from == to {
        dst.copy_from_slice(src);
        return dst;
    }
    for x in 0..16 {
        for z in 0..16 {
            for y in 0..16 {
                dst[to.index(x, y, z)] = src[from.index(x, y, z)];
            }
        }
    }
    dst
}

/// Permutes a packed nibble array (two blocks per byte, even index in the
/// low nibble). Works per block, not per byte: neighbouring blocks in one
/// order are rarely neighbours in the other.
pub fn reorder_nibbles(
    src: &[u8; NIBBLES_PER_SECTION],
    from: AxisOrder,
    to: AxisOrder,
) -> Box<[u8; NIBBLES_PER_SECTION]> {
    if from == to {
        return Box::new(*src);
    }
    let unpacked = unpack_nibbles(src);
    let permuted = reorder_bytes(&unpacked, from, to);
    pack_nibbles(&permuted)
}

pub fn to_disk_bytes(src: &[u8; BLOCKS_PER_SECTION]) -> Box<[u8; BLOCKS_PER_SECTION]> {
    reorder_bytes(src, MEMORY_ORDER, DISK_ORDER)
}

pub fn from_disk_bytes(src: &[u8; BLOCKS_PER_SECTION]) -> Box<[u8; BLOCKS_PER_SECTION]> {
    reorder_bytes(src, DISK_ORDER, MEMORY_ORDER)
}

pub fn to_disk_nibbles(src: &[u8; NIBBLES_PER_SECTION]) -> Box<[u8; NIBBLES_PER_SECTION]> {
    reorder_nibbles(src, MEMORY_ORDER, DISK_ORDER)
}

pub fn from_disk_nibbles(src: &[u8; NIBBLES_PER_SECTION]) -> Box<[u8; NIBBLES_PER_SECTION]> {
    reorder_nibbles(src, DISK_ORDER, MEMORY_ORDER)
}

/// Reads the 4-bit value at block `index` of a packed nibble array.
#[inline]
pub fn get_nibble(array: &[u8], index: usize) -> u8 {
    let byte = array[index >> 1];
    if index & 1 == 0 { byte & 0x0f } else { byte >> 4 }
}

/// Writes the low 4 bits of `value` at block `index`.
#[inline]
pub fn set_nibble(array: &mut [u8], index: usize, value: u8) {
    let byte = &mut array[index >> 1];
    if index & 1 == 0 {
        *byte = (*byte & 0xf0) | (value & 0x0f);
    } else {
        *byte = (*byte & 0x0f) | ((value & 0x0f) << 4);
    }
}

fn unpack_nibbles(src: &[u8; NIBBLES_PER_SECTION]) -> Box<[u8; BLOCKS_PER_SECTION]> {
    let mut out = Box::new([0u8; BLOCKS_PER_SECTION]);
    for (i, byte) in src.iter().enumerate() {
        out[i << 1] = byte & 0x0f;
        out[(i << 1) | 1] = byte >> 4;
    }
    out
}

fn pack_nibbles(src: &[u8; BLOCKS_PER_SECTION]) -> Box<[u8; NIBBLES_PER_SECTION]> {
    let mut out = Box::new([0u8; NIBBLES_PER_SECTION]);
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = (src[i << 1] & 0x0f) | ((src[(i << 1) | 1] & 0x0f) << 4);
    }
    out
}
