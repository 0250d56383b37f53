use std::fmt;

use crate::reorder::{MEMORY_ORDER, get_nibble, set_nibble};

/// Blocks in one 16x16x16 section.
pub const BLOCKS_PER_SECTION: usize = 4096;
/// Bytes in a packed nibble array covering one section.
pub const NIBBLES_PER_SECTION: usize = BLOCKS_PER_SECTION / 2;

/// A 16x16x16 cube of block ids, block data and light, stored XZY.
#[derive(Clone, PartialEq, Eq)]
pub struct SubChunk {
    y: u8,
    ids: Box<[u8; BLOCKS_PER_SECTION]>,
    data: Box<[u8; NIBBLES_PER_SECTION]>,
    block_light: Box<[u8; NIBBLES_PER_SECTION]>,
    sky_light: Box<[u8; NIBBLES_PER_SECTION]>,
}

impl SubChunk {
    /// An all-air section with no light.
    pub fn new(y: u8) -> Self {
        Self {
            y,
            ids: Box::new([0; BLOCKS_PER_SECTION]),
            data: Box::new([0; NIBBLES_PER_SECTION]),
            block_light: Box::new([0; NIBBLES_PER_SECTION]),
            sky_light: Box::new([0; NIBBLES_PER_SECTION]),
        }
    }

    /// Builds a section from arrays already in memory (XZY) order.
    pub fn from_arrays(
        y: u8,
        ids: Box<[u8; BLOCKS_PER_SECTION]>,
        data: Box<[u8; NIBBLES_PER_SECTION]>,
        block_light: Box<[u8; NIBBLES_PER_SECTION]>,
        sky_light: Box<[u8; NIBBLES_PER_SECTION]>,
    ) -> Self {
        Self {
            y,
            ids,
            data,
            block_light,
            sky_light,
        }
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub(crate) fn set_y(&mut self, y: u8) {
        self.y = y;
    }

    /// A section is empty when it holds nothing but air; light alone does
    /// not keep it alive.
    pub fn is_empty(&self) -> bool {
        self.ids.iter().all(|&id| id == 0)
    }

    pub fn block_ids(&self) -> &[u8; BLOCKS_PER_SECTION] {
        &self.ids
    }

    pub fn block_data(&self) -> &[u8; NIBBLES_PER_SECTION] {
        &self.data
    }

    pub fn block_light(&self) -> &[u8; NIBBLES_PER_SECTION] {
        &self.block_light
    }

    pub fn sky_light(&self) -> &[u8; NIBBLES_PER_SECTION] {
        &self.sky_light
    }

    pub fn block_ids_mut(&mut self) -> &mut [u8; BLOCKS_PER_SECTION] {
        &mut self.ids
    }

    pub fn block_data_mut(&mut self) -> &mut [u8; NIBBLES_PER_SECTION] {
        &mut self.data
    }

    pub fn block_light_mut(&mut self) -> &mut [u8; NIBBLES_PER_SECTION] {
        &mut self.block_light
    }

    pub fn sky_light_mut(&mut self) -> &mut [u8; NIBBLES_PER_SECTION] {
        &mut self.sky_light
    }

    pub fn block_id(&self, x: usize, y: usize, z: usize) -> u8 {
        self.ids[MEMORY_ORDER.index(x, y, z)]
    }

    pub fn set_block_id(&mut self, x: usize, y: usize, z: usize, id: u8) {
        self.ids[MEMORY_ORDER.index(x, y, z)] = id;
    }

    pub fn block_meta(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.data[..], MEMORY_ORDER.index(x, y, z))
    }

    pub fn set_block_meta(&mut self, x: usize, y: usize, z: usize, meta: u8) {
        set_nibble(&mut self.data[..], MEMORY_ORDER.index(x, y, z), meta);
    }

    pub fn block_light_at(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.block_light[..], MEMORY_ORDER.index(x, y, z))
    }

    pub fn set_block_light_at(&mut self, x: usize, y: usize, z: usize, level: u8) {
        set_nibble(&mut self.block_light[..], MEMORY_ORDER.index(x, y, z), level);
    }

    pub fn sky_light_at(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.sky_light[..], MEMORY_ORDER.index(x, y, z))
    }

    pub fn set_sky_light_at(&mut self, x: usize, y: usize, z: usize, level: u8) {
        set_nibble(&mut self.sky_light[..], MEMORY_ORDER.index(x, y, z), level);
    }
}

impl fmt::Debug for SubChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubChunk")
            .field("y", &self.y)
            .field("solid_blocks", &self.ids.iter().filter(|&&id| id != 0).count())
            .finish_non_exhaustive()
    }
}
