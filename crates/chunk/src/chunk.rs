use std::collections::BTreeMap;

use anvil_common::ChunkPos;

use crate::section::{BLOCKS_PER_SECTION, NIBBLES_PER_SECTION, SubChunk};
use crate::snapshot::{EntitySnapshot, TileSnapshot};

/// Section slots per chunk column (256 blocks of height).
pub const SECTION_COUNT: usize = 16;
/// One height-map entry per XZ column.
pub const HEIGHT_MAP_LEN: usize = 256;
/// One biome colour per XZ column.
pub const BIOME_COLOR_LEN: usize = 256;

/// A 16x16 column of the world: sections, height map, biome colours and
/// the snapshots of everything living in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pos: ChunkPos,
    sections: Vec<SubChunk>,
    height_map: Box<[i32; HEIGHT_MAP_LEN]>,
    biome_colors: Box<[u32; BIOME_COLOR_LEN]>,
    extra_data: BTreeMap<u32, u16>,
    entities: Vec<EntitySnapshot>,
    tiles: Vec<TileSnapshot>,
    populated: bool,
    light_populated: bool,
    generated: bool,
}

impl Chunk {
    /// An empty, ungenerated chunk at `(x, z)`.
    pub fn new(x: i32, z: i32) -> Self {
        Self {
            pos: ChunkPos::new(x, z),
            sections: (0..SECTION_COUNT as u8).map(SubChunk::new).collect(),
            height_map: Box::new([0; HEIGHT_MAP_LEN]),
            biome_colors: Box::new([0; BIOME_COLOR_LEN]),
            extra_data: BTreeMap::new(),
            entities: Vec::new(),
            tiles: Vec::new(),
            populated: false,
            light_populated: false,
            generated: false,
        }
    }

    pub fn x(&self) -> i32 {
        self.pos.x
    }

    pub fn z(&self) -> i32 {
        self.pos.z
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Section at slot `y`. Panics if `y >= SECTION_COUNT`.
    pub fn section(&self, y: usize) -> &SubChunk {
        &self.sections[y]
    }

    pub fn section_mut(&mut self, y: usize) -> &mut SubChunk {
        &mut self.sections[y]
    }

    /// All section slots, bottom to top, including empty ones.
    pub fn sections(&self) -> &[SubChunk] {
        &self.sections
    }

    /// Sections holding at least one non-air block.
    pub fn non_empty_sections(&self) -> impl Iterator<Item = &SubChunk> {
        self.sections.iter().filter(|s| !s.is_empty())
    }

    /// Puts `section` into slot `y`, replacing what was there. Returns the
    /// previous occupant.
    pub fn set_section(&mut self, y: usize, mut section: SubChunk) -> SubChunk {
        section.set_y(y as u8);
        std::mem::replace(&mut self.sections[y], section)
    }

    pub fn block_id(&self, x: usize, y: usize, z: usize) -> u8 {
        self.sections[y >> 4].block_id(x, y & 15, z)
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u8, meta: u8) {
        let section = &mut self.sections[y >> 4];
        section.set_block_id(x, y & 15, z, id);
        section.set_block_meta(x, y & 15, z, meta);
    }

    pub fn height_map(&self) -> &[i32; HEIGHT_MAP_LEN] {
        &self.height_map
    }

    pub fn height_map_mut(&mut self) -> &mut [i32; HEIGHT_MAP_LEN] {
        &mut self.height_map
    }

    pub fn biome_colors(&self) -> &[u32; BIOME_COLOR_LEN] {
        &self.biome_colors
    }

    pub fn biome_colors_mut(&mut self) -> &mut [u32; BIOME_COLOR_LEN] {
        &mut self.biome_colors
    }

    /// Extra block data keyed by in-chunk block hash.
    pub fn extra_data(&self) -> &BTreeMap<u32, u16> {
        &self.extra_data
    }

    pub fn extra_data_mut(&mut self) -> &mut BTreeMap<u32, u16> {
        &mut self.extra_data
    }

    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    pub fn add_entity(&mut self, entity: EntitySnapshot) {
        self.entities.push(entity);
    }

    pub fn set_entities(&mut self, entities: Vec<EntitySnapshot>) {
        self.entities = entities;
    }

    pub fn tiles(&self) -> &[TileSnapshot] {
        &self.tiles
    }

    pub fn add_tile(&mut self, tile: TileSnapshot) {
        self.tiles.push(tile);
    }

    pub fn set_tiles(&mut self, tiles: Vec<TileSnapshot>) {
        self.tiles = tiles;
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn set_populated(&mut self, populated: bool) {
        self.populated = populated;
    }

    pub fn is_light_populated(&self) -> bool {
        self.light_populated
    }

    pub fn set_light_populated(&mut self, light_populated: bool) {
        self.light_populated = light_populated;
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn set_generated(&mut self, generated: bool) {
        self.generated = generated;
    }

    /// Block ids of the whole column: every section slot in Y order.
    pub fn block_id_column(&self) -> Vec<u8> {
        self.column(BLOCKS_PER_SECTION, |s| &s.block_ids()[..])
    }

    pub fn block_data_column(&self) -> Vec<u8> {
        self.column(NIBBLES_PER_SECTION, |s| &s.block_data()[..])
    }

    pub fn sky_light_column(&self) -> Vec<u8> {
        self.column(NIBBLES_PER_SECTION, |s| &s.sky_light()[..])
    }

    pub fn block_light_column(&self) -> Vec<u8> {
        self.column(NIBBLES_PER_SECTION, |s| &s.block_light()[..])
    }

    fn column<'a>(&'a self, per_section: usize, pick: impl Fn(&'a SubChunk) -> &'a [u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(per_section * SECTION_COUNT);
        for section in &self.sections {
            out.extend_from_slice(pick(section));
        }
        out
    }
}
