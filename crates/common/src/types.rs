/// Right shift that maps chunk coordinates to region coordinates.
pub const REGION_SHIFT: u32 = 5;
/// Chunks per region edge.
pub const REGION_WIDTH: i32 = 1 << REGION_SHIFT;

/// Chunk column coordinate on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Region containing this chunk. Arithmetic shift, so negative
    /// coordinates floor toward the next region down.
    pub fn region(self) -> RegionPos {
        RegionPos {
            x: self.x >> REGION_SHIFT,
            z: self.z >> REGION_SHIFT,
        }
    }

    /// Position of this chunk inside its region, both in `0..32`.
    pub fn local(self) -> (u8, u8) {
        (
            (self.x & (REGION_WIDTH - 1)) as u8,
            (self.z & (REGION_WIDTH - 1)) as u8,
        )
    }

    pub fn hash(self) -> i64 {
        chunk_hash(self.x, self.z)
    }
}

/// Region coordinate: one region covers 32x32 chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn hash(self) -> i64 {
        region_hash(self.x, self.z)
    }

    /// File name of the region inside the world's `region/` directory.
    pub fn file_name(self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }
}

/// Packs a signed coordinate pair into one key: `x` in the high half, `z`
/// reinterpreted as unsigned in the low half. Injective over all `i32` pairs.
pub fn chunk_hash(x: i32, z: i32) -> i64 {
    ((x as i64) << 32) | (z as u32 as i64)
}

/// Same packing as [`chunk_hash`], applied to region coordinates.
pub fn region_hash(x: i32, z: i32) -> i64 {
    chunk_hash(x, z)
}
