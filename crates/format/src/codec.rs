//! Chunk ⇄ compressed NBT document.
//!
//! Document layout (big-endian NBT, zlib compressed):
//! ```text
//! "" (Compound)
//!   Level (Compound)
//!     xPos, zPos          Int
//!     V                   Byte   (format version, 1)
//!     LastUpdate          Long   (always 0)
//!     InhabitedTime       Long   (always 0)
//!     TerrainPopulated    Byte
//!     LightPopulated      Byte
//!     Sections            List of Compound { Y, Blocks, Data, BlockLight, SkyLight }
//!     HeightMap           IntArray (256)
//!     Entities            List of Compound
//!     TileEntities        List of Compound
//! ```

use std::io::{Cursor, Read, Write};
use std::panic::{self, AssertUnwindSafe};

use anvil_chunk::reorder::{from_disk_bytes, from_disk_nibbles, to_disk_bytes, to_disk_nibbles};
use anvil_chunk::{
    BLOCKS_PER_SECTION, Chunk, EntitySnapshot, HEIGHT_MAP_LEN, NIBBLES_PER_SECTION,
    SECTION_COUNT, SubChunk, TileSnapshot,
};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::error::FormatError;
use crate::schema::{byte_array, byte_array_tag, compound_list, flag, optional, required};

/// Value written to `Level.V`.
pub const FORMAT_VERSION: i8 = 1;
/// zlib level used when none is configured.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 7;
/// Upper bound on an inflated document. A full chunk is well under 1 MiB.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// Encodes and decodes chunk documents.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCodec {
    compression: Compression,
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ChunkCodec {
    /// Codec compressing at `level` (clamped to 0..=9).
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level.min(9)),
        }
    }

    /// Serialize a chunk to compressed document bytes.
    pub fn serialize(&self, chunk: &Chunk) -> Result<Vec<u8>, FormatError> {
        let root = to_document(chunk);
        let raw = nbt_write(&root)?;
        zlib_compress(&raw, self.compression)
    }

    /// Deserialize compressed document bytes into a chunk.
    ///
    /// Any successfully decoded chunk is marked generated, whatever the
    /// document says.
    pub fn deserialize(&self, data: &[u8]) -> Result<Chunk, FormatError> {
        let root = self.read_document(data)?;
        from_document(&root)
    }

    /// Decompress and parse a document without interpreting it.
    pub fn read_document(&self, data: &[u8]) -> Result<NbtCompound, FormatError> {
        let raw = zlib_decompress(data)?;
        nbt_read(&raw)
    }

    /// Compress an arbitrary document the same way chunks are compressed.
    pub fn write_document(&self, root: &NbtCompound) -> Result<Vec<u8>, FormatError> {
        let raw = nbt_write(root)?;
        zlib_compress(&raw, self.compression)
    }
}

/// Builds the unnamed root compound for `chunk`.
pub fn to_document(chunk: &Chunk) -> NbtCompound {
    let mut level = NbtCompound::new();
    level.insert("xPos", NbtTag::Int(chunk.x()));
    level.insert("zPos", NbtTag::Int(chunk.z()));
    level.insert("V", NbtTag::Byte(FORMAT_VERSION));
    level.insert("LastUpdate", NbtTag::Long(0));
    level.insert("InhabitedTime", NbtTag::Long(0));
    level.insert("TerrainPopulated", NbtTag::Byte(chunk.is_populated() as i8));
    level.insert("LightPopulated", NbtTag::Byte(chunk.is_light_populated() as i8));

    let sections: Vec<NbtTag> = chunk
        .non_empty_sections()
        .map(|s| NbtTag::Compound(section_to_nbt(s)))
        .collect();
    level.insert("Sections", NbtTag::List(NbtList::from(sections)));

    level.insert("HeightMap", NbtTag::IntArray(chunk.height_map().to_vec()));

    let entities: Vec<NbtTag> = chunk
        .entities()
        .iter()
        .filter(|e| e.persistence.is_saved())
        .map(|e| NbtTag::Compound(e.nbt.clone()))
        .collect();
    level.insert("Entities", NbtTag::List(NbtList::from(entities)));

    let tiles: Vec<NbtTag> = chunk
        .tiles()
        .iter()
        .map(|t| NbtTag::Compound(t.nbt.clone()))
        .collect();
    level.insert("TileEntities", NbtTag::List(NbtList::from(tiles)));

    let mut root = NbtCompound::new();
    root.insert("Level", NbtTag::Compound(level));
    root
}

/// Reads a chunk out of a parsed root compound.
pub fn from_document(root: &NbtCompound) -> Result<Chunk, FormatError> {
    let level: &NbtCompound = required(root, "Level")?;

    let mut chunk = Chunk::new(required(level, "xPos")?, required(level, "zPos")?);

    for section in compound_list(level, "Sections")? {
        let section = section_from_nbt(section)?;
        chunk.set_section(section.y() as usize, section);
    }

    if let Some(heights) = optional::<&[i32]>(level, "HeightMap")? {
        if heights.len() != HEIGHT_MAP_LEN {
            return Err(FormatError::BadLength {
                field: "HeightMap",
                expected: HEIGHT_MAP_LEN,
                actual: heights.len(),
            });
        }
        chunk.height_map_mut().copy_from_slice(heights);
    }

    chunk.set_entities(
        compound_list(level, "Entities")?
            .into_iter()
            .map(|c| EntitySnapshot::persistent(c.clone()))
            .collect(),
    );
    chunk.set_tiles(
        compound_list(level, "TileEntities")?
            .into_iter()
            .map(|c| TileSnapshot::new(c.clone()))
            .collect(),
    );

    chunk.set_light_populated(flag(level, "LightPopulated")?);
    chunk.set_populated(flag(level, "TerrainPopulated")?);
    chunk.set_generated(true);
    Ok(chunk)
}

fn section_to_nbt(section: &SubChunk) -> NbtCompound {
    let mut c = NbtCompound::new();
    c.insert("Y", NbtTag::Byte(section.y() as i8));
    c.insert("Blocks", byte_array_tag(&to_disk_bytes(section.block_ids())[..]));
    c.insert("Data", byte_array_tag(&to_disk_nibbles(section.block_data())[..]));
    c.insert(
        "BlockLight",
        byte_array_tag(&to_disk_nibbles(section.block_light())[..]),
    );
    c.insert(
        "SkyLight",
        byte_array_tag(&to_disk_nibbles(section.sky_light())[..]),
    );
    c
}

fn section_from_nbt(c: &NbtCompound) -> Result<SubChunk, FormatError> {
    let y: i8 = required(c, "Y")?;
    if !(0..SECTION_COUNT as i8).contains(&y) {
        return Err(FormatError::SectionOutOfRange(y));
    }
    let blocks = byte_array::<BLOCKS_PER_SECTION>(c, "Blocks")?;
    let data = byte_array::<NIBBLES_PER_SECTION>(c, "Data")?;
    let block_light = byte_array::<NIBBLES_PER_SECTION>(c, "BlockLight")?;
    let sky_light = byte_array::<NIBBLES_PER_SECTION>(c, "SkyLight")?;
    Ok(SubChunk::from_arrays(
        y as u8,
        from_disk_bytes(&blocks),
        from_disk_nibbles(&data),
        from_disk_nibbles(&block_light),
        from_disk_nibbles(&sky_light),
    ))
}

fn nbt_write(root: &NbtCompound) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::new();
    quartz_nbt::io::write_nbt(&mut buf, Some(""), root, Flavor::Uncompressed)
        .map_err(|e| FormatError::Nbt(e.to_string()))?;
    Ok(buf)
}

fn nbt_read(data: &[u8]) -> Result<NbtCompound, FormatError> {
    // The parser allocates from length prefixes before checking them and
    // panics on negative ones; contain that to this document.
    let parsed = panic::catch_unwind(AssertUnwindSafe(|| {
        quartz_nbt::io::read_nbt(&mut Cursor::new(data), Flavor::Uncompressed)
    }));
    match parsed {
        Ok(Ok((root, _name))) => Ok(root),
        Ok(Err(e)) => Err(FormatError::Nbt(e.to_string())),
        Err(_) => Err(FormatError::Nbt("malformed length prefix".into())),
    }
}

fn zlib_compress(data: &[u8], level: Compression) -> Result<Vec<u8>, FormatError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_DOCUMENT_BYTES as u64 + 1)
        .read_to_end(&mut buf)?;
    if buf.len() > MAX_DOCUMENT_BYTES {
        return Err(FormatError::DocumentTooLarge {
            limit: MAX_DOCUMENT_BYTES,
        });
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_chunk::AxisOrder;

    fn chunk_with_section(x: i32, z: i32, y: usize, id: u8) -> Chunk {
        let mut chunk = Chunk::new(x, z);
        chunk.section_mut(y).block_ids_mut().fill(id);
        chunk
    }

    fn sections_of(root: &NbtCompound) -> Vec<NbtCompound> {
        let level: &NbtCompound = required(root, "Level").unwrap();
        compound_list(level, "Sections")
            .unwrap()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn round_trip_preserves_blocks_light_and_flags() {
        let mut chunk = Chunk::new(-7, 12);
        for (i, y) in [0usize, 5, 15].into_iter().enumerate() {
            let s = chunk.section_mut(y);
            for (j, b) in s.block_ids_mut().iter_mut().enumerate() {
                *b = ((j * 31 + i) % 251) as u8 + 1;
            }
            for (j, b) in s.block_data_mut().iter_mut().enumerate() {
                *b = (j * 13 + i) as u8;
            }
            for (j, b) in s.block_light_mut().iter_mut().enumerate() {
                *b = (j * 7) as u8;
            }
            for (j, b) in s.sky_light_mut().iter_mut().enumerate() {
                *b = (j ^ 0x5a) as u8;
            }
        }
        for (i, h) in chunk.height_map_mut().iter_mut().enumerate() {
            *h = i as i32 % 200;
        }
        chunk.set_populated(true);
        chunk.set_light_populated(false);

        let codec = ChunkCodec::default();
        let bytes = codec.serialize(&chunk).unwrap();
        let decoded = codec.deserialize(&bytes).unwrap();

        assert_eq!(decoded.x(), -7);
        assert_eq!(decoded.z(), 12);
        assert_eq!(decoded.sections(), chunk.sections());
        assert_eq!(decoded.height_map(), chunk.height_map());
        assert!(decoded.is_populated());
        assert!(!decoded.is_light_populated());
        assert!(decoded.is_generated());
    }

    #[test]
    fn only_non_empty_sections_are_stored() {
        let chunk = chunk_with_section(0, 0, 4, 3);
        let codec = ChunkCodec::default();
        let root = codec.read_document(&codec.serialize(&chunk).unwrap()).unwrap();
        let sections = sections_of(&root);
        assert_eq!(sections.len(), 1);
        assert_eq!(required::<i8>(&sections[0], "Y").unwrap(), 4);
    }

    #[test]
    fn scenario_filled_section_at_negative_z() {
        let chunk = chunk_with_section(3, -2, 4, 1);
        let codec = ChunkCodec::default();
        let bytes = codec.serialize(&chunk).unwrap();

        let root = codec.read_document(&bytes).unwrap();
        let level: &NbtCompound = required(&root, "Level").unwrap();
        assert_eq!(required::<i32>(level, "xPos").unwrap(), 3);
        assert_eq!(required::<i32>(level, "zPos").unwrap(), -2);
        assert_eq!(required::<i8>(level, "V").unwrap(), FORMAT_VERSION);
        let sections = sections_of(&root);
        assert_eq!(sections.len(), 1);
        assert_eq!(required::<i8>(&sections[0], "Y").unwrap(), 4);
        let blocks = byte_array::<BLOCKS_PER_SECTION>(&sections[0], "Blocks").unwrap();
        assert!(blocks.iter().all(|&b| b == 1));

        let decoded = codec.deserialize(&bytes).unwrap();
        assert!(decoded.section(4).block_ids().iter().all(|&b| b == 1));
        assert!(decoded.section(3).is_empty());
    }

    #[test]
    fn blocks_are_stored_in_disk_order() {
        let mut chunk = Chunk::new(0, 0);
        chunk.section_mut(0).set_block_id(1, 2, 3, 9);
        let codec = ChunkCodec::default();
        let root = to_document(&chunk);
        let sections = sections_of(&root);
        let blocks = byte_array::<BLOCKS_PER_SECTION>(&sections[0], "Blocks").unwrap();
        assert_eq!(blocks[AxisOrder::Yzx.index(1, 2, 3)], 9);
        assert_eq!(blocks[AxisOrder::Xzy.index(1, 2, 3)], 0);
        let decoded = codec.deserialize(&codec.serialize(&chunk).unwrap()).unwrap();
        assert_eq!(decoded.section(0).block_id(1, 2, 3), 9);
    }

    #[test]
    fn missing_level_is_an_error_not_a_panic() {
        let codec = ChunkCodec::default();
        let mut root = NbtCompound::new();
        root.insert("NotLevel", NbtTag::Int(1));
        let bytes = codec.write_document(&root).unwrap();
        assert!(matches!(
            codec.deserialize(&bytes),
            Err(FormatError::Missing { field: "Level" })
        ));
    }

    #[test]
    fn mistyped_level_is_rejected() {
        let codec = ChunkCodec::default();
        let mut root = NbtCompound::new();
        root.insert("Level", NbtTag::Int(1));
        let bytes = codec.write_document(&root).unwrap();
        assert!(matches!(
            codec.deserialize(&bytes),
            Err(FormatError::WrongType { field: "Level", .. })
        ));
    }

    #[test]
    fn negative_array_length_is_an_error() {
        let mut raw = vec![10, 0, 0]; // unnamed root compound
        raw.extend_from_slice(&[10, 0, 5]);
        raw.extend_from_slice(b"Level");
        raw.extend_from_slice(&[7, 0, 6]);
        raw.extend_from_slice(b"Blocks");
        raw.extend_from_slice(&(-1i32).to_be_bytes());
        raw.extend_from_slice(&[0, 0]);

        let bytes = zlib_compress(&raw, Compression::default()).unwrap();
        let codec = ChunkCodec::default();
        assert!(matches!(codec.deserialize(&bytes), Err(FormatError::Nbt(_))));
    }

    #[test]
    fn oversized_document_is_rejected() {
        let bytes = zlib_compress(&vec![0u8; MAX_DOCUMENT_BYTES + 1], Compression::fast()).unwrap();
        assert!(matches!(
            ChunkCodec::default().deserialize(&bytes),
            Err(FormatError::DocumentTooLarge { .. })
        ));
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        let codec = ChunkCodec::default();
        assert!(codec.deserialize(b"definitely not zlib").is_err());
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let mut level = NbtCompound::new();
        level.insert("xPos", NbtTag::Int(1));
        level.insert("zPos", NbtTag::Int(2));
        let mut root = NbtCompound::new();
        root.insert("Level", NbtTag::Compound(level));

        let chunk = from_document(&root).unwrap();
        assert!(!chunk.is_populated());
        assert!(!chunk.is_light_populated());
        assert!(chunk.is_generated());
        assert!(chunk.entities().is_empty());
        assert!(chunk.tiles().is_empty());
        assert!(chunk.height_map().iter().all(|&h| h == 0));
        assert_eq!(chunk.non_empty_sections().count(), 0);
    }

    #[test]
    fn malformed_section_is_reported() {
        let mut section = NbtCompound::new();
        section.insert("Y", NbtTag::Byte(0));
        section.insert("Blocks", NbtTag::ByteArray(vec![1; 10]));
        let mut level = NbtCompound::new();
        level.insert("xPos", NbtTag::Int(0));
        level.insert("zPos", NbtTag::Int(0));
        level.insert(
            "Sections",
            NbtTag::List(NbtList::from(vec![NbtTag::Compound(section)])),
        );
        let mut root = NbtCompound::new();
        root.insert("Level", NbtTag::Compound(level));

        assert!(matches!(
            from_document(&root),
            Err(FormatError::BadLength { field: "Blocks", .. })
        ));
    }

    #[test]
    fn section_y_out_of_range_is_reported() {
        let chunk = chunk_with_section(0, 0, 2, 1);
        let mut root = to_document(&chunk);
        let NbtTag::Compound(level) = root.inner().get("Level").cloned().unwrap() else {
            panic!("Level is a compound");
        };
        let mut sections = sections_of(&root);
        sections[0].insert("Y", NbtTag::Byte(16));
        let mut level = level;
        level.insert(
            "Sections",
            NbtTag::List(NbtList::from(
                sections.into_iter().map(NbtTag::Compound).collect::<Vec<_>>(),
            )),
        );
        root.insert("Level", NbtTag::Compound(level));
        assert!(matches!(
            from_document(&root),
            Err(FormatError::SectionOutOfRange(16))
        ));
    }

    #[test]
    fn player_and_closed_entities_are_not_saved() {
        use anvil_chunk::Persistence;

        let mut chunk = Chunk::new(0, 0);
        let mut saved = NbtCompound::new();
        saved.insert("id", NbtTag::String("Cow".into()));
        chunk.add_entity(EntitySnapshot::persistent(saved.clone()));
        chunk.add_entity(EntitySnapshot::player(NbtCompound::new()));
        chunk.add_entity(EntitySnapshot {
            persistence: Persistence::Closed,
            nbt: NbtCompound::new(),
        });
        let mut tile = NbtCompound::new();
        tile.insert("id", NbtTag::String("Chest".into()));
        chunk.add_tile(TileSnapshot::new(tile.clone()));

        let codec = ChunkCodec::default();
        let decoded = codec.deserialize(&codec.serialize(&chunk).unwrap()).unwrap();
        assert_eq!(decoded.entities().len(), 1);
        assert_eq!(decoded.entities()[0].nbt, saved);
        assert_eq!(decoded.tiles().len(), 1);
        assert_eq!(decoded.tiles()[0].nbt, tile);
    }

    #[test]
    fn wrong_height_map_length_is_reported() {
        let mut level = NbtCompound::new();
        level.insert("xPos", NbtTag::Int(0));
        level.insert("zPos", NbtTag::Int(0));
        level.insert("HeightMap", NbtTag::IntArray(vec![0; 16]));
        let mut root = NbtCompound::new();
        root.insert("Level", NbtTag::Compound(level));
        assert!(matches!(
            from_document(&root),
            Err(FormatError::BadLength {
                field: "HeightMap",
                ..
            })
        ));
    }
}
