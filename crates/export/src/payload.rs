//! Flat client payload for one chunk column.
//!
//! ```text
//! Blocks      16 x 4096   column ids, XZY per section
//! Data        16 x 2048   nibbles
//! SkyLight    16 x 2048   nibbles
//! BlockLight  16 x 2048   nibbles
//! HeightMap   256 x u8
//! Biomes      256 x u32 BE
//! ExtraData   u32 LE count, then count x (u32 LE key, u16 LE value)
//! Tiles       LE NBT, one unnamed root compound per spawnable tile
//! ```

use anvil_chunk::{BIOME_COLOR_LEN, BLOCKS_PER_SECTION, Chunk, HEIGHT_MAP_LEN, NIBBLES_PER_SECTION, SECTION_COUNT};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::exporter::ChunkError;
use crate::le_nbt;

/// Byte offset of the height map; everything before it has a fixed size.
pub const HEIGHT_MAP_OFFSET: usize =
    SECTION_COUNT * (BLOCKS_PER_SECTION + 3 * NIBBLES_PER_SECTION);
pub const BIOME_OFFSET: usize = HEIGHT_MAP_OFFSET + HEIGHT_MAP_LEN;
pub const EXTRA_DATA_OFFSET: usize = BIOME_OFFSET + BIOME_COLOR_LEN * 4;

/// Packages `chunk` into the client payload.
pub fn encode_payload(chunk: &Chunk) -> Result<Vec<u8>, ChunkError> {
    let mut out = Vec::with_capacity(EXTRA_DATA_OFFSET + 4);
    out.extend_from_slice(&chunk.block_id_column());
    out.extend_from_slice(&chunk.block_data_column());
    out.extend_from_slice(&chunk.sky_light_column());
    out.extend_from_slice(&chunk.block_light_column());

    // Heights are 0..=256 in practice; one byte each on the wire.
    out.extend(chunk.height_map().iter().map(|&h| h as u8));
    for &color in chunk.biome_colors() {
        out.write_u32::<BigEndian>(color)?;
    }

    out.write_u32::<LittleEndian>(chunk.extra_data().len() as u32)?;
    for (&key, &value) in chunk.extra_data() {
        out.write_u32::<LittleEndian>(key)?;
        out.write_u16::<LittleEndian>(value)?;
    }

    for spawn in chunk.tiles().iter().filter_map(|t| t.spawn.as_ref()) {
        le_nbt::write_root(&mut out, "", spawn)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_chunk::TileSnapshot;
    use quartz_nbt::{NbtCompound, NbtTag};

    #[test]
    fn empty_chunk_has_fixed_size() {
        let payload = encode_payload(&Chunk::new(0, 0)).unwrap();
        assert_eq!(payload.len(), EXTRA_DATA_OFFSET + 4);
        assert!(payload.iter().all(|&b| b == 0));
    }

    #[test]
    fn segments_land_at_their_offsets() {
        let mut chunk = Chunk::new(1, 1);
        chunk.set_block(1, 17, 2, 42, 5);
        chunk.height_map_mut()[3] = 70;
        chunk.biome_colors_mut()[0] = 0x0011_2233;

        let payload = encode_payload(&chunk).unwrap();
        let id_index = BLOCKS_PER_SECTION + (1 << 8 | 2 << 4 | 1);
        assert_eq!(payload[id_index], 42);
        assert_eq!(payload[HEIGHT_MAP_OFFSET + 3], 70);
        assert_eq!(
            &payload[BIOME_OFFSET..BIOME_OFFSET + 4],
            &[0x00, 0x11, 0x22, 0x33]
        );
    }

    #[test]
    fn extra_data_is_little_endian_and_sorted() {
        let mut chunk = Chunk::new(0, 0);
        chunk.extra_data_mut().insert(9, 0x0102);
        chunk.extra_data_mut().insert(2, 0xffff);

        let payload = encode_payload(&chunk).unwrap();
        let extra = &payload[EXTRA_DATA_OFFSET..];
        assert_eq!(
            extra,
            &[
                2, 0, 0, 0, // count
                2, 0, 0, 0, 0xff, 0xff, // key 2
                9, 0, 0, 0, 0x02, 0x01, // key 9
            ]
        );
    }

    #[test]
    fn only_spawnable_tiles_are_sent() {
        let mut spawn = NbtCompound::new();
        spawn.insert("id", NbtTag::String("Chest".into()));
        let mut chunk = Chunk::new(0, 0);
        chunk.add_tile(TileSnapshot::new(NbtCompound::new()));
        chunk.add_tile(TileSnapshot::spawnable(NbtCompound::new(), spawn.clone()));

        let payload = encode_payload(&chunk).unwrap();
        let mut expected = Vec::new();
        le_nbt::write_root(&mut expected, "", &spawn).unwrap();
        assert_eq!(&payload[EXTRA_DATA_OFFSET + 4..], expected.as_slice());
    }
}
