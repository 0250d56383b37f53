/// Errors from encoding or decoding a chunk document.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("NBT error: {0}")]
    Nbt(String),
    #[error("missing field `{field}`")]
    Missing { field: &'static str },
    #[error("field `{field}` is not a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` has {actual} entries, expected {expected}")]
    BadLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("section Y={0} is outside 0..16")]
    SectionOutOfRange(i8),
    #[error("document inflates past {limit} bytes")]
    DocumentTooLarge { limit: usize },
}

/// Errors from region storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("region header entry {index} points into the header (sector {sector})")]
    CorruptHeader { index: usize, sector: u32 },
    #[error("chunk ({x}, {z}) has length {length}, which does not fit its {sectors} sectors")]
    CorruptChunk {
        x: u8,
        z: u8,
        length: u32,
        sectors: u8,
    },
    #[error("unsupported compression scheme {0}")]
    UnsupportedCompression(u8),
    #[error("chunk needs {sectors} sectors, at most 255 fit in one region entry")]
    ChunkTooLarge { sectors: usize },
}
