use quartz_nbt::NbtCompound;

/// Whether an entity snapshot belongs in the chunk's persisted state.
///
/// Set by whoever produced the snapshot; the codec only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persistence {
    /// Saved with the chunk.
    Persistent,
    /// Owned by a player session and saved with the player instead.
    PlayerControlled,
    /// Already closed; dropped on the next save.
    Closed,
}

impl Persistence {
    pub fn is_saved(self) -> bool {
        matches!(self, Persistence::Persistent)
    }
}

/// Persisted state of one entity, as produced by the entity itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub persistence: Persistence,
    pub nbt: NbtCompound,
}

impl EntitySnapshot {
    pub fn persistent(nbt: NbtCompound) -> Self {
        Self {
            persistence: Persistence::Persistent,
            nbt,
        }
    }

    pub fn player(nbt: NbtCompound) -> Self {
        Self {
            persistence: Persistence::PlayerControlled,
            nbt,
        }
    }
}

/// Persisted state of one tile, plus the compound sent to clients when the
/// tile is visible to them.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSnapshot {
    pub nbt: NbtCompound,
    pub spawn: Option<NbtCompound>,
}

impl TileSnapshot {
    pub fn new(nbt: NbtCompound) -> Self {
        Self { nbt, spawn: None }
    }

    pub fn spawnable(nbt: NbtCompound, spawn: NbtCompound) -> Self {
        Self {
            nbt,
            spawn: Some(spawn),
        }
    }

    pub fn is_spawnable(&self) -> bool {
        self.spawn.is_some()
    }
}
