//! `level.dat`: gzip-compressed NBT with a single `Data` compound.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtTag};

use crate::error::ProviderError;

/// Storage version written by Anvil worlds.
pub const ANVIL_VERSION: i32 = 19133;

/// World metadata kept in `level.dat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelInfo {
    pub name: String,
    pub seed: i64,
    pub generator: String,
    pub spawn: (i32, i32, i32),
    pub time: i64,
}

impl LevelInfo {
    pub fn new(name: impl Into<String>, seed: i64) -> Self {
        Self {
            name: name.into(),
            seed,
            generator: "default".into(),
            spawn: (128, 70, 128),
            time: 0,
        }
    }

    fn to_nbt(&self) -> NbtCompound {
        let last_played = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut data = NbtCompound::new();
        data.insert("LevelName", NbtTag::String(self.name.clone()));
        data.insert("version", NbtTag::Int(ANVIL_VERSION));
        data.insert("initialized", NbtTag::Byte(1));
        data.insert("SpawnX", NbtTag::Int(self.spawn.0));
        data.insert("SpawnY", NbtTag::Int(self.spawn.1));
        data.insert("SpawnZ", NbtTag::Int(self.spawn.2));
        data.insert("RandomSeed", NbtTag::Long(self.seed));
        data.insert("generatorName", NbtTag::String(self.generator.clone()));
        data.insert("Time", NbtTag::Long(self.time));
        data.insert("LastPlayed", NbtTag::Long(last_played));

        let mut root = NbtCompound::new();
        root.insert("Data", NbtTag::Compound(data));
        root
    }

    fn from_nbt(root: &NbtCompound) -> Result<Self, ProviderError> {
        let data = match root.inner().get("Data") {
            Some(NbtTag::Compound(c)) => c,
            _ => return Err(ProviderError::LevelData("missing `Data` compound".into())),
        };
        let int = |field: &str| match data.inner().get(field) {
            Some(NbtTag::Int(v)) => Ok(*v),
            _ => Err(ProviderError::LevelData(format!("missing Int `{field}`"))),
        };
        let long = |field: &str| match data.inner().get(field) {
            Some(NbtTag::Long(v)) => *v,
            _ => 0,
        };
        let string = |field: &str| match data.inner().get(field) {
            Some(NbtTag::String(v)) => v.clone(),
            _ => String::new(),
        };

        Ok(Self {
            name: string("LevelName"),
            seed: long("RandomSeed"),
            generator: string("generatorName"),
            spawn: (int("SpawnX")?, int("SpawnY")?, int("SpawnZ")?),
            time: long("Time"),
        })
    }
}

/// Writes `info` to `path`, replacing any existing file.
pub fn write(path: impl AsRef<Path>, info: &LevelInfo) -> Result<(), ProviderError> {
    let mut out = BufWriter::new(File::create(path)?);
    quartz_nbt::io::write_nbt(&mut out, Some(""), &info.to_nbt(), Flavor::GzCompressed)
        .map_err(|e| ProviderError::LevelData(e.to_string()))
}

pub fn read(path: impl AsRef<Path>) -> Result<LevelInfo, ProviderError> {
    let mut input = BufReader::new(File::open(path)?);
    let (root, _) = quartz_nbt::io::read_nbt(&mut input, Flavor::GzCompressed)
        .map_err(|e| ProviderError::LevelData(e.to_string()))?;
    LevelInfo::from_nbt(&root)
}
