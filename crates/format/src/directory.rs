use std::collections::HashMap;
use std::collections::hash_map::Entry;

use anvil_common::{ChunkPos, RegionPos};

use crate::error::StorageError;

/// Storage for one 32x32-chunk region. Coordinates are local, `0..32`.
///
/// Payloads are the compressed chunk documents exactly as the codec
/// produces them.
pub trait RegionHandle {
    fn read_chunk(&mut self, x: u8, z: u8) -> Result<Option<Vec<u8>>, StorageError>;

    fn write_chunk(&mut self, x: u8, z: u8, payload: &[u8]) -> Result<(), StorageError>;

    /// Flush and release whatever the handle holds. Called once, right
    /// before the handle is dropped by its directory.
    fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Creates region handles on first access.
pub trait RegionOpener {
    type Region: RegionHandle;

    fn open(&self, pos: RegionPos) -> Result<Self::Region, StorageError>;
}

/// Open regions keyed by packed region coordinates.
///
/// Owned by a single level; handles stay open until closed explicitly.
pub struct RegionDirectory<O: RegionOpener> {
    opener: O,
    regions: HashMap<i64, O::Region>,
}

impl<O: RegionOpener> RegionDirectory<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            regions: HashMap::new(),
        }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Region containing chunk `(x, z)`, if it is already open.
    pub fn get_region(&self, x: i32, z: i32) -> Option<&O::Region> {
        self.regions.get(&region_key(x, z))
    }

    pub fn get_region_mut(&mut self, x: i32, z: i32) -> Option<&mut O::Region> {
        self.regions.get_mut(&region_key(x, z))
    }

    /// Region containing chunk `(x, z)`, opening it if needed. Calling this
    /// again for any chunk of the same region returns the same handle.
    pub fn load_region(&mut self, x: i32, z: i32) -> Result<&mut O::Region, StorageError> {
        let pos = ChunkPos::new(x, z).region();
        match self.regions.entry(pos.hash()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let region = self.opener.open(pos)?;
                tracing::debug!(rx = pos.x, rz = pos.z, "opened region");
                Ok(e.insert(region))
            }
        }
    }

    /// Close the region containing chunk `(x, z)`. Returns whether one was
    /// open.
    pub fn close_region(&mut self, x: i32, z: i32) -> Result<bool, StorageError> {
        match self.regions.remove(&region_key(x, z)) {
            Some(mut region) => {
                region.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close every open region. All handles are dropped even if some fail
    /// to close; the first failure is returned.
    pub fn close_all(&mut self) -> Result<(), StorageError> {
        let mut first_err = None;
        for (key, mut region) in self.regions.drain() {
            if let Err(e) = region.close() {
                tracing::warn!(key, "failed to close region: {e}");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of open regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn region_key(x: i32, z: i32) -> i64 {
    ChunkPos::new(x, z).region().hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct FakeRegion {
        pos: RegionPos,
        closes: Rc<Cell<usize>>,
    }

    impl RegionHandle for FakeRegion {
        fn read_chunk(&mut self, _x: u8, _z: u8) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        fn write_chunk(&mut self, _x: u8, _z: u8, _payload: &[u8]) -> Result<(), StorageError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), StorageError> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingOpener {
        opened: Cell<usize>,
        closes: Rc<Cell<usize>>,
        fail: bool,
    }

    impl RegionOpener for CountingOpener {
        type Region = FakeRegion;

        fn open(&self, pos: RegionPos) -> Result<FakeRegion, StorageError> {
            if self.fail {
                return Err(StorageError::Io(std::io::Error::other("disk gone")));
            }
            self.opened.set(self.opened.get() + 1);
            Ok(FakeRegion {
                pos,
                closes: Rc::clone(&self.closes),
            })
        }
    }

    #[test]
    fn get_region_never_opens() {
        let dir = RegionDirectory::new(CountingOpener::default());
        assert!(dir.get_region(0, 0).is_none());
        assert_eq!(dir.opener().opened.get(), 0);
    }

    #[test]
    fn load_region_is_idempotent() {
        let mut dir = RegionDirectory::new(CountingOpener::default());
        let first: *const FakeRegion = dir.load_region(5, 7).unwrap();
        let second: *const FakeRegion = dir.load_region(5, 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.opener().opened.get(), 1);

        let looked_up: *const FakeRegion = dir.get_region(5, 7).unwrap();
        assert_eq!(looked_up, first);
        assert!(std::ptr::eq(dir.get_region(5, 7).unwrap(), dir.get_region(5, 7).unwrap()));
    }

    #[test]
    fn chunks_of_one_region_share_a_handle() {
        let mut dir = RegionDirectory::new(CountingOpener::default());
        dir.load_region(0, 0).unwrap();
        dir.load_region(31, 31).unwrap();
        assert_eq!(dir.len(), 1);
        dir.load_region(32, 0).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get_region(40, 5).unwrap().pos, RegionPos::new(1, 0));
    }

    #[test]
    fn negative_regions_do_not_alias() {
        let mut dir = RegionDirectory::new(CountingOpener::default());
        dir.load_region(-1, 0).unwrap();
        dir.load_region(0, -1).unwrap();
        dir.load_region(-1, -1).unwrap();
        dir.load_region(0, 0).unwrap();
        assert_eq!(dir.len(), 4);
        assert!(dir.get_region(-1, -33).is_none());

        dir.load_region(-33, -1).unwrap();
        assert_eq!(dir.len(), 5);
        assert_eq!(dir.get_region(-33, -1).unwrap().pos, RegionPos::new(-2, -1));
        assert_eq!(dir.get_region(-64, -32).unwrap().pos, RegionPos::new(-2, -1));
    }

    #[test]
    fn open_failure_is_surfaced_and_nothing_is_registered() {
        let mut dir = RegionDirectory::new(CountingOpener {
            fail: true,
            ..Default::default()
        });
        assert!(dir.load_region(0, 0).is_err());
        assert!(dir.is_empty());
    }

    #[test]
    fn close_region_drops_the_handle() {
        let mut dir = RegionDirectory::new(CountingOpener::default());
        dir.load_region(0, 0).unwrap();
        assert!(dir.close_region(3, 3).unwrap());
        assert!(!dir.close_region(3, 3).unwrap());
        assert!(dir.get_region(0, 0).is_none());
        assert_eq!(dir.opener().closes.get(), 1);
        dir.load_region(0, 0).unwrap();
        assert_eq!(dir.opener().opened.get(), 2);
    }

    #[test]
    fn close_all_empties_the_directory() {
        let mut dir = RegionDirectory::new(CountingOpener::default());
        dir.load_region(0, 0).unwrap();
        dir.load_region(100, 100).unwrap();
        dir.close_all().unwrap();
        assert!(dir.is_empty());
        assert_eq!(dir.opener().closes.get(), 2);
    }
}
