use std::{fs::File, path::Path};

use memmap2::Mmap;

use crate::Result;

/// Read-only memory map of a metric file.
///
/// Decoding from a map avoids copying large Q-metric files through a read buffer.
pub struct MappedFile {
    map: Mmap,
}
#[allow(clippy::len_without_is_empty)]
impl MappedFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // The map is read-only and the file is not expected to change while decoding.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map })
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn bytes(&self) -> &[u8] {
        &self.map[..]
    }
}
