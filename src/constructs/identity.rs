//! Record keys shared by the metric families.
//!
//! The width of the tile number changed between format versions (`u16` in older
//! layouts, `u32` once tile numbering outgrew it), so identities are generic over a
//! [`TileId`] and each version's record type names its width explicitly.

use std::{fmt::Debug, hash::Hash, io::BufRead};

use crate::{io::ByteCursor, Result};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// On-disk tile number width. Implemented for `u16` and `u32` only.
pub trait TileId: sealed::Sealed + Copy + Debug + Ord + Hash + Into<u32> {
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self>;
}

impl TileId for u16 {
    const WIDTH: usize = 2;

    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        cursor.read_u16()
    }
}

impl TileId for u32 {
    const WIDTH: usize = 4;

    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        cursor.read_u32()
    }
}

/// `(lane, tile)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneTile<T: TileId> {
    pub lane: u16,
    pub tile: T,
}
impl<T: TileId> LaneTile<T> {
    /// Encoded width in bytes.
    pub const SIZE: usize = 2 + T::WIDTH;

    pub fn new(lane: u16, tile: T) -> Self {
        Self { lane, tile }
    }
    pub fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let lane = cursor.read_u16()?;
        let tile = T::read(cursor)?;
        Ok(Self { lane, tile })
    }
    /// Tile number widened to `u32`.
    pub fn tile_number(&self) -> u32 {
        self.tile.into()
    }
    /// Key with the tile widened to `u32`, used to merge across versions.
    pub fn key(&self) -> (u16, u32) {
        (self.lane, self.tile_number())
    }
}

/// `(lane, tile, cycle)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneTileCycle<T: TileId> {
    pub lane: u16,
    pub tile: T,
    pub cycle: u16,
}
impl<T: TileId> LaneTileCycle<T> {
    /// Encoded width in bytes.
    pub const SIZE: usize = 4 + T::WIDTH;

    pub fn new(lane: u16, tile: T, cycle: u16) -> Self {
        Self { lane, tile, cycle }
    }
    pub fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let lane = cursor.read_u16()?;
        let tile = T::read(cursor)?;
        let cycle = cursor.read_u16()?;
        Ok(Self { lane, tile, cycle })
    }
    pub fn tile_number(&self) -> u32 {
        self.tile.into()
    }
    pub fn lane_tile(&self) -> LaneTile<T> {
        LaneTile::new(self.lane, self.tile)
    }
}
