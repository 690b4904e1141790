//! A chunk storing a dense cube of blocks, optimized for runtime performance.

use std::io::{self, Read, Write};

use glam::IVec3;

use crate::block::AIR;


/// Chunk size in both X and Z coordinates.
pub const CHUNK_WIDTH: usize = 16;
/// Chunk height.
pub const CHUNK_HEIGHT: usize = 16;
/// Internal chunk size, in number of elements per chunk. This is also the
/// size in bytes of a chunk save file.
pub const CHUNK_SIZE: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_WIDTH;


/// Calculate the index in the chunk's array for the given chunk-local
/// position. The layout is `xxxx yyyy zzzz` so that iterating the flat array
/// visits blocks in the save file order: outer X, middle Y, inner Z. Only
/// the firsts relevant bits are taken in each coordinate component, so a
/// world position addresses its chunk-local cell directly.
#[inline]
fn calc_index(pos: IVec3) -> usize {
    debug_assert!(pos.y >= 0 && pos.y < CHUNK_HEIGHT as i32);
    let x = pos.x as u32 & 0b1111;
    let y = pos.y as u32 & 0b1111;
    let z = pos.z as u32 & 0b1111;
    ((x << 8) | (y << 4) | (z << 0)) as usize
}

/// Calculate the chunk position corresponding to the given block position.
/// This returns no position if the Y coordinate is outside the chunk height,
/// the world is chunk-tiled in the horizontal plane only.
#[inline]
pub fn calc_chunk_pos(pos: IVec3) -> Option<(i32, i32)> {
    if pos.y < 0 || pos.y >= CHUNK_HEIGHT as i32 {
        None
    } else {
        Some(calc_chunk_pos_unchecked(pos))
    }
}

/// Calculate the chunk position corresponding to the given block position.
/// The Y coordinate is ignored, so it may be invalid.
#[inline]
pub fn calc_chunk_pos_unchecked(pos: IVec3) -> (i32, i32) {
    (pos.x >> 4, pos.z >> 4)
}

/// Calculate the world-space origin of the chunk at the given coordinate,
/// the Y origin is always zero.
#[inline]
pub fn calc_chunk_origin(cx: i32, cz: i32) -> IVec3 {
    IVec3::new(cx * CHUNK_WIDTH as i32, 0, cz * CHUNK_WIDTH as i32)
}


/// Data structure storing the blocks of a chunk, a world subdivision of
/// 16x16x16 blocks.
pub struct Chunk {
    /// The numeric identifier of each block.
    block: ChunkByteArray,
}

impl Chunk {

    /// Create a new empty chunk, full of air blocks.
    pub fn new() -> Box<Self> {
        Box::new(Self {
            block: [AIR; CHUNK_SIZE],
        })
    }

    /// Get block id at the given global position (rebased to chunk-local).
    /// Panics if the Y component of the position is not between 0 and 16
    /// (excluded).
    #[inline]
    pub fn get_block(&self, pos: IVec3) -> u8 {
        self.block[calc_index(pos)]
    }

    /// Set block id at the given global position (rebased to chunk-local).
    /// Panics if the Y component of the position is not between 0 and 16
    /// (excluded).
    #[inline]
    pub fn set_block(&mut self, pos: IVec3, block: u8) {
        self.block[calc_index(pos)] = block;
    }

    /// Fill the given chunk area with the given block id.
    /// Panics if the area exceeds the chunk height.
    pub fn fill_block(&mut self, start: IVec3, size: IVec3, id: u8) {
        for x in start.x..start.x + size.x {
            for z in start.z..start.z + size.z {
                let mut index = calc_index(IVec3::new(x, start.y, z));
                for _ in start.y..start.y + size.y {
                    self.block[index] = id;
                    // Increment Y component.
                    index += 1 << 4;
                }
            }
        }
    }

    /// Write the chunk's grid to the given writer, one byte per block in
    /// outer X, middle Y, inner Z order. There is no header and no
    /// compression, the layout is the whole format.
    pub fn write_data_to(&self, mut writer: impl Write) -> io::Result<()> {
        writer.write_all(&self.block)
    }

    /// Read the chunk's grid from the given reader, expecting the exact
    /// layout produced by [`write_data_to`](Self::write_data_to).
    pub fn read_data_from(&mut self, mut reader: impl Read) -> io::Result<()> {
        reader.read_exact(&mut self.block)
    }

}

/// Type alias for a chunk array that stores `u8 * CHUNK_SIZE` values.
type ChunkByteArray = [u8; CHUNK_SIZE];
