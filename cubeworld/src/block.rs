//! Block enumeration and the static descriptions used by generation and
//! meshing to query solidity, transparency and atlas textures.

use crate::util::Face;


/// Static description of a block id. The mapping from id to description is
/// total: every unknown id resolves to the air description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Short technical name of the block.
    pub name: &'static str,
    /// Atlas tile of the top face.
    pub top_texture: u8,
    /// Atlas tile of the four side faces.
    pub side_texture: u8,
    /// Atlas tile of the bottom face.
    pub bottom_texture: u8,
    /// True when the block is drawn in the transparent pass and does not
    /// occlude the faces of its neighbors.
    pub transparent: bool,
}

impl Block {

    const fn opaque(name: &'static str, top: u8, side: u8, bottom: u8) -> Self {
        Self { name, top_texture: top, side_texture: side, bottom_texture: bottom, transparent: false }
    }

    const fn uniform(name: &'static str, texture: u8) -> Self {
        Self::opaque(name, texture, texture, texture)
    }

    const fn clear(name: &'static str, texture: u8) -> Self {
        Self { name, top_texture: texture, side_texture: texture, bottom_texture: texture, transparent: true }
    }

    /// Get the atlas tile to apply on the given face of this block.
    #[inline]
    pub fn texture(&self, face: Face) -> u8 {
        match face {
            Face::PosY => self.top_texture,
            Face::NegY => self.bottom_texture,
            _ => self.side_texture,
        }
    }

}

const AIR_BLOCK: Block = Block { name: "air", top_texture: 0, side_texture: 0, bottom_texture: 0, transparent: false };


/// Internal macro to easily define the blocks registry.
macro_rules! blocks {
    (
        $($ident:ident / $id:literal : $block:expr),* $(,)?
    ) => {

        static BLOCKS: [Block; 256] = {
            let mut arr = [AIR_BLOCK; 256];
            $(arr[$id as usize] = $block;)*
            arr
        };

        /// Number of defined block ids, ids form a contiguous range.
        const BLOCK_COUNT: usize = [$($id as u8),*].len();

        $(pub const $ident: u8 = $id;)*

    };
}

blocks! {
    AIR/0:          AIR_BLOCK,
    DIRT/1:         Block::uniform("dirt", 2),
    GRASS/2:        Block::opaque("grass", 0, 1, 2),
    STONE/3:        Block::uniform("stone", 3),
    LOG/4:          Block::opaque("log", 5, 4, 5),
    LEAVES/5:       Block::clear("leaves", 6),
    SAND/6:         Block::uniform("sand", 7),
    GLASS/7:        Block::clear("glass", 8),
    WOOD/8:         Block::uniform("wood", 9),
    PINK_HEART/9:   Block::uniform("pink_heart", 10),
}


/// Get the static description of the given block id. Unknown ids return the
/// air description, so the mapping is total.
#[inline]
pub fn from_id(id: u8) -> &'static Block {
    &BLOCKS[id as usize]
}

/// Return true if the given block id is solid: any known id other than air.
/// Unknown ids canonicalize to air and are therefore not solid.
#[inline]
pub fn is_solid(id: u8) -> bool {
    id != AIR && (id as usize) < BLOCK_COUNT
}

/// Return true if the given block id is drawn in the transparent pass.
#[inline]
pub fn is_transparent(id: u8) -> bool {
    from_id(id).transparent
}

/// Return true if the given block id hides the face of an adjacent block:
/// solid and not transparent. Air and unknown ids never occlude.
#[inline]
pub fn is_occluding(id: u8) -> bool {
    is_solid(id) && !from_id(id).transparent
}
