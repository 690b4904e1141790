//! Tree feature generation.

use glam::IVec3;

use crate::block;


/// Height of a trunk, in logs.
const TRUNK_HEIGHT: i32 = 4;

/// Produce the block placements of a tree grown from the given base
/// position, in absolute world coordinates: a canopy may cross a chunk
/// border, so the caller routes each placement into the chunk it falls in.
/// Placements are ordered so that later entries win when several land on the
/// same cell.
pub fn generate(base: IVec3) -> Vec<(IVec3, u8)> {

    let mut placements = Vec::with_capacity(64);

    for i in 0..TRUNK_HEIGHT {
        placements.push((base + IVec3::new(0, i, 0), block::LOG));
    }

    let leaf_top = base.y + TRUNK_HEIGHT;

    // Two full 3x3 layers at and above the trunk top.
    for layer in 0..=1 {
        for dx in -1..=1 {
            for dz in -1..=1 {
                placements.push((IVec3::new(base.x + dx, leaf_top + layer, base.z + dz), block::LEAVES));
            }
        }
    }

    // Two 5x5 layers below the trunk top, with the four extreme corners cut.
    for layer in -2..=-1 {
        for dx in -2..=2i32 {
            for dz in -2..=2i32 {
                if dx.abs() == 2 && dz.abs() == 2 {
                    continue;
                }
                placements.push((IVec3::new(base.x + dx, leaf_top + layer, base.z + dz), block::LEAVES));
            }
        }
    }

    placements

}
