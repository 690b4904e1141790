//! Conversion of a chunk's block grid into renderable triangle meshes with
//! hidden face culling, and the interfaces tying the core to its rendering
//! collaborator.

use glam::IVec3;

use crate::chunk::{Chunk, CHUNK_WIDTH, CHUNK_HEIGHT};
use crate::util::Face;
use crate::block;


/// Number of texture tiles per atlas row, the atlas is a square grid.
pub const TILES_PER_ROW: u32 = 16;


/// Per-face corner positions forming two counter-clockwise triangles,
/// indexed by [`Face`] discriminant. A block spans a unit cube anchored at
/// its cell coordinate, so mesh geometry and voxel addressing agree.
static FACE_CORNERS: [[[f32; 3]; 6]; 6] = [
    // NegY
    [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0],
    ],
    // PosY
    [
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ],
    // NegZ
    [
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 0.0, 0.0],
    ],
    // PosZ
    [
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.0, 0.0, 1.0],
    ],
    // NegX
    [
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
    ],
    // PosX
    [
        [1.0, 0.0, 1.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 1.0, 1.0],
        [1.0, 0.0, 1.0],
    ],
];

/// Per-corner UV factors inside a face's atlas tile, matching the corner
/// order of `FACE_CORNERS`.
static CORNER_UVS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [1.0, 1.0],
    [1.0, 0.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [0.0, 1.0],
];

/// Get the six per-corner UV coordinates of a face textured with the given
/// atlas tile.
pub fn tile_uvs(tile: u8) -> [[f32; 2]; 6] {
    let size = 1.0 / TILES_PER_ROW as f32;
    let u = (tile as u32 % TILES_PER_ROW) as f32 * size;
    let v = (tile as u32 / TILES_PER_ROW) as f32 * size;
    CORNER_UVS.map(|[fu, fv]| [u + fu * size, v + fv * size])
}


/// A mesh vertex in the interleaved attribute layout consumed by the
/// rendering collaborator: position, atlas UV and a per-face brightness
/// scalar. Plain bytes, ready for upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position, local to the chunk's world origin.
    pub position: [f32; 3],
    /// Normalized atlas texture coordinates.
    pub uv: [f32; 2],
    /// Fixed brightness of the face this vertex belongs to.
    pub brightness: f32,
}

/// The two triangle buffers derived from a chunk's block grid. Both are
/// rebuilt together but consumed independently: the opaque buffer in the
/// regular pass, the transparent buffer in the late pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertices of all opaque block faces.
    pub opaque: Vec<Vertex>,
    /// Vertices of all transparent block faces, glass and leaves.
    pub transparent: Vec<Vertex>,
}

impl ChunkMesh {

    /// Total number of vertices across both buffers.
    pub fn vertex_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

}


/// Read-only occlusion query answered by the world for neighbor positions
/// falling outside the grid of the chunk being meshed. Unloaded positions
/// must answer false so that missing neighbors behave like air.
pub trait OcclusionSource {
    /// Return true if the block at the given world position is solid and
    /// opaque, hiding the face of an adjacent block.
    fn is_occluding(&self, pos: IVec3) -> bool;
}

/// Interface to the rendering collaborator owning the GPU-side buffers. The
/// core never talks to a graphics API: it hands vertex slices to `upload`
/// and keeps the returned handle. Dropping a handle releases the underlying
/// resource, so replacing an uploaded mesh must drop the previous handle
/// before uploading the new one.
pub trait ChunkRenderer {
    /// Opaque identifier of an uploaded vertex buffer.
    type Handle;
    /// Upload an interleaved vertex buffer and return its handle.
    fn upload(&mut self, vertices: &[Vertex]) -> Self::Handle;
    /// Draw a previously uploaded buffer in the opaque or transparent pass.
    fn draw(&mut self, handle: &Self::Handle, transparent_pass: bool);
}


/// Build the mesh of a chunk from scratch. For every solid block, each of
/// the six faces is emitted only when its neighbor does not occlude it: air,
/// transparent and unloaded neighbors all leave the face visible. Neighbors
/// inside the chunk's grid are read directly, neighbors beyond it are
/// resolved through `occlusion` with world coordinates, so the result does
/// not depend on the construction order of surrounding chunks. Faces land in
/// the opaque or transparent buffer depending on the emitting block, not the
/// neighbor.
pub fn build_chunk_mesh(chunk: &Chunk, origin: IVec3, occlusion: &impl OcclusionSource) -> ChunkMesh {

    let mut mesh = ChunkMesh::default();

    for x in 0..CHUNK_WIDTH as i32 {
        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_WIDTH as i32 {

                let pos = IVec3::new(x, y, z);
                let id = chunk.get_block(pos);
                if !block::is_solid(id) {
                    continue;
                }

                let info = block::from_id(id);
                let buffer = if info.transparent { &mut mesh.transparent } else { &mut mesh.opaque };

                for face in Face::ALL {

                    let neighbor = pos + face.delta();
                    let occluded = if in_grid(neighbor) {
                        block::is_occluding(chunk.get_block(neighbor))
                    } else {
                        occlusion.is_occluding(origin + neighbor)
                    };

                    if occluded {
                        continue;
                    }

                    let uvs = tile_uvs(info.texture(face));
                    let corners = &FACE_CORNERS[face as usize];
                    let brightness = face.brightness();

                    for i in 0..6 {
                        buffer.push(Vertex {
                            position: [
                                corners[i][0] + x as f32,
                                corners[i][1] + y as f32,
                                corners[i][2] + z as f32,
                            ],
                            uv: uvs[i],
                            brightness,
                        });
                    }

                }

            }
        }
    }

    mesh

}

#[inline]
fn in_grid(pos: IVec3) -> bool {
    pos.x >= 0 && pos.x < CHUNK_WIDTH as i32
        && pos.y >= 0 && pos.y < CHUNK_HEIGHT as i32
        && pos.z >= 0 && pos.z < CHUNK_WIDTH as i32
}


#[cfg(test)]
mod tests {

    use super::*;

    /// An occlusion source with no loaded neighbor at all.
    struct NoNeighbors;

    impl OcclusionSource for NoNeighbors {
        fn is_occluding(&self, _pos: IVec3) -> bool {
            false
        }
    }

    /// An occlusion source claiming everything outside the chunk is solid.
    struct SolidNeighbors;

    impl OcclusionSource for SolidNeighbors {
        fn is_occluding(&self, _pos: IVec3) -> bool {
            true
        }
    }

    #[test]
    fn vertex_layout() {
        let vertex = Vertex { position: [1.0, 2.0, 3.0], uv: [0.5, 0.5], brightness: 1.0 };
        // Interleaved 3 + 2 + 1 floats, no padding.
        assert_eq!(bytemuck::bytes_of(&vertex).len(), 24);
    }

    #[test]
    fn single_block_emits_six_faces() {
        let mut chunk = Chunk::new();
        chunk.set_block(IVec3::new(4, 4, 4), crate::block::STONE);
        let mesh = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        assert_eq!(mesh.opaque.len(), 6 * 6);
        assert!(mesh.transparent.is_empty());
    }

    #[test]
    fn adjacent_blocks_share_no_face() {
        let mut chunk = Chunk::new();
        chunk.set_block(IVec3::new(4, 4, 4), crate::block::STONE);
        chunk.set_block(IVec3::new(5, 4, 4), crate::block::DIRT);
        let mesh = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        // The two touching faces are culled from both blocks.
        assert_eq!(mesh.opaque.len(), 2 * 6 * 6 - 2 * 6);
    }

    #[test]
    fn transparent_neighbor_does_not_occlude() {
        let mut chunk = Chunk::new();
        chunk.set_block(IVec3::new(4, 4, 4), crate::block::STONE);
        chunk.set_block(IVec3::new(5, 4, 4), crate::block::GLASS);
        let mesh = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        // The stone keeps all six faces, the glass face against the stone is
        // culled since stone occludes.
        assert_eq!(mesh.opaque.len(), 6 * 6);
        assert_eq!(mesh.transparent.len(), 5 * 6);
    }

    #[test]
    fn border_faces_query_the_occlusion_source() {
        let mut chunk = Chunk::new();
        chunk.set_block(IVec3::new(0, 4, 4), crate::block::STONE);
        let open = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        let closed = build_chunk_mesh(&chunk, IVec3::ZERO, &SolidNeighbors);
        assert_eq!(open.opaque.len(), 6 * 6);
        // Only the NegX face leaves the grid for this block.
        assert_eq!(closed.opaque.len(), 5 * 6);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut chunk = Chunk::new();
        chunk.fill_block(IVec3::new(0, 0, 0), IVec3::new(16, 3, 16), crate::block::STONE);
        let first = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        let second = build_chunk_mesh(&chunk, IVec3::ZERO, &NoNeighbors);
        assert_eq!(first, second);
    }

    #[test]
    fn tile_uvs_rect() {
        let size = 1.0 / TILES_PER_ROW as f32;
        // Tile 17 sits at column 1, row 1 of the atlas.
        let uvs = tile_uvs(17);
        for [u, v] in uvs {
            assert!(u >= size && u <= 2.0 * size);
            assert!(v >= size && v <= 2.0 * size);
        }
    }

}
