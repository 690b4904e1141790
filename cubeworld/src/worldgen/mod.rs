//! Procedural world generation: terrain columns and tree features.

use glam::IVec3;

use crate::chunk::{Chunk, CHUNK_WIDTH, CHUNK_HEIGHT, calc_chunk_pos_unchecked, calc_chunk_origin};
use crate::block;

pub mod terrain;
pub mod tree;


/// Configuration of the world generator. Seeds and shaping constants are
/// explicit so tests and tools can run with alternate fixtures, the defaults
/// reproduce the stock world.
#[derive(Debug, Clone, PartialEq)]
pub struct GenConfig {
    /// Seed of the height noise.
    pub seed: i32,
    /// Horizontal frequency of the height noise.
    pub height_scale: f32,
    /// Amplitude of the height noise, in blocks.
    pub height_amplitude: f32,
    /// Height of a column when the noise is zero.
    pub base_height: f32,
    /// Columns at most two blocks above this level may turn to sand.
    pub sea_level: i32,
    /// Seed of the tree column hash, independent from the height noise so
    /// trees do not correlate with terrain shape.
    pub tree_seed: i32,
    /// Fraction of columns that grow a tree.
    pub tree_density: f32,
    /// Seed of the sand patch noise.
    pub sand_seed: i32,
    /// Horizontal frequency of the sand patch noise.
    pub sand_scale: f32,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            height_scale: 0.05,
            height_amplitude: 10.0,
            base_height: 8.0,
            sea_level: 7,
            tree_seed: 9999,
            tree_density: 0.01,
            sand_seed: 4242,
            sand_scale: 0.1,
        }
    }
}


/// The chunk generator produces the full block content of a chunk from its
/// configuration alone: any chunk can be generated independently of its
/// neighbors and in any order, and chunk borders tile seamlessly.
pub struct ChunkGenerator {
    /// The generation configuration, fixed at creation.
    config: GenConfig,
}

impl ChunkGenerator {

    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    /// Get the generator configuration.
    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Generate the terrain and tree features of the chunk at the given
    /// coordinate. Tree placements landing outside of the chunk's own grid
    /// are pushed to `overflow` as absolute world positions, for the caller
    /// to route to the owning chunks.
    pub fn gen_terrain(&self, cx: i32, cz: i32, chunk: &mut Chunk, overflow: &mut Vec<(IVec3, u8)>) {

        let origin = calc_chunk_origin(cx, cz);
        let config = &self.config;

        for x in 0..CHUNK_WIDTH as i32 {
            for z in 0..CHUNK_WIDTH as i32 {

                let wx = origin.x + x;
                let wz = origin.z + z;
                let height = terrain::height_at(config, wx, wz);
                let sand = terrain::should_be_sand(config, wx, wz);

                for y in 0..CHUNK_HEIGHT as i32 {
                    let id = if y > height {
                        block::AIR
                    } else if y == height {
                        if sand { block::SAND } else { block::GRASS }
                    } else if y < height - 3 {
                        block::STONE
                    } else {
                        block::DIRT
                    };
                    chunk.set_block(IVec3::new(x, y, z), id);
                }

                // Trees grow from grass surfaces lying inside the grid, their
                // placements overwrite the terrain written above.
                if !sand
                    && height >= 0 && height < CHUNK_HEIGHT as i32
                    && terrain::should_spawn_tree(config, wx, wz)
                {
                    for (pos, id) in tree::generate(IVec3::new(wx, height + 1, wz)) {
                        if pos.y < 0 || pos.y >= CHUNK_HEIGHT as i32 {
                            continue;
                        }
                        if calc_chunk_pos_unchecked(pos) == (cx, cz) {
                            chunk.set_block(pos, id);
                        } else {
                            overflow.push((pos, id));
                        }
                    }
                }

            }
        }

    }

}


#[cfg(test)]
mod tests {

    use super::*;

    /// A configuration with flat terrain and no features, handy as a base
    /// for targeted fixtures.
    fn flat_config() -> GenConfig {
        GenConfig {
            height_amplitude: 0.0,
            tree_density: 0.0,
            sea_level: -10,
            ..GenConfig::default()
        }
    }

    #[test]
    fn flat_terrain_layers() {

        let generator = ChunkGenerator::new(flat_config());
        let mut chunk = Chunk::new();
        let mut overflow = Vec::new();
        generator.gen_terrain(0, 0, &mut chunk, &mut overflow);

        assert!(overflow.is_empty());
        for x in 0..CHUNK_WIDTH as i32 {
            for z in 0..CHUNK_WIDTH as i32 {
                assert_eq!(chunk.get_block(IVec3::new(x, 8, z)), block::GRASS);
                assert_eq!(chunk.get_block(IVec3::new(x, 9, z)), block::AIR);
                assert_eq!(chunk.get_block(IVec3::new(x, 7, z)), block::DIRT);
                assert_eq!(chunk.get_block(IVec3::new(x, 5, z)), block::DIRT);
                assert_eq!(chunk.get_block(IVec3::new(x, 4, z)), block::STONE);
                assert_eq!(chunk.get_block(IVec3::new(x, 0, z)), block::STONE);
            }
        }

    }

    #[test]
    fn deterministic() {

        // The same chunk generates identically every time, generation holds
        // no state besides its configuration.
        let generator = ChunkGenerator::new(GenConfig::default());

        let mut first = Chunk::new();
        let mut second = Chunk::new();
        let mut overflow = Vec::new();
        generator.gen_terrain(3, -2, &mut first, &mut overflow);
        overflow.clear();
        generator.gen_terrain(3, -2, &mut second, &mut overflow);

        for x in 0..CHUNK_WIDTH as i32 {
            for y in 0..CHUNK_HEIGHT as i32 {
                for z in 0..CHUNK_WIDTH as i32 {
                    let pos = IVec3::new(x, y, z);
                    assert_eq!(first.get_block(pos), second.get_block(pos));
                }
            }
        }

    }

    #[test]
    fn borders_tile_seamlessly() {
        // The surface row a chunk generates along its east border matches
        // the heights its neighbor derives for those same world columns.
        let generator = ChunkGenerator::new(GenConfig::default());
        let config = generator.config();
        let mut chunk = Chunk::new();
        let mut overflow = Vec::new();
        generator.gen_terrain(0, 0, &mut chunk, &mut overflow);
        for z in 0..CHUNK_WIDTH as i32 {
            let height = terrain::height_at(config, 15, z);
            if (0..CHUNK_HEIGHT as i32).contains(&height) {
                let id = chunk.get_block(IVec3::new(15, height, z));
                assert!(id == block::GRASS || id == block::SAND
                    || id == block::LOG || id == block::LEAVES);
            }
        }
    }

    #[test]
    fn trees_overflow_into_neighbor_coords() {

        // With a tree on every column, canopies of border columns must leak
        // into neighboring chunk coordinates and nowhere else.
        let config = GenConfig {
            tree_density: 1.1,
            ..flat_config()
        };
        let generator = ChunkGenerator::new(config);
        let mut chunk = Chunk::new();
        let mut overflow = Vec::new();
        generator.gen_terrain(0, 0, &mut chunk, &mut overflow);

        assert!(!overflow.is_empty());
        for &(pos, id) in &overflow {
            assert!(id == block::LEAVES || id == block::LOG);
            assert_ne!(calc_chunk_pos_unchecked(pos), (0, 0));
            assert!(pos.x >= -2 && pos.x < CHUNK_WIDTH as i32 + 2);
            assert!(pos.z >= -2 && pos.z < CHUNK_WIDTH as i32 + 2);
        }

    }

}
