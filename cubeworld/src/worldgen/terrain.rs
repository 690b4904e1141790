//! Column functions deriving the terrain shape from noise. Every function is
//! a pure function of the configuration and a world column, so columns can
//! be evaluated in any order and chunk borders tile seamlessly.

use crate::util::noise;

use super::GenConfig;


/// Get the terrain height of the given world column, the Y coordinate of the
/// surface block.
pub fn height_at(config: &GenConfig, x: i32, z: i32) -> i32 {
    let n = noise::sample(x as f32 * config.height_scale, z as f32 * config.height_scale, config.seed);
    (config.base_height + n * config.height_amplitude).floor() as i32
}

/// Return true if a tree should grow on the given world column. The decision
/// is an independent hash of the column so trees do not follow the height
/// noise.
pub fn should_spawn_tree(config: &GenConfig, x: i32, z: i32) -> bool {
    let mut hash = x.wrapping_mul(374761393) ^ z.wrapping_mul(668265263) ^ config.tree_seed;
    hash = (hash ^ (hash >> 13)).wrapping_mul(1274126177);
    let value = (hash & 0xFFFF) as f32 / 0xFFFF as f32;
    value < config.tree_density
}

/// Return true if the surface of the given world column should be sand
/// rather than grass. Only columns at most two blocks above sea level
/// qualify, then a secondary noise cuts patches: near-certain right at sea
/// level, rarer with every block above it.
pub fn should_be_sand(config: &GenConfig, x: i32, z: i32) -> bool {

    let height = height_at(config, x, z);
    if height > config.sea_level + 2 {
        return false;
    }

    let sand_noise = noise::sample(x as f32 * config.sand_scale, z as f32 * config.sand_scale, config.sand_seed);
    let distance_from_sea = (height - config.sea_level) as f32;
    sand_noise > distance_from_sea * 0.4

}
