//! The configuration for the simulator, given from environment variables and
//! lazy initialized when needed.

use once_cell::sync::OnceCell;
use std::env;


/// Return the save directory of the simulated world.
///
/// To change it, set `CUBEWORLD_SAVES=<path>`.
pub fn save_dir() -> &'static str {
    static ENV: OnceCell<String> = OnceCell::new();
    ENV.get_or_init(|| {
        env::var("CUBEWORLD_SAVES")
            .unwrap_or_else(|_| "saves/world".to_string())
    })
}

/// Return the generation seed of the simulated world.
///
/// To change it, set `CUBEWORLD_SEED=<i32>`.
pub fn seed() -> i32 {
    static ENV: OnceCell<i32> = OnceCell::new();
    *ENV.get_or_init(|| {
        env::var("CUBEWORLD_SEED").ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1337)
    })
}

/// Return the streaming radius around the viewer, in chunks.
///
/// To change it, set `CUBEWORLD_RENDER_DISTANCE=<i32>`.
pub fn render_distance() -> i32 {
    static ENV: OnceCell<i32> = OnceCell::new();
    *ENV.get_or_init(|| {
        env::var("CUBEWORLD_RENDER_DISTANCE").ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(cubeworld::world::DEFAULT_RENDER_DISTANCE)
    })
}

/// Return the number of ticks to simulate before stopping, zero meaning to
/// run until interrupted.
///
/// To change it, set `CUBEWORLD_TICKS=<u64>`.
pub fn ticks() -> u64 {
    static ENV: OnceCell<u64> = OnceCell::new();
    *ENV.get_or_init(|| {
        env::var("CUBEWORLD_TICKS").ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    })
}
