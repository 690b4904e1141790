//! A headless driver walking a viewer through a world, exercising chunk
//! streaming, generation, persistence and meshing without a graphics API. It
//! plays the role of the rendering collaborator by tallying every buffer it
//! is handed.

pub mod config;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::cell::Cell;
use std::thread;
use std::rc::Rc;

use glam::DVec3;

use tracing::{info, warn};

use cubeworld::mesh::{ChunkRenderer, Vertex};
use cubeworld::world::{World, Event};
use cubeworld::worldgen::GenConfig;
use cubeworld::block;


/// Target tick duration. Currently 20 TPS, so 50 ms/tick.
const TICK_DURATION: Duration = Duration::from_millis(50);
/// Horizontal viewer speed, in blocks per second.
const VIEWER_SPEED: f64 = 10.0;
/// Maximum block reach of the simulated player.
const REACH: f64 = 6.0;


pub fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || running_handler.store(false, Ordering::Relaxed)).unwrap();

    let gen_config = GenConfig {
        seed: config::seed(),
        ..GenConfig::default()
    };

    let mut world = World::new(config::save_dir(), gen_config, config::render_distance());
    world.swap_events(Some(Vec::new()));

    let mut renderer = TallyRenderer::default();
    let mut buffers: HashMap<(i32, i32), ChunkBuffers> = HashMap::new();

    let mut viewer = DVec3::new(8.0, 12.0, 8.0);
    let mut tick = 0u64;

    info!("walking from {viewer}, seed {}, render distance {}",
        world.config().seed, world.render_distance());

    while running.load(Ordering::Relaxed) {

        let start = Instant::now();

        viewer.x += VIEWER_SPEED * TICK_DURATION.as_secs_f64();
        if let Err(err) = world.update(viewer) {
            warn!("world update failed, stopping: {err}");
            break;
        }

        // Every couple of seconds, dig one block out of the ground below.
        if tick % 40 == 0 {
            if let Some((hit_pos, _place_pos)) = world.ray_trace_blocks(viewer, DVec3::NEG_Y, REACH) {
                world.set_block(hit_pos, block::AIR);
            }
        }

        // Mirror world changes into the renderer. A stale buffer is dropped,
        // and therefore released, before its replacement is uploaded.
        for event in world.swap_events(Some(Vec::new())).into_iter().flatten() {
            match event {
                Event::ChunkUnloaded { cx, cz } => {
                    buffers.remove(&(cx, cz));
                }
                Event::MeshRebuilt { cx, cz } => {
                    if let Some(mesh) = world.get_mesh(cx, cz) {
                        buffers.remove(&(cx, cz));
                        buffers.insert((cx, cz), ChunkBuffers {
                            opaque: renderer.upload(&mesh.opaque),
                            transparent: renderer.upload(&mesh.transparent),
                        });
                    }
                }
                _ => {}
            }
        }

        // Opaque pass first, transparent pass last.
        for chunk_buffers in buffers.values() {
            renderer.draw(&chunk_buffers.opaque, false);
        }
        for chunk_buffers in buffers.values() {
            renderer.draw(&chunk_buffers.transparent, true);
        }

        tick += 1;

        if tick % 100 == 0 {
            info!("tick {tick}: {} chunks, {} live buffers, {} vertices uploaded, {} drawn",
                world.chunk_count(), renderer.live(), renderer.uploaded_vertices(), renderer.drawn_vertices());
        }

        if config::ticks() != 0 && tick >= config::ticks() {
            break;
        }

        let elapsed = start.elapsed();
        match TICK_DURATION.checked_sub(elapsed) {
            Some(missing) => thread::sleep(missing),
            None => warn!("tick was too long ({elapsed:?})"),
        }

    }

    info!("stopping, saving {} chunks", world.chunk_count());
    world.save_all().unwrap();

}


/// The two uploaded buffers of a chunk.
struct ChunkBuffers {
    opaque: TallyBuffer,
    transparent: TallyBuffer,
}

/// A renderer stand-in that only counts what it is asked to do, while still
/// tracking buffer lifetimes the way a real collaborator would.
#[derive(Default)]
struct TallyRenderer {
    /// Number of buffers currently alive, shared with their handles.
    live: Rc<Cell<u64>>,
    /// Total vertices uploaded since start.
    uploaded_vertices: u64,
    /// Total vertices drawn since start.
    drawn_vertices: u64,
}

impl TallyRenderer {

    fn live(&self) -> u64 {
        self.live.get()
    }

    fn uploaded_vertices(&self) -> u64 {
        self.uploaded_vertices
    }

    fn drawn_vertices(&self) -> u64 {
        self.drawn_vertices
    }

}

impl ChunkRenderer for TallyRenderer {

    type Handle = TallyBuffer;

    fn upload(&mut self, vertices: &[Vertex]) -> TallyBuffer {
        self.uploaded_vertices += vertices.len() as u64;
        self.live.set(self.live.get() + 1);
        TallyBuffer {
            vertex_count: vertices.len(),
            live: Rc::clone(&self.live),
        }
    }

    fn draw(&mut self, handle: &TallyBuffer, _transparent_pass: bool) {
        self.drawn_vertices += handle.vertex_count as u64;
    }

}

/// A fake buffer handle, its drop releases the "resource".
struct TallyBuffer {
    vertex_count: usize,
    live: Rc<Cell<u64>>,
}

impl Drop for TallyBuffer {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}
