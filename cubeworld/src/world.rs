//! Data structure storing the streamed world at runtime: the loaded chunks
//! with their meshes, the update logic loading, generating, saving and
//! evicting chunks around the viewer, and the block query and mutation entry
//! points.

use std::collections::HashMap;
use std::iter::FusedIterator;
use std::path::PathBuf;
use std::mem;

use glam::{IVec3, DVec3};
use indexmap::{IndexMap, IndexSet};

use tracing::{trace, debug, warn};

use crate::chunk::{Chunk,
    calc_chunk_pos, calc_chunk_pos_unchecked, calc_chunk_origin,
    CHUNK_WIDTH};
use crate::worldgen::{ChunkGenerator, GenConfig};
use crate::mesh::{self, ChunkMesh, OcclusionSource};
use crate::storage::{ChunkStorage, StorageError};
use crate::util::Face;
use crate::block;


/// Default streaming radius around the viewer's chunk, in chunks.
pub const DEFAULT_RENDER_DISTANCE: i32 = 4;


/// # Components
///
/// This data structure stores the loaded chunks of a world, keyed by their
/// 2D chunk coordinate, together with the triangle mesh derived from each
/// chunk's grid. Chunks enter the index either freshly generated or read
/// back from their save file, and leave it through save-and-evict once the
/// viewer walks away. Adjacency is never stored: neighbors are resolved by
/// coordinate arithmetic on demand, so chunks hold no reference to the world
/// or to each other.
///
/// # Logic
///
/// All mutation happens through [`update`](Self::update) and
/// [`set_block`](Self::set_block), synchronously on the caller's thread:
/// there are no background workers and no partially streamed state between
/// two updates. A concurrent caller would need to wrap the whole world
/// behind its own synchronization.
///
/// # Events
///
/// The structure allows listening for changes through a queue of [`Event`],
/// disabled by default and enabled by swapping a `Vec<Event>` in with
/// [`swap_events`](Self::swap_events). Swapping the queue out again is the
/// only way of reading the accumulated events.
pub struct World {
    /// When enabled, this contains the list of events that happened in the
    /// world since it was last swapped. Temporarily taking ownership of the
    /// queue lets the caller keep mutating the world while reading them.
    events: Option<Vec<Event>>,
    /// The chunk generator, configured once at creation.
    generator: ChunkGenerator,
    /// Persistent storage backing the loaded chunks.
    storage: ChunkStorage,
    /// Chebyshev streaming radius around the viewer's chunk, inclusive.
    render_distance: i32,
    /// The mapping of loaded chunks and their meshes. Iteration follows the
    /// insertion order, so consumers see a stable ordering from one frame to
    /// the next.
    chunks: IndexMap<(i32, i32), ChunkComponent>,
    /// Tree placements generated by one chunk but owned by a coordinate that
    /// was not loaded at that time, applied when the owning chunk loads.
    pending_blocks: HashMap<(i32, i32), Vec<(IVec3, u8)>>,
}

/// A loaded chunk and the mesh derived from its grid.
struct ChunkComponent {
    /// The chunk block storage.
    chunk: Box<Chunk>,
    /// The current triangle mesh of the chunk's blocks.
    mesh: ChunkMesh,
}

impl World {

    /// Create a new world persisted under the given save directory, with the
    /// given generator configuration and streaming radius. No chunk is
    /// loaded until the first [`update`](Self::update).
    pub fn new(save_dir: impl Into<PathBuf>, config: GenConfig, render_distance: i32) -> Self {
        Self {
            events: None,
            generator: ChunkGenerator::new(config),
            storage: ChunkStorage::new(save_dir),
            render_distance,
            chunks: IndexMap::new(),
            pending_blocks: HashMap::new(),
        }
    }

    /// This function can be used to swap in a new events queue and return
    /// the previous one if relevant. Giving *None* disables events
    /// registration. Swapping the events out is the only way of reading them
    /// afterward.
    pub fn swap_events(&mut self, events: Option<Vec<Event>>) -> Option<Vec<Event>> {
        mem::replace(&mut self.events, events)
    }

    /// Return true if this world has an internal events queue.
    pub fn has_events(&self) -> bool {
        self.events.is_some()
    }

    /// Push an event in this world. This only actually pushes the event if
    /// events are enabled.
    #[inline]
    fn push_event(&mut self, event: Event) {
        if let Some(events) = &mut self.events {
            events.push(event);
        }
    }

    /// Get the generation configuration of this world.
    pub fn config(&self) -> &GenConfig {
        self.generator.config()
    }

    /// Get the streaming radius of this world, in chunks.
    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    // =================== //
    //        CHUNKS       //
    // =================== //

    /// Return true if a given chunk is present in the world.
    pub fn contains_chunk(&self, cx: i32, cz: i32) -> bool {
        self.chunks.contains_key(&(cx, cz))
    }

    /// Get a reference to a chunk, if loaded.
    pub fn get_chunk(&self, cx: i32, cz: i32) -> Option<&Chunk> {
        self.chunks.get(&(cx, cz)).map(|comp| &*comp.chunk)
    }

    /// Get the current mesh of a chunk, if loaded.
    pub fn get_mesh(&self, cx: i32, cz: i32) -> Option<&ChunkMesh> {
        self.chunks.get(&(cx, cz)).map(|comp| &comp.mesh)
    }

    /// Iterate over all loaded chunks and their meshes, in insertion order.
    pub fn iter_meshes(&self) -> impl Iterator<Item = ((i32, i32), &ChunkMesh)> + '_ {
        self.chunks.iter().map(|(&coord, comp)| (coord, &comp.mesh))
    }

    /// Number of loaded chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Insert a chunk at the given coordinate, build its mesh and rebuild
    /// the mesh of every loaded horizontal neighbor, whose border faces may
    /// have become hidden or exposed. Streaming goes through this for every
    /// chunk it loads, tools and tests can use it to stage a world without
    /// touching storage.
    pub fn insert_chunk(&mut self, cx: i32, cz: i32, chunk: Box<Chunk>) {
        self.insert_loaded(cx, cz, chunk);
        self.rebuild_mesh(cx, cz);
        for face in Face::HORIZONTAL {
            let delta = face.delta();
            self.rebuild_mesh(cx + delta.x, cz + delta.z);
        }
    }

    /// Insert a loaded chunk in the index, applying any pending placement
    /// owned by its coordinate first. The mesh starts empty, the caller
    /// decides when to build it.
    fn insert_loaded(&mut self, cx: i32, cz: i32, mut chunk: Box<Chunk>) {
        if let Some(pending) = self.pending_blocks.remove(&(cx, cz)) {
            trace!("applying {} pending placements to chunk {cx}/{cz}", pending.len());
            for (pos, id) in pending {
                chunk.set_block(pos, id);
            }
        }
        self.chunks.insert((cx, cz), ChunkComponent { chunk, mesh: ChunkMesh::default() });
        self.push_event(Event::ChunkLoaded { cx, cz });
    }

    // =================== //
    //      STREAMING      //
    // =================== //

    /// Update the set of loaded chunks around the given viewer position.
    ///
    /// Every coordinate within the streaming radius (Chebyshev distance,
    /// inclusive) of the viewer's chunk gets loaded: from its save file when
    /// one exists, generated otherwise. Every loaded coordinate beyond the
    /// radius is saved and then evicted, in that order, so an edited chunk
    /// can never be dropped unsaved. Meshes are rebuilt once per impacted
    /// chunk: each newly loaded chunk, its loaded horizontal neighbors, and
    /// any loaded chunk that received cross-border tree placements.
    ///
    /// Chunks that fail to read fall back to generation with a warning,
    /// while a failed save is returned as an error and aborts the update
    /// before the affected chunk is evicted.
    pub fn update(&mut self, viewer: DVec3) -> Result<(), StorageError> {

        let (center_cx, center_cz) = calc_chunk_pos_unchecked(viewer.floor().as_ivec3());
        let mut remesh = IndexSet::new();

        // Load every missing coordinate within the streaming square.
        let range = ChunkRange::new(
            center_cx - self.render_distance, center_cz - self.render_distance,
            center_cx + self.render_distance, center_cz + self.render_distance);

        for (cx, cz) in range {

            if self.chunks.contains_key(&(cx, cz)) {
                continue;
            }

            let chunk = match self.storage.load(cx, cz) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => self.generate_chunk(cx, cz, &mut remesh),
                Err(err) => {
                    // A chunk that cannot be read behaves like a chunk that
                    // was never saved, only write failures are fatal.
                    warn!("failed to read chunk {cx}/{cz}, regenerating: {err}");
                    self.generate_chunk(cx, cz, &mut remesh)
                }
            };

            self.insert_loaded(cx, cz, chunk);

            remesh.insert((cx, cz));
            for face in Face::HORIZONTAL {
                let delta = face.delta();
                let neighbor = (cx + delta.x, cz + delta.z);
                if self.chunks.contains_key(&neighbor) {
                    remesh.insert(neighbor);
                }
            }

        }

        // Save and evict every chunk beyond the streaming square. The save
        // happens before the entry is dropped.
        let evict = self.chunks.keys().copied()
            .filter(|&(cx, cz)| {
                (cx - center_cx).abs() > self.render_distance
                    || (cz - center_cz).abs() > self.render_distance
            })
            .collect::<Vec<_>>();

        for (cx, cz) in evict {
            if let Some(comp) = self.chunks.get(&(cx, cz)) {
                self.storage.save(cx, cz, &comp.chunk)?;
            }
            self.chunks.shift_remove(&(cx, cz));
            remesh.shift_remove(&(cx, cz));
            trace!("unloaded chunk {cx}/{cz}");
            self.push_event(Event::ChunkUnloaded { cx, cz });
        }

        // Rebuild once per impacted chunk, a coordinate may have been marked
        // several times above.
        for (cx, cz) in remesh {
            self.rebuild_mesh(cx, cz);
        }

        Ok(())

    }

    /// Generate the chunk at the given coordinate and route the tree
    /// placements landing outside of it: directly into already loaded
    /// chunks, which are then marked for remesh, otherwise into the pending
    /// queue of the owning coordinate.
    fn generate_chunk(&mut self, cx: i32, cz: i32, remesh: &mut IndexSet<(i32, i32)>) -> Box<Chunk> {

        let mut chunk = Chunk::new();
        let mut overflow = Vec::new();
        self.generator.gen_terrain(cx, cz, &mut chunk, &mut overflow);
        trace!("generated chunk {cx}/{cz}");

        for (pos, id) in overflow {
            let coord = calc_chunk_pos_unchecked(pos);
            if let Some(comp) = self.chunks.get_mut(&coord) {
                comp.chunk.set_block(pos, id);
                remesh.insert(coord);
            } else {
                self.pending_blocks.entry(coord).or_default().push((pos, id));
            }
        }

        chunk

    }

    /// Save every loaded chunk without evicting anything, typically before
    /// shutting down.
    pub fn save_all(&self) -> Result<(), StorageError> {
        for (&(cx, cz), comp) in &self.chunks {
            self.storage.save(cx, cz, &comp.chunk)?;
        }
        Ok(())
    }

    // =================== //
    //        BLOCKS       //
    // =================== //

    /// Get the block at the given world position. Positions in unloaded
    /// chunks, as well as positions above or below the world, read as air,
    /// so callers never need a failure branch for missing neighbors.
    pub fn get_block(&self, pos: IVec3) -> u8 {
        let Some((cx, cz)) = calc_chunk_pos(pos) else {
            return block::AIR;
        };
        match self.get_chunk(cx, cz) {
            Some(chunk) => chunk.get_block(pos),
            None => block::AIR,
        }
    }

    /// Return true if the block at the given world position is solid.
    /// Unloaded positions are not solid.
    pub fn is_block_solid(&self, pos: IVec3) -> bool {
        block::is_solid(self.get_block(pos))
    }

    /// Set the block at the given world position and return the previous
    /// block id. If the owning chunk is not loaded the edit is dropped and
    /// none is returned. The chunk's mesh is rebuilt, along with the mesh of
    /// each loaded neighbor the edited cell borders on.
    pub fn set_block(&mut self, pos: IVec3, id: u8) -> Option<u8> {

        let (cx, cz) = calc_chunk_pos(pos)?;
        let comp = self.chunks.get_mut(&(cx, cz))?;

        let prev_id = comp.chunk.get_block(pos);
        if prev_id == id {
            return Some(prev_id);
        }

        comp.chunk.set_block(pos, id);
        trace!("set block {} at {pos}", block::from_id(id).name);
        self.push_event(Event::BlockSet { pos, id, prev_id });

        self.rebuild_mesh(cx, cz);

        // A border edit also changes the visible faces of the adjacent
        // chunk.
        let local = pos - calc_chunk_origin(cx, cz);
        if local.x == 0 { self.rebuild_mesh(cx - 1, cz); }
        if local.x == CHUNK_WIDTH as i32 - 1 { self.rebuild_mesh(cx + 1, cz); }
        if local.z == 0 { self.rebuild_mesh(cx, cz - 1); }
        if local.z == CHUNK_WIDTH as i32 - 1 { self.rebuild_mesh(cx, cz + 1); }

        Some(prev_id)

    }

    // =================== //
    //        MESHES       //
    // =================== //

    /// Rebuild the mesh of the chunk at the given coordinate from scratch,
    /// replacing any previous mesh. Does nothing if the chunk is not loaded.
    /// Rebuilding twice without a block change yields an identical mesh.
    pub fn rebuild_mesh(&mut self, cx: i32, cz: i32) {
        let Some(comp) = self.chunks.get(&(cx, cz)) else {
            return;
        };
        let mesh = mesh::build_chunk_mesh(&comp.chunk, calc_chunk_origin(cx, cz), self);
        debug!("rebuilt mesh of chunk {cx}/{cz}, {} vertices", mesh.vertex_count());
        if let Some(comp) = self.chunks.get_mut(&(cx, cz)) {
            comp.mesh = mesh;
        }
        self.push_event(Event::MeshRebuilt { cx, cz });
    }

    // =================== //
    //       RAY TRACE     //
    // =================== //

    /// Trace a ray from an origin along a direction, visiting voxels in
    /// exact traversal order. Return the first solid voxel hit together with
    /// the voxel crossed just before it, which is the natural placement cell
    /// against the hit face. The traversal never reports the voxel
    /// containing the origin itself, and gives up once it has travelled
    /// `max_reach` along the ray.
    pub fn ray_trace_blocks(&self, origin: DVec3, dir: DVec3, max_reach: f64) -> Option<(IVec3, IVec3)> {

        let mut pos = origin.floor().as_ivec3();
        let start_pos = pos;
        let mut prev_pos = pos;

        let step = IVec3::new(
            if dir.x >= 0.0 { 1 } else { -1 },
            if dir.y >= 0.0 { 1 } else { -1 },
            if dir.z >= 0.0 { 1 } else { -1 },
        );

        // Parametric distance along the ray between two successive grid
        // boundaries of each axis.
        let t_delta = (1.0 / dir).abs();

        // Parametric distance from the origin to the first boundary crossed
        // on each axis.
        let mut t_max = DVec3::new(
            (if step.x > 0 { origin.x.floor() + 1.0 - origin.x } else { origin.x - origin.x.floor() }) * t_delta.x,
            (if step.y > 0 { origin.y.floor() + 1.0 - origin.y } else { origin.y - origin.y.floor() }) * t_delta.y,
            (if step.z > 0 { origin.z.floor() + 1.0 - origin.z } else { origin.z - origin.z.floor() }) * t_delta.z,
        );

        loop {

            // Step into the next voxel along whichever axis crosses its
            // boundary first.
            if t_max.x < t_max.y && t_max.x < t_max.z {
                if t_max.x > max_reach {
                    return None;
                }
                prev_pos = pos;
                pos.x += step.x;
                t_max.x += t_delta.x;
            } else if t_max.y < t_max.z {
                if t_max.y > max_reach {
                    return None;
                }
                prev_pos = pos;
                pos.y += step.y;
                t_max.y += t_delta.y;
            } else {
                if t_max.z > max_reach {
                    return None;
                }
                prev_pos = pos;
                pos.z += step.z;
                t_max.z += t_delta.z;
            }

            if pos != start_pos && self.is_block_solid(pos) {
                return Some((pos, prev_pos));
            }

        }

    }

}

impl OcclusionSource for World {

    fn is_occluding(&self, pos: IVec3) -> bool {
        block::is_occluding(self.get_block(pos))
    }

}


/// An event that happened in the world, retrieved after the fact through
/// [`World::swap_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A chunk entered the index, freshly generated or read back from disk.
    ChunkLoaded { cx: i32, cz: i32 },
    /// A chunk was saved and dropped from the index.
    ChunkUnloaded { cx: i32, cz: i32 },
    /// A chunk's mesh was rebuilt from its grid.
    MeshRebuilt { cx: i32, cz: i32 },
    /// A block changed.
    BlockSet { pos: IVec3, id: u8, prev_id: u8 },
}


/// An iterator of chunk coordinates in a rectangle, both start and end are
/// inclusive.
pub struct ChunkRange {
    cx: i32,
    cz: i32,
    start_cx: i32,
    end_cx: i32,
    end_cz: i32,
}

impl ChunkRange {

    /// Construct a chunk range iterator, note that both start and end are
    /// included in the range.
    #[inline]
    pub fn new(start_cx: i32, start_cz: i32, end_cx: i32, end_cz: i32) -> Self {
        Self {
            cx: start_cx,
            cz: start_cz,
            start_cx,
            end_cx,
            end_cz,
        }
    }

}

impl FusedIterator for ChunkRange {}
impl Iterator for ChunkRange {

    type Item = (i32, i32);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {

        if self.cx > self.end_cx || self.cz > self.end_cz {
            return None;
        }

        let ret = (self.cx, self.cz);

        self.cx += 1;
        if self.cx > self.end_cx {
            self.cx = self.start_cx;
            self.cz += 1;
        }

        Some(ret)

    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::chunk::CHUNK_HEIGHT;
    use crate::worldgen::terrain;

    /// A world over a temporary save directory, kept alive by the returned
    /// guard.
    fn test_world(config: GenConfig, render_distance: i32) -> (World, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let world = World::new(dir.path().join("saves"), config, render_distance);
        (world, dir)
    }

    /// A configuration with flat terrain at the given height and no trees.
    fn flat_config(height: f32) -> GenConfig {
        GenConfig {
            base_height: height,
            height_amplitude: 0.0,
            tree_density: 0.0,
            sea_level: -10,
            ..GenConfig::default()
        }
    }

    #[test]
    fn chunk_range() {
        assert_eq!(ChunkRange::new(0, 0, 0, 0).collect::<Vec<_>>(), [(0, 0)]);
        assert_eq!(ChunkRange::new(0, 0, 1, 0).collect::<Vec<_>>(), [(0, 0), (1, 0)]);
        assert_eq!(ChunkRange::new(0, 0, 1, 1).collect::<Vec<_>>(), [(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(ChunkRange::new(0, 0, -1, 0).collect::<Vec<_>>(), []);
        assert_eq!(ChunkRange::new(0, 0, 0, -1).collect::<Vec<_>>(), []);
        assert_eq!(ChunkRange::new(0, 0, -1, -1).collect::<Vec<_>>(), []);
    }

    #[test]
    fn unloaded_reads_as_air() {
        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        assert_eq!(world.get_block(IVec3::new(5, 5, 5)), block::AIR);
        assert!(!world.is_block_solid(IVec3::new(5, 5, 5)));
        // Y is not tiled, out-of-range Y is air even in a loaded chunk.
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();
        assert!(world.is_block_solid(IVec3::new(5, 5, 5)));
        assert_eq!(world.get_block(IVec3::new(5, -1, 5)), block::AIR);
        assert_eq!(world.get_block(IVec3::new(5, CHUNK_HEIGHT as i32, 5)), block::AIR);
    }

    #[test]
    fn set_block_round_trip() {

        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        let pos = IVec3::new(4, 12, 4);
        assert_eq!(world.set_block(pos, block::GLASS), Some(block::AIR));
        assert_eq!(world.get_block(pos), block::GLASS);

        // Outside of any loaded chunk the edit is dropped.
        let far = IVec3::new(1000, 5, 1000);
        assert_eq!(world.set_block(far, block::DIRT), None);
        assert_eq!(world.get_block(far), block::AIR);

    }

    #[test]
    fn streaming_radius_is_exact() {

        let (mut world, _dir) = test_world(flat_config(8.0), 2);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        for cx in -4i32..=4 {
            for cz in -4i32..=4 {
                let expected = cx.abs() <= 2 && cz.abs() <= 2;
                assert_eq!(world.contains_chunk(cx, cz), expected, "chunk {cx}/{cz}");
            }
        }
        assert_eq!(world.chunk_count(), 25);
        assert_eq!(world.iter_meshes().count(), 25);
        assert!(world.iter_meshes().all(|(_, mesh)| mesh.vertex_count() > 0));

        // Walking one chunk east slides the window by one column.
        world.update(DVec3::new(24.0, 0.0, 8.0)).unwrap();
        assert_eq!(world.chunk_count(), 25);
        assert!(!world.contains_chunk(-2, 0));
        assert!(world.contains_chunk(3, 0));

    }

    #[test]
    fn eviction_round_trips_through_storage() {

        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        let pos = IVec3::new(4, 12, 4);
        world.set_block(pos, block::PINK_HEART);

        // Walk far enough that chunk (0, 0) is saved and evicted, then come
        // back and check the edit survived the round trip.
        world.update(DVec3::new(200.0, 0.0, 8.0)).unwrap();
        assert!(!world.contains_chunk(0, 0));
        assert_eq!(world.get_block(pos), block::AIR);

        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();
        assert_eq!(world.get_block(pos), block::PINK_HEART);

    }

    #[test]
    fn meshes_follow_streaming() {

        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        let mesh = world.get_mesh(0, 0).unwrap();
        assert_ne!(mesh.vertex_count(), 0);

        // On a flat world the interior of the ground is fully culled: only
        // the 16x16 top faces and the 16x16 world-bottom faces remain, side
        // borders are closed by the loaded neighbors.
        assert_eq!(mesh.opaque.len(), 2 * 16 * 16 * 6);

        // Rebuilding with no change must not alter the mesh.
        let before = mesh.vertex_count();
        world.rebuild_mesh(0, 0);
        assert_eq!(world.get_mesh(0, 0).unwrap().vertex_count(), before);

    }

    #[test]
    fn border_edit_rebuilds_neighbor() {

        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        let neighbor_before = world.get_mesh(-1, 0).unwrap().vertex_count();

        // Digging a hole on the shared border exposes one face of the
        // neighbor chunk.
        world.set_block(IVec3::new(0, 8, 4), block::AIR);
        let neighbor_after = world.get_mesh(-1, 0).unwrap().vertex_count();
        assert_eq!(neighbor_after, neighbor_before + 6);

    }

    #[test]
    fn two_adjacent_blocks_share_no_face() {

        let (mut world, _dir) = test_world(flat_config(2.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        let base = world.get_mesh(0, 0).unwrap().vertex_count();

        // A lone block floating over the ground shows all 6 faces.
        world.set_block(IVec3::new(4, 10, 4), block::STONE);
        assert_eq!(world.get_mesh(0, 0).unwrap().vertex_count(), base + 36);

        // Its new neighbor hides the shared pair of faces: two blocks, ten
        // exposed faces total.
        world.set_block(IVec3::new(5, 10, 4), block::STONE);
        assert_eq!(world.get_mesh(0, 0).unwrap().vertex_count(), base + 60);

    }

    #[test]
    fn transparent_blocks_mesh_separately() {

        let (mut world, _dir) = test_world(flat_config(2.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        world.set_block(IVec3::new(4, 10, 4), block::GLASS);
        let mesh = world.get_mesh(0, 0).unwrap();
        assert_eq!(mesh.transparent.len(), 36);
        let opaque_before = mesh.opaque.len();

        // The glass does not occlude the stone placed next to it, so the
        // stone keeps all six faces, while the stone hides the glass face
        // pressed against it.
        world.set_block(IVec3::new(5, 10, 4), block::STONE);
        let mesh = world.get_mesh(0, 0).unwrap();
        assert_eq!(mesh.opaque.len(), opaque_before + 36);
        assert_eq!(mesh.transparent.len(), 30);

    }

    #[test]
    fn insert_chunk_rebuilds_neighbors() {

        let (mut world, _dir) = test_world(flat_config(8.0), 1);

        let mut chunk = Chunk::new();
        chunk.fill_block(IVec3::new(0, 0, 0), IVec3::new(16, 9, 16), block::STONE);
        world.insert_chunk(0, 0, chunk);
        let open = world.get_mesh(0, 0).unwrap().vertex_count();

        let mut neighbor = Chunk::new();
        neighbor.fill_block(IVec3::new(0, 0, 0), IVec3::new(16, 9, 16), block::STONE);
        world.insert_chunk(1, 0, neighbor);

        // The shared border wall of 16x9 faces is now closed.
        let closed = world.get_mesh(0, 0).unwrap().vertex_count();
        assert_eq!(closed, open - 16 * 9 * 6);

    }

    #[test]
    fn ray_trace_hits_wall() {

        let (mut world, _dir) = test_world(flat_config(2.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();

        // A wall 3 units away along +X from an origin inside an air voxel.
        world.set_block(IVec3::new(3, 8, 0), block::STONE);

        let origin = DVec3::new(0.5, 8.5, 0.5);
        let hit = world.ray_trace_blocks(origin, DVec3::X, 6.0);
        assert_eq!(hit, Some((IVec3::new(3, 8, 0), IVec3::new(2, 8, 0))));

        // Out of reach.
        assert_eq!(world.ray_trace_blocks(origin, DVec3::X, 2.0), None);

        // The origin voxel itself is never reported, even when solid.
        let inside = DVec3::new(4.5, 1.5, 4.5);
        let hit = world.ray_trace_blocks(inside, DVec3::X, 6.0);
        assert_eq!(hit, Some((IVec3::new(5, 1, 4), IVec3::new(4, 1, 4))));

    }

    #[test]
    fn ray_trace_down_finds_ground() {
        let (mut world, _dir) = test_world(flat_config(8.0), 1);
        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();
        let hit = world.ray_trace_blocks(DVec3::new(4.5, 12.5, 4.5), DVec3::NEG_Y, 6.0);
        assert_eq!(hit, Some((IVec3::new(4, 8, 4), IVec3::new(4, 9, 4))));
    }

    #[test]
    fn events_report_streaming_and_edits() {

        let (mut world, _dir) = test_world(flat_config(8.0), 0);
        world.swap_events(Some(Vec::new()));
        assert!(world.has_events());

        world.update(DVec3::new(8.0, 0.0, 8.0)).unwrap();
        world.set_block(IVec3::new(1, 12, 1), block::WOOD);

        let events = world.swap_events(Some(Vec::new())).unwrap();
        assert!(events.contains(&Event::ChunkLoaded { cx: 0, cz: 0 }));
        assert!(events.contains(&Event::MeshRebuilt { cx: 0, cz: 0 }));
        assert!(events.contains(&Event::BlockSet {
            pos: IVec3::new(1, 12, 1),
            id: block::WOOD,
            prev_id: block::AIR,
        }));

        world.update(DVec3::new(200.0, 0.0, 8.0)).unwrap();
        let events = world.swap_events(None).unwrap();
        assert!(events.contains(&Event::ChunkUnloaded { cx: 0, cz: 0 }));

    }

    #[test]
    fn border_tree_canopy_crosses_chunks() {

        // Find a grass column on the east border of a chunk that grows a
        // tree, while no column of the 5x5 canopy neighborhood in the next
        // chunk grows its own: the leaves found there can only come from the
        // cross-border placement path.
        let config = GenConfig::default();
        let mut found = None;

        'search: for cz in 0..64 {
            for cx in 0..64 {
                let wx = cx * 16 + 15;
                for wz in cz * 16 + 2..cz * 16 + 14 {
                    let height = terrain::height_at(&config, wx, wz);
                    if height < 0 || height + 6 >= CHUNK_HEIGHT as i32 {
                        continue;
                    }
                    if terrain::should_be_sand(&config, wx, wz) {
                        continue;
                    }
                    if !terrain::should_spawn_tree(&config, wx, wz) {
                        continue;
                    }
                    // No competing tree in any column whose canopy may reach
                    // the probed cell, and ground low enough there.
                    let probe = IVec3::new(wx + 2, height + 3, wz);
                    let clear = (-2..=2).all(|dx| (-2..=2).all(|dz| {
                        (dx == -2 && dz == 0)
                            || !terrain::should_spawn_tree(&config, probe.x + dx, probe.z + dz)
                    }));
                    if clear && terrain::height_at(&config, probe.x, probe.z) < probe.y {
                        found = Some((cx, cz, probe));
                        break 'search;
                    }
                }
            }
        }

        let (cx, cz, probe) = found.expect("no isolated border tree in the searched area");

        let (mut world, _dir) = test_world(config, 1);
        let center = calc_chunk_origin(cx, cz) + IVec3::new(8, 0, 8);
        world.update(center.as_dvec3()).unwrap();

        // The probed cell lies in the chunk east of the tree, on the edge of
        // its 5x5 canopy layer.
        assert_eq!(calc_chunk_pos_unchecked(probe), (cx + 1, cz));
        assert_eq!(world.get_block(probe), block::LEAVES);

    }

}
