// massive_world_physics/server/src/world/wall_index.rs
use crate::core::types::Vec3;
use crate::geometry::Aabb;
use glam::Vec2;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, trace};

/// Skin kept between a clipped sweep and the obstruction it stopped at.
const SWEEP_SKIN: f32 = 1e-3;

/// Static, non-entity obstruction on the ground plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Wall {
    pub fn new(id: u64, x: f32, y: f32, width: f32, height: f32) -> Self {
        Wall { id, x, y, width, height }
    }
}

#[derive(Clone, Debug)]
struct SpatialWall {
    wall: Wall,
}

impl RTreeObject for SpatialWall {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let min = [self.wall.x, self.wall.y];
        let max = [self.wall.x + self.wall.width, self.wall.y + self.wall.height];
        AABB::from_corners(min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepResult {
    /// Reached the destination unobstructed.
    Success,
    /// Stopped at the first obstruction.
    Clipped,
    /// Could not start: inside an obstruction or outside the region.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotorSweep {
    pub result: SweepResult,
    pub position: Vec3,
    /// Contact normal of the obstruction; `Vec3::Z` when unobstructed.
    pub normal: Vec3,
}

impl LocomotorSweep {
    fn failed(from: Vec3) -> Self {
        LocomotorSweep { result: SweepResult::Failed, position: from, normal: Vec3::Z }
    }
}

/// R-tree of walls used by locomotion sweeps.
pub struct WallIndex {
    rtree: RTree<SpatialWall>,
}

impl WallIndex {
    pub fn new() -> Self {
        WallIndex { rtree: RTree::new() }
    }

    /// Build or rebuild the index from a collection of walls
    pub fn rebuild(&mut self, walls: &[Wall]) {
        let spatial_walls: Vec<SpatialWall> = walls
            .iter()
            .map(|w| SpatialWall { wall: w.clone() })
            .collect();
        self.rtree = RTree::bulk_load(spatial_walls);
        debug!("Wall index rebuilt with {} walls", self.rtree.size());
    }

    pub fn insert(&mut self, wall: Wall) {
        self.rtree.insert(SpatialWall { wall });
    }

    /// Query walls that intersect with a given AABB
    pub fn query_aabb(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<Wall> {
        let query_aabb = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.rtree
            .locate_in_envelope_intersecting(&query_aabb)
            .map(|spatial_wall| spatial_wall.wall.clone())
            .collect()
    }

    pub fn size(&self) -> usize {
        self.rtree.size()
    }

    /// Sweeps a circle of `radius` from `from` to `to`, stopping at walls and at the
    /// edge of `bound` (shrunk by the radius).
    ///
    /// A start inside `bound` but within `radius` of its edge still sweeps: moves
    /// toward the interior succeed, moves further out clip where they start.
    pub fn sweep(&self, bound: &Aabb, from: Vec3, to: Vec3, radius: f32) -> LocomotorSweep {
        let start = Vec2::new(from.x, from.y);
        let end = Vec2::new(to.x, to.y);
        let delta = end - start;

        if start.x < bound.min.x || start.x > bound.max.x || start.y < bound.min.y || start.y > bound.max.y {
            debug!("Sweep from {:?} starts outside region bound {:?}", from, bound);
            return LocomotorSweep::failed(from);
        }
        let walk_min = Vec2::new(bound.min.x + radius, bound.min.y + radius);
        let walk_max = Vec2::new(bound.max.x - radius, bound.max.y - radius);

        let mut best_time = 1.0_f32;
        let mut best_normal: Option<Vec2> = None;

        // Edges of the walkable area.
        for axis in 0..2 {
            if delta[axis] > 0.0 && end[axis] > walk_max[axis] {
                let t = ((walk_max[axis] - start[axis]) / delta[axis]).max(0.0);
                if t < best_time {
                    best_time = t;
                    best_normal = Some(if axis == 0 { Vec2::NEG_X } else { Vec2::NEG_Y });
                }
            } else if delta[axis] < 0.0 && end[axis] < walk_min[axis] {
                let t = ((walk_min[axis] - start[axis]) / delta[axis]).max(0.0);
                if t < best_time {
                    best_time = t;
                    best_normal = Some(if axis == 0 { Vec2::X } else { Vec2::Y });
                }
            }
        }

        let query_min = start.min(end) - Vec2::splat(radius);
        let query_max = start.max(end) + Vec2::splat(radius);
        for wall in self.query_aabb(query_min.x, query_min.y, query_max.x, query_max.y) {
            let wall_min = Vec2::new(wall.x - radius, wall.y - radius);
            let wall_max = Vec2::new(wall.x + wall.width + radius, wall.y + wall.height + radius);
            if start.x > wall_min.x && start.x < wall_max.x && start.y > wall_min.y && start.y < wall_max.y {
                trace!("Sweep from {:?} starts inside wall {}", from, wall.id);
                return LocomotorSweep::failed(from);
            }
            if let Some((t, normal)) = segment_enters_rect(start, delta, wall_min, wall_max) {
                if t < best_time {
                    best_time = t;
                    best_normal = Some(normal);
                }
            }
        }

        match best_normal {
            None => LocomotorSweep { result: SweepResult::Success, position: to, normal: Vec3::Z },
            Some(normal) => {
                let normal = Vec3::new(normal.x, normal.y, 0.0);
                let mut position = from + (to - from) * best_time;
                if best_time > 0.0 {
                    position += normal * SWEEP_SKIN;
                }
                LocomotorSweep { result: SweepResult::Clipped, position, normal }
            }
        }
    }
}

impl Default for WallIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry time and face normal of a segment `start + delta * t` against a box.
fn segment_enters_rect(start: Vec2, delta: Vec2, min: Vec2, max: Vec2) -> Option<(f32, Vec2)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        if delta[axis].abs() < f32::EPSILON {
            if start[axis] < min[axis] || start[axis] > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / delta[axis];
        let mut t1 = (min[axis] - start[axis]) * inv;
        let mut t2 = (max[axis] - start[axis]) * inv;
        let mut face = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            face = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = if axis == 0 { Vec2::new(face, 0.0) } else { Vec2::new(0.0, face) };
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if (0.0..=1.0).contains(&t_enter) { Some((t_enter, normal)) } else { None }
}
