// massive_world_physics/server/src/geometry/bounds.rs
use super::aabb::Aabb;
use crate::core::types::{flatten_2d, Vec3};

const SWEEP_EPSILON: f32 = 1e-6;

/// Collide shape of an entity, centered on its position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionShape {
    Sphere { radius: f32 },
    /// Vertical cylinder; collides as a circle on the ground plane.
    Cylinder { radius: f32, half_height: f32 },
    Box { half_extents: Vec3 },
}

impl CollisionShape {
    /// Radius on the ground plane, used to clamp repulsion and for locomotion sweeps.
    pub fn radius(&self) -> f32 {
        match *self {
            CollisionShape::Sphere { radius } => radius,
            CollisionShape::Cylinder { radius, .. } => radius,
            CollisionShape::Box { half_extents } => half_extents.x.max(half_extents.y),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        match *self {
            CollisionShape::Sphere { radius } => Vec3::splat(radius),
            CollisionShape::Cylinder { radius, half_height } => Vec3::new(radius, radius, half_height),
            CollisionShape::Box { half_extents } => half_extents.abs(),
        }
    }
}

/// Result of a swept test. `normal` points from the obstacle toward the mover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    pub time: f32,
    pub normal: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub shape: CollisionShape,
    pub center: Vec3,
}

impl Bounds {
    pub fn new(shape: CollisionShape, center: Vec3) -> Self {
        Bounds { shape, center }
    }

    pub fn at(&self, center: Vec3) -> Self {
        Bounds { shape: self.shape, center }
    }

    pub fn radius(&self) -> f32 {
        self.shape.radius()
    }

    pub fn to_aabb(&self) -> Aabb {
        Aabb::from_center_extents(self.center, self.shape.half_extents())
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        use CollisionShape::*;
        match (self.shape, other.shape) {
            (Sphere { radius: r0 }, Sphere { radius: r1 }) => {
                self.center.distance_squared(other.center) <= (r0 + r1) * (r0 + r1)
            }
            (Box { .. }, _) | (_, Box { .. }) => self.to_aabb().intersects(&other.to_aabb()),
            _ => {
                let r = self.radius() + other.radius();
                let planar = flatten_2d(self.center - other.center).length_squared() <= r * r;
                planar && self.vertical_overlap(other, self.center.z)
            }
        }
    }

    /// Sweeps `self` along `velocity` against a stationary `other`.
    pub fn sweep(&self, other: &Bounds, velocity: Vec3) -> Option<SweepHit> {
        use CollisionShape::*;
        match (self.shape, other.shape) {
            (Sphere { radius: r0 }, Sphere { radius: r1 }) => {
                sweep_point_sphere(self.center, velocity, other.center, r0 + r1)
            }
            (Box { .. }, _) | (_, Box { .. }) => {
                let target = other.to_aabb().expand(self.shape.half_extents());
                sweep_point_aabb(self.center, velocity, &target)
            }
            _ => {
                let hit = sweep_point_sphere(
                    flatten_2d(self.center),
                    flatten_2d(velocity),
                    flatten_2d(other.center),
                    self.radius() + other.radius(),
                )?;
                let z_at_hit = self.center.z + velocity.z * hit.time;
                if self.vertical_overlap(other, z_at_hit) { Some(hit) } else { None }
            }
        }
    }

    fn vertical_overlap(&self, other: &Bounds, z: f32) -> bool {
        let reach = self.shape.half_extents().z + other.shape.half_extents().z;
        (z - other.center.z).abs() <= reach
    }
}

/// Point `p` moving by `v` against a sphere of radius `r` at `c`.
fn sweep_point_sphere(p: Vec3, v: Vec3, c: Vec3, r: f32) -> Option<SweepHit> {
    let m = p - c;
    let c_term = m.length_squared() - r * r;
    if c_term <= 0.0 {
        let normal = m.try_normalize().unwrap_or_else(|| (-v).normalize_or_zero());
        return Some(SweepHit { time: 0.0, normal });
    }
    let a = v.length_squared();
    if a <= SWEEP_EPSILON {
        return None;
    }
    let b = 2.0 * m.dot(v);
    let disc = b * b - 4.0 * a * c_term;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let normal = (p + v * t - c).normalize_or_zero();
    Some(SweepHit { time: t, normal })
}

/// Slab test of a moving point against a box.
fn sweep_point_aabb(p: Vec3, v: Vec3, aabb: &Aabb) -> Option<SweepHit> {
    if aabb.contains_point(p) {
        let normal = (p - aabb.center()).try_normalize().unwrap_or_else(|| (-v).normalize_or_zero());
        return Some(SweepHit { time: 0.0, normal });
    }

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (origin, dir, lo, hi) = (p[axis], v[axis], aabb.min[axis], aabb.max[axis]);
        if dir.abs() < SWEEP_EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t1 = (lo - origin) * inv;
        let mut t2 = (hi - origin) * inv;
        let mut face = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            face = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if !(0.0..=1.0).contains(&t_enter) {
        return None;
    }
    Some(SweepHit { time: t_enter, normal })
}
