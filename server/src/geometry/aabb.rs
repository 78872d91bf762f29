// massive_world_physics/server/src/geometry/aabb.rs
use crate::core::types::Vec3;

/// Axis-aligned box given by its min/max corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Aabb { min: center - half, max: center + half }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn translate(&self, offset: Vec3) -> Self {
        Aabb { min: self.min + offset, max: self.max + offset }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    pub fn expand(&self, amount: Vec3) -> Self {
        Aabb { min: self.min - amount, max: self.max + amount }
    }

    /// Touching boxes count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }
}
