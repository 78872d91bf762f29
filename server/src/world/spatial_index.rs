// massive_world_physics/server/src/world/spatial_index.rs
use crate::core::types::EntityId;
use crate::geometry::Aabb;
use ahash::{AHashMap, AHashSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct SpatialCell {
    entity_ids: AHashSet<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
}

/// Uniform grid over a region's ground plane. An entity is filed in every cell
/// its box touches; queries re-test the stored boxes.
pub struct RegionSpatialIndex {
    cells: Vec<SpatialCell>,
    grid_width: usize,
    grid_height: usize,
    cell_size: f32,
    world_min_x: f32,
    world_min_y: f32,

    entity_bounds: AHashMap<EntityId, Aabb>,
    entity_cells: AHashMap<EntityId, CellRange>,
}

impl RegionSpatialIndex {
    pub fn new(bound: &Aabb, cell_size: f32) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let world_width = bound.max.x - bound.min.x;
        let world_height = bound.max.y - bound.min.y;
        let grid_width = ((world_width / cell_size).ceil() as usize).max(1);
        let grid_height = ((world_height / cell_size).ceil() as usize).max(1);
        let total_cells = grid_width * grid_height;

        debug!(
            "Region spatial index initialized: {}x{} grid, {} total cells, cell size: {}",
            grid_width, grid_height, total_cells, cell_size
        );

        RegionSpatialIndex {
            cells: vec![SpatialCell::default(); total_cells],
            grid_width,
            grid_height,
            cell_size,
            world_min_x: bound.min.x,
            world_min_y: bound.min.y,
            entity_bounds: AHashMap::new(),
            entity_cells: AHashMap::new(),
        }
    }

    #[inline]
    fn get_cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let grid_x = ((x - self.world_min_x) / self.cell_size).floor().max(0.0) as usize;
        let grid_y = ((y - self.world_min_y) / self.cell_size).floor().max(0.0) as usize;
        (
            grid_x.min(self.grid_width.saturating_sub(1)),
            grid_y.min(self.grid_height.saturating_sub(1)),
        )
    }

    #[inline]
    fn get_cell_range(&self, aabb: &Aabb) -> CellRange {
        let (min_x, min_y) = self.get_cell_coords(aabb.min.x, aabb.min.y);
        let (max_x, max_y) = self.get_cell_coords(aabb.max.x, aabb.max.y);
        CellRange { min_x, max_x, min_y, max_y }
    }

    fn for_each_cell(range: CellRange, grid_width: usize, mut f: impl FnMut(usize)) {
        for y in range.min_y..=range.max_y {
            for x in range.min_x..=range.max_x {
                f(y * grid_width + x);
            }
        }
    }

    pub fn update_entity(&mut self, entity_id: EntityId, aabb: Aabb) {
        let new_range = self.get_cell_range(&aabb);
        let old_range = self.entity_cells.get(&entity_id).copied();

        if old_range != Some(new_range) {
            let grid_width = self.grid_width;
            if let Some(old_range) = old_range {
                let cells = &mut self.cells;
                Self::for_each_cell(old_range, grid_width, |idx| {
                    cells[idx].entity_ids.remove(&entity_id);
                });
            }
            let cells = &mut self.cells;
            Self::for_each_cell(new_range, grid_width, |idx| {
                cells[idx].entity_ids.insert(entity_id);
            });
            self.entity_cells.insert(entity_id, new_range);
        }

        self.entity_bounds.insert(entity_id, aabb);
    }

    pub fn remove_entity(&mut self, entity_id: EntityId) {
        if let Some(range) = self.entity_cells.remove(&entity_id) {
            let cells = &mut self.cells;
            Self::for_each_cell(range, self.grid_width, |idx| {
                cells[idx].entity_ids.remove(&entity_id);
            });
        }
        self.entity_bounds.remove(&entity_id);
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entity_bounds.contains_key(&entity_id)
    }

    /// Entities whose stored box intersects `volume`, in ascending id order.
    pub fn query_volume(&self, volume: &Aabb) -> Vec<EntityId> {
        let range = self.get_cell_range(volume);
        let mut checked = AHashSet::new();
        let mut found = Vec::new();

        Self::for_each_cell(range, self.grid_width, |idx| {
            for entity_id in &self.cells[idx].entity_ids {
                if checked.insert(*entity_id) {
                    let hit = self.entity_bounds
                        .get(entity_id)
                        .map_or(false, |bounds| bounds.intersects(volume));
                    if hit {
                        found.push(*entity_id);
                    }
                }
            }
        });

        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.entity_bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_bounds.is_empty()
    }

    pub fn get_stats(&self) -> SpatialIndexStats {
        let mut occupied_cells = 0;
        let mut max_entities_per_cell = 0;
        for cell in &self.cells {
            let entity_count = cell.entity_ids.len();
            if entity_count > 0 {
                occupied_cells += 1;
                max_entities_per_cell = max_entities_per_cell.max(entity_count);
            }
        }

        SpatialIndexStats {
            total_entities: self.entity_bounds.len(),
            occupied_cells,
            total_cells: self.cells.len(),
            max_entities_per_cell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialIndexStats {
    pub total_entities: usize,
    pub occupied_cells: usize,
    pub total_cells: usize,
    pub max_entities_per_cell: usize,
}
