//! Uniform grid for neighbor queries.
//!
//! Every entity is bucketed by its center position. The cell size is
//! configured to at least the largest expected blob radius; queries still
//! track the largest radius actually seen and widen their scan by it, so
//! an oversized blob can never be missed.

use crate::entity::EntityId;
use glam::Vec2;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Item {
    bucket: usize,
    position: Vec2,
    radius: f32,
}

/// Uniform-cell index over blobs and food.
///
/// Must be kept consistent with every position and radius change; the
/// world wraps all mutation so callers cannot forget.
#[derive(Debug)]
pub struct SpatialGrid {
    min_x: f32,
    min_y: f32,
    cell: f32,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<EntityId>>,
    items: HashMap<EntityId, Item>,
    /// Largest item radius ever inserted; only grows, which keeps
    /// queries correct without tracking removals.
    max_radius: f32,
}

impl SpatialGrid {
    /// Create a grid covering `[min_x, max_x] x [min_y, max_y]`.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32, cell: f32) -> Self {
        let cols = (((max_x - min_x) / cell).ceil() as usize).max(1);
        let rows = (((max_y - min_y) / cell).ceil() as usize).max(1);
        Self {
            min_x,
            min_y,
            cell,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
            items: HashMap::with_capacity(1024),
            max_radius: 0.0,
        }
    }

    #[inline]
    fn col_of(&self, x: f32) -> usize {
        (((x - self.min_x) / self.cell) as isize).clamp(0, self.cols as isize - 1) as usize
    }

    #[inline]
    fn row_of(&self, y: f32) -> usize {
        (((y - self.min_y) / self.cell) as isize).clamp(0, self.rows as isize - 1) as usize
    }

    #[inline]
    fn bucket_of(&self, position: Vec2) -> usize {
        self.row_of(position.y) * self.cols + self.col_of(position.x)
    }

    /// Insert a new item (or reposition an existing one).
    pub fn insert(&mut self, id: EntityId, position: Vec2, radius: f32) {
        if self.items.contains_key(&id) {
            self.update(id, position, radius);
            return;
        }
        let bucket = self.bucket_of(position);
        self.buckets[bucket].push(id);
        self.items.insert(
            id,
            Item {
                bucket,
                position,
                radius,
            },
        );
        self.max_radius = self.max_radius.max(radius);
    }

    /// Update an item's position and radius, moving it between buckets
    /// when needed.
    pub fn update(&mut self, id: EntityId, position: Vec2, radius: f32) {
        let bucket = self.row_of(position.y) * self.cols + self.col_of(position.x);
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        let old_bucket = item.bucket;
        item.position = position;
        item.radius = radius;
        item.bucket = bucket;
        self.max_radius = self.max_radius.max(radius);
        if bucket != old_bucket {
            if let Some(pos) = self.buckets[old_bucket].iter().position(|&x| x == id) {
                self.buckets[old_bucket].swap_remove(pos);
            }
            self.buckets[bucket].push(id);
        }
    }

    /// Remove an item.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(item) = self.items.remove(&id) {
            if let Some(pos) = self.buckets[item.bucket].iter().position(|&x| x == id) {
                self.buckets[item.bucket].swap_remove(pos);
            }
        }
    }

    /// Collect every item whose own circle intersects the query circle.
    ///
    /// Results are appended to `out` (cleared first) so the caller can
    /// reuse one buffer across queries.
    pub fn query_circle(&self, center: Vec2, radius: f32, out: &mut Vec<EntityId>) {
        out.clear();
        let reach = radius + self.max_radius;
        let min_col = self.col_of(center.x - reach);
        let max_col = self.col_of(center.x + reach);
        let min_row = self.row_of(center.y - reach);
        let max_row = self.row_of(center.y + reach);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                for &id in &self.buckets[row * self.cols + col] {
                    let item = &self.items[&id];
                    let hit = radius + item.radius;
                    if center.distance_squared(item.position) < hit * hit {
                        out.push(id);
                    }
                }
            }
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
