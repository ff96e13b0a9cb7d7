use glam::Vec2;
use slotmap::{new_key_type, SlotMap};

use crate::config::GRID_CELL_SIZE;
use crate::game::math::circles_overlap;
use crate::game::spatial::Buckets;

new_key_type! {
    /// Stable handle for a snake head or body segment.
    pub struct UnitId;
    /// Stable handle for a food pickup.
    pub struct FoodId;
}

/// Head-only state: everything that steers and scores.
pub struct HeadState {
    pub exp: f32,
    pub target: Vec2,
    /// Position at the start of the last steering pass; collision probes
    /// test against this, not the already-advanced position.
    pub prev_pos: Vec2,
    pub is_ai: bool,
    pub boost: bool,
    pub boost_time: f32,
    pub boost_cooldown: f32,
    pub wander_time: f32,
    pub wander_period: f32,
    /// Dirty flag for batched radius propagation to the body; the segments
    /// pick up `pending_radius` on the next movement pass.
    pub radius_dirty: bool,
    pub pending_radius: f32,
    /// Owned segments in segment_index order (index i holds segment i+1).
    pub parts: Vec<UnitId>,
    pub name: String,
}

/// Segment-only state: linkage back to the chain.
pub struct SegmentState {
    pub owner: UnitId,
    pub prev_unit: UnitId,
    pub segment_index: u32,
}

pub enum Role {
    Head(HeadState),
    Segment(SegmentState),
}

/// One circular body piece; a head and a segment share geometry and differ
/// only in their role payload.
pub struct Unit {
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
    pub speed: f32,
    pub color: usize,
    /// Cyclic 0..9 animation counter, never read by the simulation.
    pub bright: u8,
    pub remove: bool,
    pub role: Role,
}

impl Unit {
    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn is_head(&self) -> bool {
        matches!(self.role, Role::Head(_))
    }

    pub fn head(&self) -> Option<&HeadState> {
        match &self.role {
            Role::Head(h) => Some(h),
            Role::Segment(_) => None,
        }
    }

    pub fn head_mut(&mut self) -> Option<&mut HeadState> {
        match &mut self.role {
            Role::Head(h) => Some(h),
            Role::Segment(_) => None,
        }
    }

    pub fn segment(&self) -> Option<&SegmentState> {
        match &self.role {
            Role::Head(_) => None,
            Role::Segment(s) => Some(s),
        }
    }

    pub fn owner(&self) -> Option<UnitId> {
        self.segment().map(|s| s.owner)
    }
}

/// A slowly wandering pickup.
pub struct Food {
    pub pos: Vec2,
    pub target: Vec2,
    /// Anchor the wander targets are rolled around.
    pub origin: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub color: usize,
    pub remove: bool,
}

/// Entity container: generational arenas for units and food plus the bucket
/// grids that answer neighborhood queries. All position changes go through
/// `move_unit`/`move_food` so the grids never go stale; `remove` is a
/// tombstone honored by queries and compacted once per tick in `cleanup`.
pub struct EntityDb {
    units: SlotMap<UnitId, Unit>,
    food: SlotMap<FoodId, Food>,
    unit_grid: Buckets<UnitId>,
    food_grid: Buckets<FoodId>,
}

impl EntityDb {
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            units: SlotMap::with_key(),
            food: SlotMap::with_key(),
            unit_grid: Buckets::new(w, h, GRID_CELL_SIZE),
            food_grid: Buckets::new(w, h, GRID_CELL_SIZE),
        }
    }

    pub fn insert_unit(&mut self, unit: Unit) -> UnitId {
        let pos = unit.pos;
        let id = self.units.insert(unit);
        self.unit_grid.insert(id, pos);
        id
    }

    pub fn insert_food(&mut self, food: Food) -> FoodId {
        let pos = food.pos;
        let id = self.food.insert(food);
        self.food_grid.insert(id, pos);
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub fn food(&self, id: FoodId) -> Option<&Food> {
        self.food.get(id)
    }

    pub fn food_mut(&mut self, id: FoodId) -> Option<&mut Food> {
        self.food.get_mut(id)
    }

    pub fn move_unit(&mut self, id: UnitId, to: Vec2) {
        if let Some(unit) = self.units.get_mut(id) {
            self.unit_grid.relocate(id, unit.pos, to);
            unit.pos = to;
        }
    }

    pub fn move_food(&mut self, id: FoodId, to: Vec2) {
        if let Some(food) = self.food.get_mut(id) {
            self.food_grid.relocate(id, food.pos, to);
            food.pos = to;
        }
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units.iter()
    }

    pub fn foods(&self) -> impl Iterator<Item = (FoodId, &Food)> {
        self.food.iter()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    pub fn head_ids(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| u.is_head())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn head_count(&self) -> usize {
        self.units
            .values()
            .filter(|u| u.is_head() && !u.remove)
            .count()
    }

    pub fn ai_head_count(&self) -> usize {
        self.units
            .values()
            .filter(|u| !u.remove && u.head().map(|h| h.is_ai).unwrap_or(false))
            .count()
    }

    /// Live units in the bucket neighborhood of `pos`, tombstones excluded.
    pub fn units_near(&self, pos: Vec2) -> Vec<UnitId> {
        self.unit_grid
            .near(pos)
            .into_iter()
            .filter(|id| self.units.get(*id).map(|u| !u.remove).unwrap_or(false))
            .collect()
    }

    /// First live food overlapping the circle at `pos` with `radius`.
    pub fn first_food_hit(&self, pos: Vec2, radius: f32) -> Option<FoodId> {
        self.food_grid.near(pos).into_iter().find(|id| {
            self.food
                .get(*id)
                .map(|f| !f.remove && circles_overlap(pos, radius, f.pos, f.radius))
                .unwrap_or(false)
        })
    }

    /// End-of-tick compaction: drops every tombstoned entity from the arenas
    /// and the grids. Returns (units, food) removed.
    pub fn cleanup(&mut self) -> (usize, usize) {
        let dead_units: Vec<(UnitId, Vec2)> = self
            .units
            .iter()
            .filter(|(_, u)| u.remove)
            .map(|(id, u)| (id, u.pos))
            .collect();
        for (id, pos) in &dead_units {
            self.unit_grid.remove(*id, *pos);
            self.units.remove(*id);
        }

        let dead_food: Vec<(FoodId, Vec2)> = self
            .food
            .iter()
            .filter(|(_, f)| f.remove)
            .map(|(id, f)| (id, f.pos))
            .collect();
        for (id, pos) in &dead_food {
            self.food_grid.remove(*id, *pos);
            self.food.remove(*id);
        }

        (dead_units.len(), dead_food.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food_at(pos: Vec2, radius: f32) -> Food {
        Food {
            pos,
            target: pos,
            origin: pos,
            radius,
            speed: 5.0,
            color: 0,
            remove: false,
        }
    }

    #[test]
    fn tombstoned_food_is_invisible_to_queries() {
        let mut db = EntityDb::new(1000.0, 1000.0);
        let id = db.insert_food(food_at(Vec2::new(100.0, 100.0), 10.0));
        assert!(db.first_food_hit(Vec2::new(100.0, 100.0), 5.0).is_some());

        db.food_mut(id).unwrap().remove = true;
        assert!(db.first_food_hit(Vec2::new(100.0, 100.0), 5.0).is_none());

        let (u, f) = db.cleanup();
        assert_eq!((u, f), (0, 1));
        assert_eq!(db.food_count(), 0);
    }

    #[test]
    fn moved_entities_answer_queries_at_their_new_position() {
        let mut db = EntityDb::new(2000.0, 2000.0);
        let id = db.insert_food(food_at(Vec2::new(100.0, 100.0), 10.0));
        db.move_food(id, Vec2::new(1500.0, 1500.0));
        assert!(db.first_food_hit(Vec2::new(100.0, 100.0), 5.0).is_none());
        assert!(db.first_food_hit(Vec2::new(1500.0, 1500.0), 5.0).is_some());
    }
}
