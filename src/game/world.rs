use glam::Vec2;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{
    AI_SNAKE_SIZE, COLOR_COUNT, DEATH_FOOD_BASE_RADIUS, DEATH_FOOD_BASE_SPEED,
    DEATH_FOOD_RADIUS_JITTER, DEATH_FOOD_SPEED_JITTER, FOOD_BASE_RADIUS, FOOD_BASE_SPEED,
    FOOD_RADIUS_JITTER, FOOD_SPAWN_BATCH, FOOD_SPEED_JITTER, FOOD_WANDER_SPAN, PLAYER_SNAKE_SIZE,
    TARGET_EPSILON,
};
use crate::game::entity::{EntityDb, Food, FoodId, UnitId};
use crate::game::math::move_toward;
use crate::game::snake;

/// Facts the broadcast layer needs after a tick; drained via `take_events`.
pub enum WorldEvent {
    SnakeDied { id: UnitId },
}

/// The authoritative arena. Owns every entity; exactly one `process` call
/// runs at a time and all mutation happens inside it.
pub struct SlitherWorld {
    pub name: String,
    pub w: f32,
    pub h: f32,
    pub db: EntityDb,
    pub food_limit: usize,
    pub snake_min: usize,
    pub(crate) events: Vec<WorldEvent>,
    rng: SmallRng,
}

impl SlitherWorld {
    pub fn new(name: &str, w: f32, h: f32, seed: u64) -> Self {
        Self {
            name: name.to_owned(),
            w,
            h,
            db: EntityDb::new(w, h),
            food_limit: crate::config::FOOD_LIMIT,
            snake_min: crate::config::SNAKE_MIN,
            events: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn rand_int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Strict containment in the world circle: a center exactly on the
    /// boundary is already out.
    pub fn in_bounds(&self, pos: Vec2) -> bool {
        let center = Vec2::new(self.w * 0.5, self.h * 0.5);
        let r = self.w * 0.5;
        pos.distance_squared(center) < r * r
    }

    fn random_pos(&mut self) -> Vec2 {
        let x = self.rand_int(self.w as u32) as f32;
        let y = self.rand_int(self.h as u32) as f32;
        Vec2::new(x, y)
    }

    /// Spawns a snake for an incoming player. Humans get a target leading
    /// them to the right so they move immediately; anything named like a bot
    /// wanders from a random target like the AI does.
    pub fn player_spawn(&mut self, name: Option<&str>) -> UnitId {
        let pos = self.random_pos();
        let human = name.map(|n| !n.starts_with("Player-")).unwrap_or(false);
        let target = if human {
            let mut tx = pos.x + crate::config::SPAWN_TARGET_LEAD;
            let mut ty = pos.y;
            let margin = crate::config::SPAWN_TARGET_MARGIN;
            if tx >= self.w {
                tx = self.w - margin;
            }
            if ty >= self.h {
                ty = self.h - margin;
            }
            if tx < 0.0 {
                tx = margin;
            }
            if ty < 0.0 {
                ty = margin;
            }
            Vec2::new(tx, ty)
        } else {
            self.random_pos()
        };

        let id = snake::create_snake(
            self,
            false,
            pos,
            PLAYER_SNAKE_SIZE,
            name.map(str::to_owned),
            Some(target),
        );
        info!(
            x = pos.x,
            y = pos.y,
            tx = target.x,
            ty = target.y,
            ?id,
            "player snake spawned",
        );
        id
    }

    /// Points a head at a new target and sets its boost intent. Returns false
    /// for dead or unknown ids.
    pub fn steer(&mut self, id: UnitId, target: Vec2, boost: bool) -> bool {
        let Some(unit) = self.db.unit_mut(id) else {
            return false;
        };
        if unit.remove {
            return false;
        }
        let Some(head) = unit.head_mut() else {
            return false;
        };
        head.target = target;
        head.boost = boost;
        true
    }

    pub fn kill_snake(&mut self, id: UnitId) {
        snake::do_death(self, id);
    }

    /// Population floor for AI snakes: at most one spawn attempt per call,
    /// and only into an empty neighborhood.
    pub fn check_snakes(&mut self) {
        if self.db.ai_head_count() >= self.snake_min {
            return;
        }
        let pos = self.random_pos();
        if !self.db.units_near(pos).is_empty() {
            return;
        }
        let target = self.random_pos();
        let id = snake::create_snake(self, true, pos, AI_SNAKE_SIZE, None, Some(target));
        debug!(?id, x = pos.x, y = pos.y, "ai snake spawned");
    }

    /// Keeps seeded food around; the gap up to the full limit is headroom
    /// for death drops.
    pub fn check_food(&mut self) {
        if self.db.food_count() >= self.food_limit / 2 {
            return;
        }
        for _ in 0..FOOD_SPAWN_BATCH {
            let radius = FOOD_BASE_RADIUS + self.rand_int(FOOD_RADIUS_JITTER) as f32;
            let pos = self.random_pos();
            if !self.in_bounds(pos) {
                continue;
            }
            let speed = FOOD_BASE_SPEED + self.rand_int(FOOD_SPEED_JITTER) as f32;
            let color = self.rand_int(COLOR_COUNT) as usize;
            self.db.insert_food(Food {
                pos,
                target: pos,
                origin: pos,
                radius,
                speed,
                color,
                remove: false,
            });
        }
    }

    /// Converts every second part of a corpse into food near where it fell,
    /// carrying the dead snake's color.
    pub fn death_food(&mut self, corpse: &[(Vec2, usize)]) {
        if self.db.food_count() >= self.food_limit + corpse.len() {
            return;
        }
        for (pos, color) in corpse.iter().step_by(2) {
            if !self.in_bounds(*pos) {
                continue;
            }
            let radius = DEATH_FOOD_BASE_RADIUS + self.rand_int(DEATH_FOOD_RADIUS_JITTER) as f32;
            let speed = DEATH_FOOD_BASE_SPEED + self.rand_int(DEATH_FOOD_SPEED_JITTER) as f32;
            self.db.insert_food(Food {
                pos: *pos,
                target: *pos,
                origin: *pos,
                radius,
                speed,
                color: *color,
                remove: false,
            });
        }
    }

    /// One tick: population control, then every head (AI wander, steering,
    /// collision), then food wander, then compaction. Later phases see the
    /// results of earlier ones within the same tick.
    pub fn process(&mut self, dt: f32) {
        if self.rand_int(100) > 90 {
            self.check_snakes();
            self.check_food();
        }

        for id in self.db.head_ids() {
            let Some(unit) = self.db.unit(id) else {
                continue;
            };
            if unit.remove {
                continue;
            }
            let Some(head) = unit.head() else {
                continue;
            };
            let is_ai = head.is_ai;
            if is_ai {
                self.drive_ai(id, dt);
            }

            let (pos, target) = {
                let unit = self.db.unit(id).expect("head checked above");
                let head = unit.head().expect("head checked above");
                (unit.pos, head.target)
            };
            if pos.distance(target) >= TARGET_EPSILON {
                snake::slither(self, id, dt);
            }
            snake::resolve_collisions(self, id, dt);
        }

        self.process_food(dt);
        self.db.cleanup();
    }

    /// Expired wander timer: new random target, fresh period, and a boost
    /// re-roll (only chains long enough to afford it may boost).
    fn drive_ai(&mut self, id: UnitId, dt: f32) {
        let state = {
            let Some(unit) = self.db.unit(id) else {
                return;
            };
            let Some(head) = unit.head() else {
                return;
            };
            (head.wander_time >= head.wander_period, head.parts.len())
        };

        if state.0 {
            let target = self.random_pos();
            let period = (self.rand_int(crate::config::AI_WANDER_PERIOD_JITTER)
                + crate::config::AI_WANDER_PERIOD_BASE) as f32;
            let boost =
                state.1 >= crate::config::AI_BOOST_MIN_SEGMENTS && self.rand_int(2) == 1;
            if let Some(head) = self.db.unit_mut(id).and_then(|u| u.head_mut()) {
                head.target = target;
                head.wander_time = 0.0;
                head.wander_period = period;
                head.boost = boost;
            }
        }

        if let Some(head) = self.db.unit_mut(id).and_then(|u| u.head_mut()) {
            head.wander_time += dt;
        }
    }

    fn process_food(&mut self, dt: f32) {
        let ids: Vec<FoodId> = self.db.foods().map(|(id, _)| id).collect();
        for id in ids {
            let Some(food) = self.db.food(id) else {
                continue;
            };
            if food.remove {
                continue;
            }
            let (pos, target, origin, speed) = (food.pos, food.target, food.origin, food.speed);

            if pos == target {
                // move_toward lands exactly on the target, so equality is the
                // arrival signal.
                let half = (FOOD_WANDER_SPAN / 2) as f32;
                let tx = (origin.x + self.rand_int(FOOD_WANDER_SPAN) as f32 - half)
                    .clamp(0.0, self.w - 1.0);
                let ty = (origin.y + self.rand_int(FOOD_WANDER_SPAN) as f32 - half)
                    .clamp(0.0, self.h - 1.0);
                if let Some(food) = self.db.food_mut(id) {
                    food.target = Vec2::new(tx, ty);
                }
            } else {
                let next = move_toward(pos, target, speed * dt);
                self.db.move_food(id, next);
            }

            let out = self
                .db
                .food(id)
                .map(|f| !self.in_bounds(f.pos))
                .unwrap_or(false);
            if out {
                if let Some(food) = self.db.food_mut(id) {
                    food.remove = true;
                }
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}
