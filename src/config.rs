// World
pub const WORLD_NAME: &str = "slither";
pub const WORLD_W: f32 = 6000.0;
pub const WORLD_H: f32 = 6000.0;

// Server tick
pub const TICK_RATE: u16 = 20;
pub const TICK_INTERVAL_MS: u64 = 50;

// Movement
pub const SLOW_SPEED: f32 = 150.0;
pub const FAST_SPEED: f32 = SLOW_SPEED * 2.0;
// Boosted bodies chase at 1.5x, not 2x, so spacing doesn't blow up mid-boost.
pub const BOOST_FOLLOW_MULT: f32 = 0.75;
// Steering stops inside this radius around the target (avoids oscillation).
pub const TARGET_EPSILON: f32 = 2.0;
pub const TINY: f32 = 0.0001;

// Growth curve
pub const WORLD_SCALE: f32 = 32.0;
pub const MIN_SPAWN_EXP: f32 = 10.0;

// Boost cost: 1 EXP per cooldown window, only while EXP stays above the gate.
pub const BOOST_COOLDOWN_SEC: f32 = 0.5;
pub const BOOST_MIN_EXP: f32 = 100.0;

// Population control
pub const FOOD_LIMIT: usize = 4000;
pub const SNAKE_MIN: usize = 100;
pub const FOOD_SPAWN_BATCH: usize = 10;
pub const PLAYER_SNAKE_SIZE: u32 = 10;
pub const AI_SNAKE_SIZE: u32 = 10;

// AI wander / boost
pub const AI_WANDER_PERIOD_BASE: u32 = 2;
pub const AI_WANDER_PERIOD_JITTER: u32 = 5;
pub const AI_BOOST_MIN_SEGMENTS: usize = 11;

// Food tuning
pub const FOOD_BASE_RADIUS: f32 = 15.0;
pub const FOOD_RADIUS_JITTER: u32 = 5;
pub const FOOD_BASE_SPEED: f32 = 40.0;
pub const FOOD_SPEED_JITTER: u32 = 10;
pub const DEATH_FOOD_BASE_RADIUS: f32 = 20.0;
pub const DEATH_FOOD_RADIUS_JITTER: u32 = 10;
pub const DEATH_FOOD_BASE_SPEED: f32 = 20.0;
pub const DEATH_FOOD_SPEED_JITTER: u32 = 10;
pub const DROP_FOOD_RADIUS: f32 = 15.0;
pub const DROP_FOOD_SPEED: f32 = 5.0;
// Wander target = origin +/- half the span, per axis.
pub const FOOD_WANDER_SPAN: u32 = 64;

// Spawn targeting for human players: lead them to the right so they move
// immediately, kept this margin inside the world rect.
pub const SPAWN_TARGET_LEAD: f32 = 100.0;
pub const SPAWN_TARGET_MARGIN: f32 = 50.0;

// Palette size; the server only ships indices, clients own the actual colors.
pub const COLOR_COUNT: u32 = 10;

// Spatial buckets: must cover the widest collision probe (max head radius
// plus max body radius stays well under one cell).
pub const GRID_CELL_SIZE: f32 = 160.0;
