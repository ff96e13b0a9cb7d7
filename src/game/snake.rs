use glam::Vec2;
use tracing::{debug, trace};

use crate::config::{
    BOOST_COOLDOWN_SEC, BOOST_FOLLOW_MULT, BOOST_MIN_EXP, COLOR_COUNT, DROP_FOOD_RADIUS,
    DROP_FOOD_SPEED, FAST_SPEED, SLOW_SPEED, TINY,
};
use crate::game::entity::{Food, HeadState, Role, SegmentState, Unit, UnitId};
use crate::game::growth::{describe, exp_for_length};
use crate::game::math::{circles_overlap, rotate_toward};
use crate::game::world::{SlitherWorld, WorldEvent};

/// Creates a head plus its initial chain, trailing along -x at uniform
/// spacing. Returns the head id.
pub fn create_snake(
    world: &mut SlitherWorld,
    is_ai: bool,
    pos: Vec2,
    size: u32,
    name: Option<String>,
    target: Option<Vec2>,
) -> UnitId {
    let color = world.rand_int(COLOR_COUNT) as usize;
    let name = match name {
        Some(n) => n,
        None if is_ai => format!("Player-{}", world.rand_int(9000) + 1000),
        None => "Player".to_owned(),
    };

    let exp = exp_for_length(size);
    let profile = describe(exp);

    let target = target.unwrap_or(pos + Vec2::X);
    let aim = target - pos;
    let angle = if aim.length_squared() > TINY * TINY {
        aim.y.atan2(aim.x)
    } else {
        0.0
    };

    let head_id = world.db.insert_unit(Unit {
        pos,
        angle,
        radius: profile.radius,
        speed: SLOW_SPEED,
        color,
        bright: 0,
        remove: false,
        role: Role::Head(HeadState {
            exp,
            target,
            prev_pos: pos,
            is_ai,
            boost: false,
            boost_time: 0.0,
            boost_cooldown: BOOST_COOLDOWN_SEC,
            wander_time: 0.0,
            wander_period: 0.0,
            radius_dirty: false,
            pending_radius: profile.radius,
            parts: Vec::new(),
            name,
        }),
    });

    let count = profile.segment_target();
    let mut parts = Vec::with_capacity(count);
    for i in 0..count {
        let offset = profile.spacing * (i + 1) as f32;
        let prev_unit = if i == 0 { head_id } else { parts[i - 1] };
        let id = world.db.insert_unit(Unit {
            pos: Vec2::new(pos.x - offset, pos.y),
            angle: 0.0,
            radius: profile.radius,
            speed: SLOW_SPEED,
            color,
            bright: (i % 10) as u8,
            remove: false,
            role: Role::Segment(SegmentState {
                owner: head_id,
                prev_unit,
                segment_index: (i + 1) as u32,
            }),
        });
        parts.push(id);
    }

    if let Some(h) = world.db.unit_mut(head_id).and_then(Unit::head_mut) {
        h.parts = parts;
    }

    head_id
}

/// Grants experience and recomputes the head's own radius immediately.
/// Propagation to the body is batched into the next movement pass.
pub fn add_exp(world: &mut SlitherWorld, head_id: UnitId, amount: f32) {
    let Some(unit) = world.db.unit_mut(head_id) else {
        return;
    };
    let Role::Head(head) = &mut unit.role else {
        return;
    };
    head.exp += amount;
    let profile = describe(head.exp);
    head.radius_dirty = true;
    head.pending_radius = profile.radius;
    if !head.is_ai {
        trace!(
            name = %head.name,
            exp = head.exp,
            radius = profile.radius,
            links = head.parts.len(),
            "snake grew",
        );
    }
    unit.radius = profile.radius;
}

/// Removes experience (clamped at zero). Above the boost gate the cost is
/// made visible: one food drops at the tail.
pub fn lose_exp(world: &mut SlitherWorld, head_id: UnitId, amount: f32) {
    let (exp, color, tail) = {
        let Some(unit) = world.db.unit_mut(head_id) else {
            return;
        };
        let color = unit.color;
        let Role::Head(head) = &mut unit.role else {
            return;
        };
        head.exp = (head.exp - amount).max(0.0);
        let profile = describe(head.exp);
        head.radius_dirty = true;
        head.pending_radius = profile.radius;
        let exp = head.exp;
        let tail = head.parts.last().copied();
        unit.radius = profile.radius;
        (exp, color, tail)
    };

    if exp > BOOST_MIN_EXP {
        let pos = tail
            .and_then(|id| world.db.unit(id))
            .or_else(|| world.db.unit(head_id))
            .map(|u| u.pos)
            .unwrap_or_default();
        world.db.insert_food(Food {
            pos,
            target: pos,
            origin: pos,
            radius: DROP_FOOD_RADIUS,
            speed: DROP_FOOD_SPEED,
            color,
            remove: false,
        });
    }
}

/// Tombstones the head and every owned part, converts a share of the corpse
/// into food, and records the death for the broadcast layer. Idempotent
/// within a tick.
pub fn do_death(world: &mut SlitherWorld, head_id: UnitId) {
    let (parts, name) = {
        let Some(unit) = world.db.unit_mut(head_id) else {
            return;
        };
        if unit.remove || !unit.is_head() {
            return;
        }
        unit.remove = true;
        let Role::Head(head) = &mut unit.role else {
            unreachable!("is_head checked above");
        };
        (head.parts.clone(), head.name.clone())
    };

    let mut corpse = Vec::with_capacity(parts.len());
    for id in parts {
        if let Some(part) = world.db.unit_mut(id) {
            part.remove = true;
            corpse.push((part.pos, part.color));
        }
    }
    world.death_food(&corpse);
    world.events.push(WorldEvent::SnakeDied { id: head_id });
    debug!(name = %name, segments = corpse.len(), "snake died");
}

/// HeadSteering: turn toward the target under the hard rotation cap, advance
/// along the new facing, then drag the chain behind.
pub fn slither(world: &mut SlitherWorld, head_id: UnitId, dt: f32) {
    let (pos, angle, target, boost, exp, base_speed) = {
        let Some(unit) = world.db.unit(head_id) else {
            return;
        };
        let Some(head) = unit.head() else {
            return;
        };
        (
            unit.pos,
            unit.angle,
            head.target,
            head.boost,
            head.exp,
            unit.speed,
        )
    };

    let profile = describe(exp);
    let aim = target - pos;
    let target_angle = if aim.length_squared() > TINY * TINY {
        aim.y.atan2(aim.x)
    } else {
        angle
    };
    let new_angle = rotate_toward(angle, target_angle, profile.turn_speed * dt);

    let speed = if boost { FAST_SPEED } else { base_speed };
    let next = pos + Vec2::new(new_angle.cos(), new_angle.sin()) * speed * dt;

    if let Some(unit) = world.db.unit_mut(head_id) {
        unit.angle = new_angle;
        if let Some(head) = unit.head_mut() {
            head.prev_pos = pos;
        }
    }
    world.db.move_unit(head_id, next);

    follow_chain(world, head_id, dt);
}

/// ChainMovement: every segment lerps a spacing-derived fraction of the way
/// toward its predecessor, excess segments are tombstoned, at most one new
/// segment is appended, and a pending radius update is applied in the same
/// pass. The part list stays stable during the pass; compaction happens at
/// the end.
pub fn follow_chain(world: &mut SlitherWorld, head_id: UnitId, dt: f32) {
    let (exp, boost, dirty, pending_radius, color) = {
        let Some(unit) = world.db.unit(head_id) else {
            return;
        };
        let Some(head) = unit.head() else {
            return;
        };
        (
            head.exp,
            head.boost,
            head.radius_dirty,
            head.pending_radius,
            unit.color,
        )
    };

    let profile = describe(exp);
    let desired = profile.segment_target();

    let mut parts = {
        let unit = world.db.unit_mut(head_id).expect("head vanished mid-pass");
        unit.bright = (unit.bright + 1) % 10;
        let head = unit.head_mut().expect("role changed mid-pass");
        std::mem::take(&mut head.parts)
    };

    let speed = if boost {
        FAST_SPEED * BOOST_FOLLOW_MULT
    } else {
        SLOW_SPEED
    };
    let alpha = (dt * speed / profile.spacing).clamp(TINY, 1.0 - TINY);
    let mut trimmed = false;

    for i in 0..parts.len() {
        let id = parts[i];
        if i >= desired {
            if let Some(part) = world.db.unit_mut(id) {
                part.remove = true;
            }
            trimmed = true;
            continue;
        }

        let prev_id = if i == 0 { head_id } else { parts[i - 1] };
        let Some(prev_pos) = world.db.unit(prev_id).map(|u| u.pos) else {
            continue;
        };
        let Some(pos) = world.db.unit(id).map(|u| u.pos) else {
            continue;
        };

        let next = pos.lerp(prev_pos, alpha);
        world.db.move_unit(id, next);

        if let Some(part) = world.db.unit_mut(id) {
            let toward = prev_pos - next;
            if toward.length_squared() > TINY * TINY {
                part.angle = toward.y.atan2(toward.x);
            }
            if dirty {
                part.radius = pending_radius;
            }
            part.bright = (part.bright + 9) % 10;
        }
    }

    // At most one appended segment per pass.
    if parts.len() < desired {
        let (tail_pos, tail_angle, tail_bright, prev_unit, index) = match parts.last() {
            Some(&tail_id) => {
                let tail = world.db.unit(tail_id).expect("tail vanished mid-pass");
                let idx = tail.segment().map(|s| s.segment_index).unwrap_or(0) + 1;
                (tail.pos, tail.angle, tail.bright, tail_id, idx)
            }
            None => {
                let head = world.db.unit(head_id).expect("head vanished mid-pass");
                (head.pos, head.angle, head.bright, head_id, 1)
            }
        };
        // Nudge off the tail so the first follow step has a usable direction.
        let spawn = tail_pos + Vec2::new(TINY * index as f32, 0.0);
        let id = world.db.insert_unit(Unit {
            pos: spawn,
            angle: tail_angle,
            radius: profile.radius,
            speed: SLOW_SPEED,
            color,
            bright: (tail_bright + 1) % 10,
            remove: false,
            role: Role::Segment(SegmentState {
                owner: head_id,
                prev_unit,
                segment_index: index,
            }),
        });
        parts.push(id);
    }

    if trimmed {
        parts.retain(|&id| world.db.unit(id).map(|u| !u.remove).unwrap_or(false));
    }

    let unit = world.db.unit_mut(head_id).expect("head vanished mid-pass");
    if let Some(head) = unit.head_mut() {
        if dirty {
            head.radius_dirty = false;
        }
        head.parts = parts;
    }
}

/// CollisionResolver: body hit (from the pre-move position, half-radius
/// probe), then world containment, then food consumption, then boost drain.
/// The first lethal check wins.
pub fn resolve_collisions(world: &mut SlitherWorld, head_id: UnitId, dt: f32) {
    let (pos, radius, prev_pos) = {
        let Some(unit) = world.db.unit(head_id) else {
            return;
        };
        if unit.remove {
            return;
        }
        let Some(head) = unit.head() else {
            return;
        };
        (unit.pos, unit.radius, head.prev_pos)
    };

    if head_hit(world, head_id, prev_pos, radius) {
        do_death(world, head_id);
        return;
    }

    if !world.in_bounds(pos) {
        do_death(world, head_id);
        return;
    }

    if let Some(food_id) = world.db.first_food_hit(pos, radius) {
        let gained = {
            let food = world.db.food_mut(food_id).expect("food hit just resolved");
            food.remove = true;
            food.radius
        };
        add_exp(world, head_id, gained);
    }

    let drain = {
        let Some(head) = world.db.unit_mut(head_id).and_then(Unit::head_mut) else {
            return;
        };
        if head.boost && head.exp > BOOST_MIN_EXP {
            head.boost_time += dt;
            if head.boost_time >= head.boost_cooldown {
                head.boost_time = 0.0;
                true
            } else {
                false
            }
        } else {
            false
        }
    };
    if drain {
        lose_exp(world, head_id, 1.0);
    }
}

/// True when the probe circle (half the head radius, at the head's previous
/// position) overlaps any live unit of another chain.
fn head_hit(world: &SlitherWorld, head_id: UnitId, probe: Vec2, radius: f32) -> bool {
    for id in world.db.units_near(probe) {
        if id == head_id {
            continue;
        }
        let Some(other) = world.db.unit(id) else {
            continue;
        };
        if other.owner() == Some(head_id) {
            continue;
        }
        if circles_overlap(probe, radius * 0.5, other.pos, other.radius) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityDb;

    fn test_world() -> SlitherWorld {
        let mut w = SlitherWorld::new("test", 2000.0, 2000.0, 7);
        // Tests drive population explicitly.
        w.snake_min = 0;
        w.food_limit = 0;
        w
    }

    fn head_state<'a>(db: &'a EntityDb, id: UnitId) -> &'a HeadState {
        db.unit(id).unwrap().head().unwrap()
    }

    /// Walks prev_unit links from every part and checks it reaches the head
    /// in exactly segment_index steps.
    fn assert_chain_intact(world: &SlitherWorld, head_id: UnitId) {
        let head = head_state(&world.db, head_id);
        for (i, &part_id) in head.parts.iter().enumerate() {
            let seg = world.db.unit(part_id).unwrap().segment().unwrap();
            assert_eq!(seg.segment_index as usize, i + 1, "index order");
            let mut cursor = part_id;
            let mut steps = 0usize;
            while cursor != head_id {
                steps += 1;
                assert!(steps <= head.parts.len(), "cycle or stray link");
                cursor = world.db.unit(cursor).unwrap().segment().unwrap().prev_unit;
            }
            assert_eq!(steps, i + 1, "walk length for part {i}");
        }
    }

    #[test]
    fn spawned_snake_matches_requested_size_and_faces_its_target() {
        let mut world = test_world();
        let id = create_snake(
            &mut world,
            false,
            Vec2::new(500.0, 500.0),
            10,
            Some("Alice".to_owned()),
            Some(Vec2::new(600.0, 500.0)),
        );

        let unit = world.db.unit(id).unwrap();
        let head = unit.head().unwrap();
        assert_eq!(head.name, "Alice");
        assert!(unit.angle.abs() < 1e-6, "facing +x");
        assert_eq!(describe(head.exp).segment_target(), 10);
        assert_eq!(head.parts.len(), 10);

        let spacing = describe(head.exp).spacing;
        for (i, &pid) in head.parts.iter().enumerate() {
            let p = world.db.unit(pid).unwrap();
            assert!((p.pos.x - (500.0 - spacing * (i + 1) as f32)).abs() < 1e-3);
            assert_eq!(p.pos.y, 500.0);
        }
        assert_chain_intact(&world, id);
    }

    #[test]
    fn ai_snakes_get_generated_names() {
        let mut world = test_world();
        let id = create_snake(&mut world, true, Vec2::new(100.0, 100.0), 5, None, None);
        let name = &head_state(&world.db, id).name;
        assert!(name.starts_with("Player-"), "got {name}");
    }

    #[test]
    fn exp_gain_appends_at_most_one_segment_per_pass() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 5, None, None);
        // Scenario B: a large EXP jump must not dump segments all at once.
        add_exp(&mut world, id, 1000.0);
        let before = head_state(&world.db, id).parts.len();
        follow_chain(&mut world, id, 0.016);
        let after = head_state(&world.db, id).parts.len();
        assert_eq!(after, before + 1);
        assert_chain_intact(&world, id);
    }

    #[test]
    fn growth_converges_one_segment_per_tick() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 5, None, None);
        add_exp(&mut world, id, 1000.0);
        let target = describe(head_state(&world.db, id).exp).segment_target();

        let mut prev = head_state(&world.db, id).parts.len();
        for _ in 0..target + 5 {
            follow_chain(&mut world, id, 0.016);
            let len = head_state(&world.db, id).parts.len();
            assert!(len <= prev + 1, "grew more than one segment in a tick");
            prev = len;
        }
        assert_eq!(prev, target);
        assert_chain_intact(&world, id);
    }

    #[test]
    fn shrink_converges_and_cleanup_drops_the_excess() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 20, None, None);
        let units_before = world.db.unit_count();

        // Push EXP down to the floor of the curve.
        lose_exp(&mut world, id, 1e6);
        let target = describe(head_state(&world.db, id).exp).segment_target();
        follow_chain(&mut world, id, 0.016);

        assert_eq!(head_state(&world.db, id).parts.len(), target);
        assert_chain_intact(&world, id);

        let (removed, _) = world.db.cleanup();
        assert_eq!(removed, 20 - target);
        assert!(world.db.unit_count() < units_before);
    }

    #[test]
    fn exp_never_goes_negative() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 5, None, None);
        lose_exp(&mut world, id, 1e9);
        assert_eq!(head_state(&world.db, id).exp, 0.0);
        assert!(world.db.unit(id).unwrap().radius > 0.0);
    }

    #[test]
    fn radius_update_is_deferred_then_batched() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 8, None, None);
        let part = head_state(&world.db, id).parts[0];
        let old_radius = world.db.unit(part).unwrap().radius;

        add_exp(&mut world, id, 5000.0);
        // Head resizes immediately, the body only on the next pass.
        assert!(world.db.unit(id).unwrap().radius > old_radius);
        assert_eq!(world.db.unit(part).unwrap().radius, old_radius);

        follow_chain(&mut world, id, 0.016);
        let new_radius = world.db.unit(part).unwrap().radius;
        assert!(new_radius > old_radius);
        assert!(!head_state(&world.db, id).radius_dirty);
    }

    #[test]
    fn segments_never_outrun_their_predecessor() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 10, None, None);
        // A giant dt clamps alpha below 1: the chain contracts but never
        // crosses its predecessors.
        slither(&mut world, id, 10.0);
        assert_chain_intact(&world, id);
        let head = head_state(&world.db, id);
        for &pid in &head.parts {
            assert!(world.db.unit(pid).unwrap().pos.is_finite());
        }
    }

    #[test]
    fn head_body_overlap_kills_the_moving_head_only() {
        let mut world = test_world();
        let a = create_snake(&mut world, false, Vec2::new(300.0, 300.0), 5, None, None);
        let b = create_snake(&mut world, false, Vec2::new(900.0, 900.0), 5, None, None);

        // Park one of B's segments on A's probe position.
        let b_part = head_state(&world.db, b).parts[0];
        world.db.move_unit(b_part, Vec2::new(302.0, 300.0));

        resolve_collisions(&mut world, a, 0.016);

        assert!(world.db.unit(a).unwrap().remove, "moving head dies");
        for &pid in &head_state(&world.db, a).parts.clone() {
            assert!(world.db.unit(pid).unwrap().remove, "death cascades");
        }
        assert!(!world.db.unit(b).unwrap().remove, "victim is unaffected");
        assert!(!world.db.unit(b_part).unwrap().remove);
    }

    #[test]
    fn own_body_never_triggers_a_death() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(500.0, 500.0), 12, None, None);
        // Fresh spawns overlap their own chain by construction.
        resolve_collisions(&mut world, id, 0.016);
        assert!(!world.db.unit(id).unwrap().remove);
    }

    #[test]
    fn boost_drains_one_exp_per_cooldown_and_drops_food() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(1000.0, 1000.0), 5, None, None);
        {
            let head = world.db.unit_mut(id).unwrap().head_mut().unwrap();
            head.exp = 150.0;
            head.boost = true;
        }
        let food_before = world.db.food_count();
        let cooldown = head_state(&world.db, id).boost_cooldown;

        // Scenario D: boosting for exactly one cooldown window.
        let dt = cooldown / 5.0;
        for _ in 0..5 {
            resolve_collisions(&mut world, id, dt);
        }

        let head = head_state(&world.db, id);
        assert!((head.exp - 149.0).abs() < 1e-3);
        assert_eq!(world.db.food_count(), food_before + 1);
    }

    #[test]
    fn boost_below_the_gate_is_free() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(1000.0, 1000.0), 5, None, None);
        {
            let head = world.db.unit_mut(id).unwrap().head_mut().unwrap();
            head.exp = 50.0;
            head.boost = true;
        }
        for _ in 0..100 {
            resolve_collisions(&mut world, id, 0.1);
        }
        assert_eq!(head_state(&world.db, id).exp, 50.0);
    }

    #[test]
    fn eating_food_adds_its_radius_as_exp() {
        let mut world = test_world();
        let id = create_snake(&mut world, false, Vec2::new(1000.0, 1000.0), 5, None, None);
        let exp_before = head_state(&world.db, id).exp;
        world.db.insert_food(Food {
            pos: Vec2::new(1004.0, 1000.0),
            target: Vec2::new(1004.0, 1000.0),
            origin: Vec2::new(1004.0, 1000.0),
            radius: 18.0,
            speed: 5.0,
            color: 2,
            remove: false,
        });

        resolve_collisions(&mut world, id, 0.016);

        assert!((head_state(&world.db, id).exp - exp_before - 18.0).abs() < 1e-3);
        let (_, eaten) = world.db.cleanup();
        assert_eq!(eaten, 1);
    }

    #[test]
    fn steering_caps_rotation_per_tick() {
        let mut world = test_world();
        let id = create_snake(
            &mut world,
            false,
            Vec2::new(500.0, 500.0),
            5,
            None,
            Some(Vec2::new(600.0, 500.0)),
        );
        // Retarget straight behind: one short tick can't flip the facing.
        {
            let head = world.db.unit_mut(id).unwrap().head_mut().unwrap();
            head.target = Vec2::new(400.0, 500.0);
        }
        let exp = head_state(&world.db, id).exp;
        slither(&mut world, id, 0.016);
        let angle = world.db.unit(id).unwrap().angle;
        let cap = describe(exp).turn_speed * 0.016;
        assert!(angle.abs() <= cap + 1e-5, "turned {angle} with cap {cap}");
    }
}
