use std::collections::HashMap;

use glam::Vec2;
use slotmap::Key;
use tracing::info;

use crate::config::{TICK_RATE, WORLD_H, WORLD_NAME, WORLD_W};
use crate::game::entity::UnitId;
use crate::game::world::{SlitherWorld, WorldEvent};
use crate::net::messages::{
    ClientMessage, Event, FoodState, ServerMessage, SnakeState, Vec2f, WorldInfo,
};
use crate::net::session::OutboundMessage;

/// Sessions and the one world they share. The dispatcher serializes access,
/// so everything here is plain single-threaded state.
pub struct Lobby {
    world: SlitherWorld,
    seats: HashMap<u64, Seat>,
    server_tick: u32,
}

struct Seat {
    snake: Option<UnitId>,
    name: String,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            world: SlitherWorld::new(WORLD_NAME, WORLD_W, WORLD_H, rand::random()),
            seats: HashMap::new(),
            server_tick: 0,
        }
    }

    pub fn handle_message(&mut self, session_id: u64, msg: ClientMessage) -> Vec<OutboundMessage> {
        match msg {
            ClientMessage::Join { name } => {
                let trimmed = name.trim();
                let name = if trimmed.is_empty() { "Player" } else { trimmed };

                // A live snake on this seat wins over a duplicate join.
                let existing = self
                    .seats
                    .get(&session_id)
                    .and_then(|s| s.snake)
                    .filter(|id| {
                        self.world
                            .db
                            .unit(*id)
                            .map(|u| !u.remove)
                            .unwrap_or(false)
                    });
                let snake = match existing {
                    Some(id) => id,
                    None => self.world.player_spawn(Some(name)),
                };
                self.seats.insert(
                    session_id,
                    Seat {
                        snake: Some(snake),
                        name: name.to_owned(),
                    },
                );

                vec![OutboundMessage {
                    session_id,
                    message: ServerMessage::Welcome {
                        snake_id: snake.data().as_ffi(),
                        tick_rate: TICK_RATE,
                        world: WorldInfo {
                            width: self.world.w,
                            height: self.world.h,
                        },
                    },
                }]
            }
            ClientMessage::Steer { target, boost } => {
                if let Some(id) = self.seats.get(&session_id).and_then(|s| s.snake) {
                    self.world
                        .steer(id, Vec2::new(target.x, target.y), boost);
                }
                Vec::new()
            }
            ClientMessage::Ping { client_time } => vec![OutboundMessage {
                session_id,
                message: ServerMessage::Pong {
                    server_time: self.server_tick as f32 / TICK_RATE as f32,
                    client_time,
                },
            }],
            ClientMessage::Leave => self.handle_disconnect(session_id),
        }
    }

    /// A departing session takes its snake with it; everyone else hears
    /// about it.
    pub fn handle_disconnect(&mut self, session_id: u64) -> Vec<OutboundMessage> {
        let mut outbound = Vec::new();
        if let Some(seat) = self.seats.remove(&session_id) {
            if let Some(id) = seat.snake {
                self.world.kill_snake(id);
                info!(session_id, name = %seat.name, "player left");
                for other in self.seats.keys().copied() {
                    outbound.push(OutboundMessage {
                        session_id: other,
                        message: ServerMessage::SnakeLeft {
                            id: id.data().as_ffi(),
                        },
                    });
                }
            }
        }
        outbound
    }

    /// Advances the world one tick and broadcasts the settled snapshot to
    /// every session.
    pub fn tick(&mut self) -> Vec<OutboundMessage> {
        let dt = 1.0 / TICK_RATE as f32;
        self.world.process(dt);
        self.server_tick = self.server_tick.wrapping_add(1);

        let mut events = Vec::new();
        for ev in self.world.take_events() {
            match ev {
                WorldEvent::SnakeDied { id } => {
                    for seat in self.seats.values_mut() {
                        if seat.snake == Some(id) {
                            seat.snake = None;
                        }
                    }
                    events.push(Event {
                        kind: "death".to_owned(),
                        id: id.data().as_ffi(),
                    });
                }
            }
        }

        let snakes = build_snakes(&self.world);
        let food = build_food(&self.world);

        let mut outbound = Vec::with_capacity(self.seats.len());
        for session_id in self.seats.keys().copied() {
            outbound.push(OutboundMessage {
                session_id,
                message: ServerMessage::Snapshot {
                    server_tick: self.server_tick,
                    snakes: snakes.clone(),
                    food: food.clone(),
                    events: events.clone(),
                },
            });
        }
        outbound
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

fn build_snakes(world: &SlitherWorld) -> Vec<SnakeState> {
    world
        .db
        .units()
        .filter_map(|(id, unit)| {
            let head = unit.head()?;
            let segments = head
                .parts
                .iter()
                .filter_map(|pid| world.db.unit(*pid))
                .map(|p| Vec2f {
                    x: p.pos.x,
                    y: p.pos.y,
                })
                .collect();
            Some(SnakeState {
                id: id.data().as_ffi(),
                name: head.name.clone(),
                head: Vec2f {
                    x: unit.pos.x,
                    y: unit.pos.y,
                },
                angle: unit.angle,
                radius: unit.radius,
                exp: head.exp,
                boost: head.boost,
                segments,
            })
        })
        .collect()
}

fn build_food(world: &SlitherWorld) -> Vec<FoodState> {
    world
        .db
        .foods()
        .map(|(_, f)| FoodState {
            pos: Vec2f {
                x: f.pos.x,
                y: f.pos.y,
            },
            radius: f.radius,
            color: f.color as u8,
        })
        .collect()
}
