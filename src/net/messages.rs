use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub v: u8,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub v: u8,
    #[serde(flatten)]
    pub msg: ServerMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        name: String,
    },
    /// Target point in world coordinates plus boost intent.
    Steer {
        target: Vec2f,
        boost: bool,
    },
    Ping {
        client_time: f32,
    },
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        snake_id: u64,
        tick_rate: u16,
        world: WorldInfo,
    },
    /// Full post-tick state; clients render straight from this.
    Snapshot {
        server_tick: u32,
        snakes: Vec<SnakeState>,
        food: Vec<FoodState>,
        events: Vec<Event>,
    },
    Pong {
        server_time: f32,
        client_time: f32,
    },
    SnakeLeft {
        id: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldInfo {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeState {
    pub id: u64,
    pub name: String,
    pub head: Vec2f,
    pub angle: f32,
    pub radius: f32,
    pub exp: f32,
    pub boost: bool,
    /// Segment centers in chain order, head excluded.
    pub segments: Vec<Vec2f>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodState {
    pub pos: Vec2f,
    pub radius: f32,
    pub color: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub id: u64,
}
