// Player association entity
// A game-specific player reference bound to one game server

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAssociation {
    /// Association id, the `player` key of every tracking row.
    pub id: String,
    /// Domain-wide player id.
    pub player_id: String,
    pub game_server_id: String,
    /// Player reference as reported by the game server.
    pub game_id: String,
}
