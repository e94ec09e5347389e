use std::time::Duration;

use chess_client::session::{GameMode, PlayerSide};
use serde::{Deserialize, Serialize};


// Example:
//   poll_interval: 1s
//   default_mode: PVP
//   default_side: WHITE
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,
    // Picked automatically instead of asking. Command-line flags take precedence.
    #[serde(default)]
    pub default_mode: Option<GameMode>,
    #[serde(default)]
    pub default_side: Option<PlayerSide>,
}
