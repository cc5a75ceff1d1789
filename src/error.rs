use std::path::PathBuf;

use thiserror::Error;

use crate::cards::{Card, Variant};
use crate::game::Player;

/// Everything that can abort a round.
///
/// Misplays are not errors: they are a legal outcome that costs a life.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown strategy {name:?}")]
    UnknownStrategy { name: String },
    #[error("{strategy} supports {min} to {max} players, but the table has {found}")]
    PlayerCount {
        strategy: &'static str,
        min: u32,
        max: u32,
        found: u32,
    },
    #[error("{strategy} must only play with other {strategy} players, but seat {seat} is {other:?}")]
    IncompatiblePlayer {
        strategy: &'static str,
        seat: Player,
        other: String,
    },
    #[error("{strategy} cannot play the {variant} variant")]
    UnsupportedVariant {
        strategy: &'static str,
        variant: Variant,
    },
    #[error("invalid option: {0}")]
    BadOption(String),
    #[error("player {player} made an illegal move: {reason}")]
    IllegalMove { player: Player, reason: String },
    #[error("player {player} looked at their own hand")]
    OwnHandPeek { player: Player },
    #[error("protocol violation seen by player {player}: {detail}")]
    Protocol { player: Player, detail: String },
    #[error("player {player} holds card {card} in slot {slot} ({knowledge}), which contradicts every possibility")]
    EmptyPossibilities {
        player: Player,
        card: Card,
        slot: usize,
        knowledge: String,
    },
    #[error("failed to write replay {path:?}: {source}")]
    Replay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize replay {path:?}: {source}")]
    ReplayFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GameError {
    /// Errors detected before the first turn is played.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GameError::UnknownStrategy { .. }
                | GameError::PlayerCount { .. }
                | GameError::IncompatiblePlayer { .. }
                | GameError::UnsupportedVariant { .. }
                | GameError::BadOption(_)
        )
    }

    pub(crate) fn illegal(player: Player, reason: impl Into<String>) -> Self {
        GameError::IllegalMove {
            player,
            reason: reason.into(),
        }
    }

    pub(crate) fn protocol(player: Player, detail: impl Into<String>) -> Self {
        GameError::Protocol {
            player,
            detail: detail.into(),
        }
    }
}
