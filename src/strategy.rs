use crate::error::GameError;
use crate::game::*;
use crate::helpers::Tally;

// Traits to implement for any valid Hanabi strategy

// Represents the strategy of a given player
pub trait PlayerStrategy {
    // A function returning the name of a strategy.
    // This is a method of PlayerStrategy rather than GameStrategyConfig
    // so that the name may incorporate useful information that's specific
    // to this player instance.
    fn name(&self) -> String;
    // A function to decide what to do on the player's turn.
    // Given a PlayerView, outputs their choice.
    //
    // An error aborts the round.
    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError>;
    // A function to update internal state after every turn, including our own.
    // Given what happened last turn, and the new state.
    fn update(&mut self, turn_record: &TurnRecord, view: &PlayerView<'_>) -> Result<(), GameError>;
    // Fallbacks taken so far, reported at the end of a run.
    fn tally(&self) -> Tally {
        Tally::new()
    }
}

// Represents the overall strategy for a game
// Shouldn't do much, except store configuration parameters and
// possibility initialize some shared randomness between players
pub trait GameStrategy {
    fn initialize(&self, player: Player, view: &PlayerView<'_>) -> Box<dyn PlayerStrategy>;
}

// Represents configuration for a strategy.
// Acts as a factory for game strategies, so we can play many rounds
pub trait GameStrategyConfig {
    fn name(&self) -> &'static str;
    // Rejects tables this strategy cannot play, before the first turn.
    // `seats` holds the strategy name of every seat, in turn order.
    fn check_table(&self, _opts: &GameOptions, _seats: &[&'static str]) -> Result<(), GameError> {
        Ok(())
    }
    fn initialize(&self, opts: &GameOptions) -> Box<dyn GameStrategy>;
}
