use float_ord::FloatOrd;
use tracing::trace;

use crate::error::GameError;
use crate::game::*;
use crate::info::CardPossibilityTable;
use crate::strategy::*;

pub const NAME: &str = "heuristic";

// below this chance of being playable, a card is discarded instead
const PLAY_THRESHOLD: f32 = 0.45;

// Guesses at its own cards from what it can count: clue tokens, the
// fireworks, the discard pile and the other hands.
pub struct HeuristicConfig;

impl GameStrategyConfig for HeuristicConfig {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(HeuristicStrategy)
    }
}

pub struct HeuristicStrategy;

impl GameStrategy for HeuristicStrategy {
    fn initialize(&self, player: Player, _: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(HeuristicPlayer { me: player })
    }
}

pub struct HeuristicPlayer {
    me: Player,
}

impl HeuristicPlayer {
    /// A weighted table per card in my hand, oldest first.
    pub fn my_tables(&self, view: &PlayerView<'_>) -> Vec<CardPossibilityTable> {
        let variant = view.board.opts.variant;
        let mut counts = view.board.public_counts();
        for player in view.other_players() {
            for card in view.hand(player) {
                counts.increment(&card);
            }
        }
        view.hand_knowledge(self.me)
            .into_iter()
            .map(|knowledge| CardPossibilityTable::for_card(knowledge, variant, &counts))
            .collect()
    }
}

impl PlayerStrategy for HeuristicPlayer {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let odds = self
            .my_tables(view)
            .iter()
            .map(|table| table.probability_is_playable(view.board))
            .collect::<Vec<_>>();
        trace!("Player {} playable odds {:?}", self.me, odds);

        // earliest of the most likely, latest of the least likely
        let best = odds
            .iter()
            .enumerate()
            .min_by_key(|&(_, &p)| FloatOrd(-p));
        let worst = odds
            .iter()
            .enumerate()
            .max_by_key(|&(_, &p)| FloatOrd(-p));
        match (best, worst) {
            (Some((index, &p)), _) if p > PLAY_THRESHOLD => Ok(TurnChoice::Play(index)),
            (_, Some((index, _))) => Ok(TurnChoice::Discard(index)),
            _ => Ok(TurnChoice::Resign),
        }
    }

    fn update(&mut self, _: &TurnRecord, _: &PlayerView<'_>) -> Result<(), GameError> {
        Ok(())
    }
}
