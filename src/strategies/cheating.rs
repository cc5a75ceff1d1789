use crate::error::GameError;
use crate::game::*;
use crate::helpers::{highest_value_index, lowest_value_index};
use crate::strategy::*;

pub const CHEATER: &str = "cheater";
pub const IDIOT: &str = "idiot";

// Strategies that read their own cards through `peek_own_hand`.
// They are baselines, and fail on a policed table.

fn playable_index(cards: &[Card], board: &BoardState<'_>) -> Option<usize> {
    lowest_value_index(
        cards,
        (0..cards.len()).filter(|&index| board.is_playable(&cards[index])),
    )
}

// Plays whatever it can, discards its oldest card otherwise. Never clues.
pub struct IdiotConfig;

impl GameStrategyConfig for IdiotConfig {
    fn name(&self) -> &'static str {
        IDIOT
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(IdiotStrategy)
    }
}

pub struct IdiotStrategy;

impl GameStrategy for IdiotStrategy {
    fn initialize(&self, _: Player, _: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(IdiotPlayer)
    }
}

pub struct IdiotPlayer;

impl PlayerStrategy for IdiotPlayer {
    fn name(&self) -> String {
        IDIOT.to_string()
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let cards = view.peek_own_hand()?;
        Ok(match playable_index(&cards, view.board) {
            Some(index) => TurnChoice::Play(index),
            None => TurnChoice::Discard(0),
        })
    }

    fn update(&mut self, _: &TurnRecord, _: &PlayerView<'_>) -> Result<(), GameError> {
        Ok(())
    }
}

// Looks at its own cards and tries to make good moves with them.
// Its clues carry no meaning; they only pass the turn without discarding.
pub struct CheatingConfig;

impl GameStrategyConfig for CheatingConfig {
    fn name(&self) -> &'static str {
        CHEATER
    }

    fn check_table(&self, opts: &GameOptions, _: &[&'static str]) -> Result<(), GameError> {
        if !opts.allow_empty_hints {
            return Err(GameError::BadOption(format!(
                "{} stalls with clues that may touch nothing",
                CHEATER
            )));
        }
        Ok(())
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(CheatingStrategy)
    }
}

pub struct CheatingStrategy;

impl GameStrategy for CheatingStrategy {
    fn initialize(&self, player: Player, _: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(CheatingPlayer { me: player })
    }
}

pub struct CheatingPlayer {
    me: Player,
}

impl CheatingPlayer {
    // players after me, in turn order
    fn others_in_order(&self, view: &PlayerView<'_>) -> Vec<Player> {
        let n = view.board.opts.num_players;
        (1..n).map(|offset| (self.me + offset) % n).collect()
    }

    // every card in a hand other than `player`'s
    fn visible_to(&self, view: &PlayerView<'_>, player: Player, mine: &[Card]) -> Vec<Card> {
        view.board
            .get_players()
            .filter(|&other| other != player)
            .flat_map(|other| {
                if other == self.me {
                    mine.to_vec()
                } else {
                    view.hand(other)
                }
            })
            .collect()
    }

    /// The least bad discard from `cards`, and how bad it is.
    ///
    /// 1 for a useless card, 4 for a card visible elsewhere, 10 to 40 for the
    /// first copy of a 4 down to a 1, 100 or more for a critical card.
    fn want_to_discard(
        &self,
        cards: &[Card],
        visible: &[Card],
        board: &BoardState<'_>,
    ) -> (u32, usize) {
        if let Some(index) = cards.iter().position(|card| board.was_played(card)) {
            return (1, index);
        }
        if let Some(index) = (1..cards.len())
            .rev()
            .find(|&index| cards[..index].contains(&cards[index]))
        {
            return (1, index);
        }
        let seen = (0..cards.len()).filter(|&index| visible.contains(&cards[index]));
        if let Some(index) = lowest_value_index(cards, seen) {
            return (4, index);
        }
        let first_copies = (0..cards.len()).filter(|&index| {
            let card = &cards[index];
            board.discard.get_count(card) == 0 && card.value != FINAL_VALUE
        });
        if let Some(index) = highest_value_index(cards, first_copies) {
            return (50 - 10 * cards[index].value, index);
        }
        match highest_value_index(cards, 0..cards.len()) {
            Some(index) => (600 - 100 * cards[index].value, index),
            None => (0, 0),
        }
    }

    fn stall(&self, view: &PlayerView<'_>, value: Value) -> TurnChoice {
        TurnChoice::Hint(Hint {
            player: view.board.player_to_left(self.me),
            hinted: Hinted::Value(value),
        })
    }
}

impl PlayerStrategy for CheatingPlayer {
    fn name(&self) -> String {
        CHEATER.to_string()
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let board = view.board;
        let cards = view.peek_own_hand()?;

        if let Some(index) = playable_index(&cards, board) {
            return Ok(TurnChoice::Play(index));
        }
        if board.hints_remaining == board.opts.num_hints {
            return Ok(self.stall(view, 5));
        }

        let endgame = board.unplayed_playable_count() as i32 - board.deck_size as i32;
        let within_reach = self
            .others_in_order(view)
            .into_iter()
            .take(board.hints_remaining as usize)
            .collect::<Vec<_>>();
        if endgame > 0 {
            let i_hold_something = cards.iter().any(|card| !board.was_played(card));
            for &other in &within_reach {
                let hand = view.hand(other);
                if playable_index(&hand, board).is_some() {
                    return Ok(self.stall(view, 4));
                }
                // let someone with nothing useful discard instead of me
                if endgame > 1
                    && i_hold_something
                    && hand.iter().all(|card| board.was_played(card))
                {
                    return Ok(self.stall(view, 4));
                }
            }
        }

        let (badness, index) =
            self.want_to_discard(&cards, &self.visible_to(view, self.me, &cards), board);
        if board.hints_remaining + badness < 10 || board.hints_remaining == 0 {
            return Ok(TurnChoice::Discard(index));
        }
        let least_other = within_reach
            .iter()
            .map(|&other| {
                let hand = view.hand(other);
                if playable_index(&hand, board).is_some() {
                    0
                } else {
                    self.want_to_discard(&hand, &self.visible_to(view, other, &cards), board)
                        .0
                }
            })
            .min();
        match least_other {
            // someone can play or discard more safely before hints run out
            Some(other) if other < badness => Ok(self.stall(view, 3)),
            _ => Ok(TurnChoice::Discard(index)),
        }
    }

    fn update(&mut self, _: &TurnRecord, _: &PlayerView<'_>) -> Result<(), GameError> {
        Ok(())
    }
}
