use fnv::{FnvHashMap, FnvHashSet};
use tracing::trace;

use crate::error::GameError;
use crate::game::*;
use crate::helpers::Tally;
use crate::strategy::*;

mod code;

use self::code::*;

pub const NAME: &str = "gencoder";

// a card that survives a discard is played above this chance of being playable
const SEMI_SAFE_PLAY: f64 = 0.85;
// with this few draws left, clues are given instead of discards
const NEAR_END_DRAWS: i64 = 2;

// General encoding: every clue names a tuple of residues, each the sum of
// the rank or color groups of one card per other player. The code itself is
// chosen by a search every player repeats from a turn-seeded generator.
//
// Vanilla tables of 2 to 5 players only.
pub struct EncodingConfig;

impl GameStrategyConfig for EncodingConfig {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_table(&self, opts: &GameOptions, seats: &[&'static str]) -> Result<(), GameError> {
        if opts.variant != Variant::NoVariant {
            return Err(GameError::UnsupportedVariant {
                strategy: NAME,
                variant: opts.variant,
            });
        }
        if !(2..=5).contains(&opts.num_players) {
            return Err(GameError::PlayerCount {
                strategy: NAME,
                min: 2,
                max: 5,
                found: opts.num_players,
            });
        }
        if let Some((seat, &other)) = seats.iter().enumerate().find(|(_, &name)| name != NAME) {
            return Err(GameError::IncompatiblePlayer {
                strategy: NAME,
                seat: seat as Player,
                other: other.to_string(),
            });
        }
        if !opts.allow_empty_hints {
            return Err(GameError::BadOption(format!(
                "{} clues may touch nothing",
                NAME
            )));
        }
        Ok(())
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(EncodingStrategy)
    }
}

pub struct EncodingStrategy;

impl GameStrategy for EncodingStrategy {
    fn initialize(&self, player: Player, view: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(EncodingPlayer::new(player, view))
    }
}

pub struct EncodingPlayer {
    me: Player,
    hand_size: usize,
    // what the whole table has worked out about every card in a hand
    table: FnvHashMap<CardId, Possibilities>,
    tally: Tally,
}

impl EncodingPlayer {
    pub fn new(me: Player, view: &PlayerView<'_>) -> EncodingPlayer {
        let mut player = EncodingPlayer {
            me,
            hand_size: view.board.opts.hand_size as usize,
            table: FnvHashMap::default(),
            tally: Tally::new(),
        };
        player.track_hands(view);
        player
    }

    fn possibilities(&self, card_id: CardId) -> Possibilities {
        self.table
            .get(&card_id)
            .cloned()
            .unwrap_or_else(Possibilities::unknown)
    }

    fn track_hands(&mut self, view: &PlayerView<'_>) {
        let in_play = view
            .board
            .get_players()
            .flat_map(|player| view.hands()[player].iter().copied())
            .collect::<FnvHashSet<_>>();
        self.table.retain(|card_id, _| in_play.contains(card_id));
        for &card_id in &in_play {
            self.table
                .entry(card_id)
                .or_insert_with(Possibilities::unknown);
        }
    }

    fn slots(&self, view: &PlayerView<'_>) -> Vec<Vec<Possibilities>> {
        view.board
            .get_players()
            .map(|player| {
                view.hands()[player]
                    .iter()
                    .map(|&card_id| self.possibilities(card_id))
                    .collect()
            })
            .collect()
    }

    fn visible_hands(&self, view: &PlayerView<'_>) -> Vec<Vec<Card>> {
        view.board
            .get_players()
            .map(|player| {
                if player == self.me {
                    Vec::new()
                } else {
                    view.hand(player)
                }
            })
            .collect()
    }

    fn heights(view: &PlayerView<'_>) -> Vec<Value> {
        VANILLA_COLORS
            .iter()
            .map(|&color| view.board.progress(color))
            .collect()
    }

    fn code_for(&self, turn: u32, hinter: Player, view: &PlayerView<'_>) -> Result<Code, GameError> {
        generate_code(
            turn,
            hinter,
            &Self::heights(view),
            &self.slots(view),
            self.hand_size,
        )
        .ok_or_else(|| GameError::protocol(self.me, format!("no code for turn {}", turn)))
    }

    fn read_clue(
        &mut self,
        turn: u32,
        hinter: Player,
        hint: &Hint,
        view: &PlayerView<'_>,
    ) -> Result<(), GameError> {
        let code = self.code_for(turn, hinter, view)?;
        let restrictions = decode(&code, hinter, hint, self.me, &self.visible_hands(view))
            .ok_or_else(|| {
                GameError::protocol(
                    self.me,
                    format!("clue {:?} of player {} is outside its code", hint, hinter),
                )
            })?;
        for restriction in restrictions {
            let hand = &view.hands()[restriction.player];
            let card_id = match hand.get(restriction.column) {
                Some(&card_id) => card_id,
                None => continue,
            };
            if let Some(possible) = self.table.get_mut(&card_id) {
                code.components[restriction.component]
                    .axis
                    .restrict(restriction.group, possible);
            }
        }
        trace!(
            "Player {} reads {:?} from player {} with {} residues",
            self.me,
            hint,
            hinter,
            code.components.len()
        );
        Ok(())
    }

    // the clue tokens themselves
    fn apply_tokens(&mut self, view: &PlayerView<'_>) {
        for player in view.board.get_players() {
            for &card_id in &view.hands()[player] {
                let knowledge = view.knowledge(card_id);
                let possible = match self.table.get_mut(&card_id) {
                    Some(possible) => possible,
                    None => continue,
                };
                for hinted in knowledge.direct() {
                    match *hinted {
                        Hinted::Value(value) => possible.ranks.retain(|&v| v == value),
                        Hinted::Color(color) => possible.colors.retain(|&c| c == color),
                    }
                }
                for hinted in knowledge.indirect() {
                    match *hinted {
                        Hinted::Value(value) => possible.ranks.retain(|&v| v != value),
                        Hinted::Color(color) => possible.colors.retain(|&c| c != color),
                    }
                }
            }
        }
    }

    // Drops identities whose copies are all discarded, played, or pinned down
    // in some hand, until nothing changes.
    fn count_cards(&mut self, view: &PlayerView<'_>) {
        loop {
            let mut counts = view.board.public_counts();
            for possible in self.table.values() {
                if possible.is_determined() {
                    if let Some(card) = possible.cards().next() {
                        counts.increment(&card);
                    }
                }
            }
            let mut improved = false;
            for possible in self.table.values_mut() {
                if !possible.is_determined()
                    && possible.retain_cards(|card| counts.remaining(card) > 0)
                {
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
    }

    fn check(&self, view: &PlayerView<'_>) -> Result<(), GameError> {
        for player in view.board.get_players() {
            for (slot, &card_id) in view.hands()[player].iter().enumerate() {
                let possible = self.possibilities(card_id);
                if player == self.me {
                    if possible.is_empty() {
                        return Err(GameError::protocol(
                            self.me,
                            format!("nothing fits my card in slot {} ({})", slot, possible),
                        ));
                    }
                    continue;
                }
                let card = view.hand(player)[slot];
                if !possible.contains(&card) {
                    return Err(GameError::EmptyPossibilities {
                        player,
                        card,
                        slot,
                        knowledge: possible.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn give_clue(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let code = self.code_for(view.board.turn, self.me, view)?;
        let hint = encode(&code, self.me, &self.visible_hands(view))
            .ok_or_else(|| GameError::protocol(self.me, "cannot encode the hands I see"))?;
        trace!("Player {} encodes with {:?} as {:?}", self.me, code, hint);
        Ok(TurnChoice::Hint(hint))
    }
}

// Average of `value` over the identities of `possible`, weighted by copies
// left in `counts`.
fn weighted_average(
    possible: &Possibilities,
    counts: &CardCounts,
    value: impl Fn(&Card) -> f64,
) -> f64 {
    let mut total = 0.0;
    let mut copies = 0.0;
    for card in possible.cards() {
        let left = counts.remaining(&card) as f64;
        total += left * value(&card);
        copies += left;
    }
    if copies > 0.0 {
        total / copies
    } else {
        0.0
    }
}

impl PlayerStrategy for EncodingPlayer {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let board = view.board;
        let mine = view.hands()[self.me]
            .iter()
            .map(|&card_id| self.possibilities(card_id))
            .collect::<Vec<_>>();
        let public = board.public_counts();
        let mut unseen = public.clone();
        for player in view.other_players() {
            for card in view.hand(player) {
                unseen.increment(&card);
            }
        }

        let slots_where = |test: &dyn Fn(&Card) -> bool| {
            (0..mine.len())
                .filter(|&slot| !mine[slot].is_empty() && mine[slot].cards().all(|card| test(&card)))
                .collect::<Vec<_>>()
        };
        let playable = slots_where(&|card| board.is_playable(card));
        let safe = slots_where(&|card| board.was_played(card) || public.remaining(card) > 1);
        let safer = slots_where(&|card| public.remaining(card) > 2);
        let safest = slots_where(&|card| board.was_played(card));

        if !safe.is_empty() && board.mistakes() < 2 {
            let mut best: Option<(usize, f64)> = None;
            for &slot in &safer {
                let chance = weighted_average(&mine[slot], &unseen, |card| {
                    if board.is_playable(card) {
                        1.0
                    } else {
                        0.0
                    }
                });
                if best.map_or(true, |(_, so_far)| chance > so_far) {
                    best = Some((slot, chance));
                }
            }
            if let Some((slot, chance)) = best {
                if chance >= SEMI_SAFE_PLAY {
                    self.tally.record("semi-safe play");
                    return Ok(TurnChoice::Play(slot));
                }
            }
        }

        let mut lowest: Option<(usize, f64)> = None;
        for &slot in &playable {
            let expected = weighted_average(&mine[slot], &unseen, |card| card.value as f64);
            if lowest.map_or(true, |(_, so_far)| expected < so_far) {
                lowest = Some((slot, expected));
            }
        }
        if let Some((slot, _)) = lowest {
            return Ok(TurnChoice::Play(slot));
        }

        let num_players = board.opts.num_players;
        let drawn_after_deal = view
            .history()
            .iter()
            .filter(|record| !matches!(record.choice, TurnChoice::Hint(_)))
            .count() as i64;
        let draws_left = board.opts.total_cards() as i64
            - drawn_after_deal
            - (num_players as usize * self.hand_size) as i64;
        if draws_left <= NEAR_END_DRAWS && board.hints_remaining > 0 {
            return self.give_clue(view);
        }

        if !safe.is_empty() && board.hints_remaining + 1 < num_players {
            let slot = safest
                .first()
                .or_else(|| safer.first())
                .or_else(|| safe.first())
                .copied()
                .unwrap_or(0);
            return Ok(TurnChoice::Discard(slot));
        }

        if board.hints_remaining == 0 {
            self.tally.record("blind discard at 0 clues");
            return Ok(TurnChoice::Discard(0));
        }
        self.give_clue(view)
    }

    fn update(&mut self, turn_record: &TurnRecord, view: &PlayerView<'_>) -> Result<(), GameError> {
        self.track_hands(view);
        if let TurnChoice::Hint(hint) = turn_record.choice {
            self.read_clue(turn_record.turn, turn_record.player, &hint, view)?;
        }
        self.apply_tokens(view);
        self.count_cards(view);
        self.check(view)
    }

    fn tally(&self) -> Tally {
        self.tally.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::new_deck;

    #[test]
    fn tables_are_vanilla_encoders_only() {
        let config = EncodingConfig;
        let opts = GameOptions::new(3, Variant::Rainbow);
        assert!(matches!(
            config.check_table(&opts, &[NAME; 3]),
            Err(GameError::UnsupportedVariant { .. })
        ));
        let opts = GameOptions::new(6, Variant::NoVariant);
        assert!(matches!(
            config.check_table(&opts, &[NAME; 6]),
            Err(GameError::PlayerCount { found: 6, .. })
        ));
        let opts = GameOptions::new(3, Variant::NoVariant);
        assert!(matches!(
            config.check_table(&opts, &[NAME, "hat", NAME]),
            Err(GameError::IncompatiblePlayer { seat: 1, .. })
        ));
        assert!(config.check_table(&opts, &[NAME; 3]).is_ok());
    }

    #[test]
    fn every_reader_agrees_after_a_clue() {
        let opts = GameOptions::new(3, Variant::NoVariant);
        let mut game = GameState::new(&opts, new_deck(opts.variant, 4));
        let mut players = game
            .get_players()
            .map(|player| EncodingPlayer::new(player, &game.get_view(player)))
            .collect::<Vec<_>>();

        let clue = players[0].give_clue(&game.get_view(0)).unwrap();
        let record = game.process_choice(clue).unwrap();
        for player in game.get_players() {
            players[player as usize]
                .update(&record, &game.get_view(player))
                .unwrap();
        }
        // the table is public, so every reader holds the same one
        for player in 1..3 {
            assert_eq!(players[player].table, players[0].table);
        }
        let narrowed = players[0]
            .table
            .values()
            .filter(|possible| possible.cards().count() < 25)
            .count();
        assert!(narrowed > 0);
    }
}
