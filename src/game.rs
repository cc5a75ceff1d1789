use fnv::FnvHashMap;
use std::fmt;
use std::ops::Range;
use tracing::debug;

pub use crate::cards::*;
pub use crate::hints::{CardId, CardKnowledge};

use crate::error::GameError;
use crate::helpers::PerPlayer;

pub type Player = u32;

// card ids, oldest first
pub type Hand = Vec<CardId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hint {
    pub player: Player,
    pub hinted: Hinted,
}

// represents the choice a player made in a given turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnChoice {
    Hint(Hint),
    Discard(usize), // index of card to discard
    Play(usize),    // index of card to play
    Resign,
}

// represents what happened in a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    // vector of whether each card in the receiver's hand was touched
    Hint(Vec<bool>),
    Discard(Card),
    // card played, and whether it landed on its firework
    Play(Card, bool),
    Resign,
}

// represents a turn taken in the game
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub turn: u32,
    pub player: Player,
    pub choice: TurnChoice,
    pub result: TurnResult,
}

/// What a round is worth when the last life is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringPolicy {
    #[default]
    ZeroOnStrikeout,
    KeepPartial,
}

// represents possible settings for the game
#[derive(Debug, Clone)]
pub struct GameOptions {
    pub num_players: u32,
    pub hand_size: u32,
    // when hits 0, you cannot hint
    pub num_hints: u32,
    // when hits 0, you lose
    pub num_lives: u32,
    pub variant: Variant,
    // whether to allow hints that reveal no cards
    pub allow_empty_hints: bool,
    pub scoring: ScoringPolicy,
    // reject strategies that read their own cards
    pub policing: bool,
}
impl GameOptions {
    pub fn new(num_players: u32, variant: Variant) -> GameOptions {
        GameOptions {
            num_players,
            hand_size: if num_players <= 3 { 5 } else { 4 },
            num_hints: 8,
            num_lives: 3,
            variant,
            allow_empty_hints: true,
            scoring: ScoringPolicy::default(),
            policing: false,
        }
    }

    pub fn total_cards(&self) -> u32 {
        self.variant.total_cards()
    }
}

// State of everything except the player's hands
// Is all completely common knowledge
#[derive(Debug, Clone)]
pub struct BoardState<'game> {
    pub opts: &'game GameOptions,
    pub deck_size: u32,
    pub discard: Discard,
    pub fireworks: FnvHashMap<Color, Firework>,

    // which turn is it?
    pub turn: u32,
    // whose turn is it?
    pub player: Player,

    pub hints_remaining: u32,
    pub lives_remaining: u32,
    // only relevant when deck runs out
    pub deckless_turns_remaining: u32,
    pub resigned: bool,
    pub turn_history: Vec<TurnRecord>,
}
impl<'game> BoardState<'game> {
    pub fn new(opts: &'game GameOptions, deck_size: u32) -> BoardState<'game> {
        let fireworks = opts
            .variant
            .colors()
            .iter()
            .map(|&color| (color, Firework::new(color)))
            .collect::<FnvHashMap<_, _>>();

        BoardState {
            opts,
            deck_size,
            discard: Discard::new(opts.variant),
            fireworks,
            turn: 1,
            player: 0,
            hints_remaining: opts.num_hints,
            lives_remaining: opts.num_lives,
            // number of turns to play with deck length ran out
            deckless_turns_remaining: opts.num_players + 1,
            resigned: false,
            turn_history: Vec::new(),
        }
    }

    fn try_add_hint(&mut self) {
        if self.hints_remaining < self.opts.num_hints {
            self.hints_remaining += 1;
        }
    }

    pub fn get_firework(&self, color: Color) -> &Firework {
        &self.fireworks[&color]
    }

    pub fn progress(&self, color: Color) -> Value {
        self.get_firework(color).top
    }

    // returns whether a card would place on a firework
    pub fn is_playable(&self, card: &Card) -> bool {
        Some(card.value) == self.get_firework(card.color).needed_value()
    }

    // best possible value we can get for firework of that color,
    // based on looking at discard + fireworks
    fn highest_attainable(&self, color: Color) -> Value {
        let firework = self.get_firework(color);
        if firework.complete() {
            return FINAL_VALUE;
        }
        let needed = firework.top + 1;
        for &value in VALUES.iter() {
            if value < needed {
                // already have these cards
                continue;
            }
            if self.discard.has_all(&Card::new(color, value)) {
                // never going to get these cards
                return value - 1;
            }
        }
        FINAL_VALUE
    }

    // is part of a firework already
    pub fn was_played(&self, card: &Card) -> bool {
        card.value <= self.get_firework(card.color).top
    }

    // is never going to play, based on discard + fireworks
    pub fn is_dead(&self, card: &Card) -> bool {
        self.was_played(card) || card.value > self.highest_attainable(card.color)
    }

    // the last unplayed copy of its identity
    pub fn is_critical(&self, card: &Card) -> bool {
        !self.was_played(card) && self.discard.remaining(card) == 1
    }

    // can be discarded without necessarily sacrificing score
    pub fn is_dispensable(&self, card: &Card) -> bool {
        self.is_dead(card) || self.discard.remaining(card) > 1
    }

    /// Copies that are out of everyone's hands: discarded or on a firework.
    pub fn public_counts(&self) -> CardCounts {
        let mut counts = self.discard.counts().clone();
        for firework in self.fireworks.values() {
            for value in 1..=firework.top {
                counts.increment(&Card::new(firework.color, value));
            }
        }
        counts
    }

    /// Cards that can still be added to the fireworks.
    pub fn unplayed_playable_count(&self) -> u32 {
        self.opts
            .variant
            .colors()
            .iter()
            .map(|&color| self.highest_attainable(color) - self.progress(color))
            .sum()
    }

    pub fn get_players(&self) -> Range<Player> {
        0..self.opts.num_players
    }

    pub fn score(&self) -> Score {
        self.fireworks.values().map(Firework::score).sum()
    }

    /// Score after applying the configured strikeout policy.
    pub fn final_score(&self) -> Score {
        if self.lives_remaining == 0 && self.opts.scoring == ScoringPolicy::ZeroOnStrikeout {
            0
        } else {
            self.score()
        }
    }

    pub fn mistakes(&self) -> u32 {
        self.opts.num_lives - self.lives_remaining
    }

    pub fn is_over(&self) -> bool {
        (self.lives_remaining == 0)
            || (self.deckless_turns_remaining == 0)
            || self.resigned
            || self.fireworks.values().all(Firework::complete)
    }

    pub fn player_to_left(&self, player: Player) -> Player {
        (player + 1) % self.opts.num_players
    }

    pub fn player_to_right(&self, player: Player) -> Player {
        (player + self.opts.num_players - 1) % self.opts.num_players
    }
}
impl fmt::Display for BoardState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Turn {} (Player {}'s turn):", self.turn, self.player)?;
        writeln!(f, "{} cards remaining in deck", self.deck_size)?;
        if self.deck_size == 0 {
            writeln!(
                f,
                "Deck is empty.  {} turns remaining in game",
                self.deckless_turns_remaining
            )?;
        }
        writeln!(
            f,
            "{}/{} hints remaining",
            self.hints_remaining, self.opts.num_hints
        )?;
        writeln!(
            f,
            "{}/{} lives remaining",
            self.lives_remaining, self.opts.num_lives
        )?;
        f.write_str("Fireworks:\n")?;
        for &color in self.opts.variant.colors() {
            writeln!(f, "  {}", self.get_firework(color))?;
        }
        f.write_str("Discard:\n")?;
        writeln!(f, "{}", self.discard)
    }
}

// complete game view of a given player
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'a> {
    me: Player,
    pub board: &'a BoardState<'a>,
    hands: &'a PerPlayer<Hand>,
    deck: &'a [Card],
    knowledge: &'a [CardKnowledge],
    hand_history: &'a [PerPlayer<Hand>],
}
impl<'a> PlayerView<'a> {
    pub fn me(&self) -> Player {
        self.me
    }

    pub fn hands(&self) -> &'a PerPlayer<Hand> {
        self.hands
    }

    pub fn hand_size(&self, player: Player) -> usize {
        self.hands[player].len()
    }

    pub fn my_hand_size(&self) -> usize {
        self.hand_size(self.me)
    }

    pub fn other_players(&self) -> impl Iterator<Item = Player> + 'a {
        let me = self.me;
        self.board.get_players().filter(move |&player| player != me)
    }

    pub fn history(&self) -> &'a [TurnRecord] {
        &self.board.turn_history
    }

    fn drawn(&self) -> u32 {
        self.deck.len() as u32 - self.board.deck_size
    }

    pub fn card(&self, card_id: CardId) -> Card {
        assert!(card_id < self.drawn(), "Cannot query about undrawn cards!");
        assert!(
            !self.hands[self.me].contains(&card_id),
            "Cannot query about your own cards!"
        );
        self.deck[card_id as usize]
    }

    pub fn hand(&self, player: Player) -> Vec<Card> {
        assert!(self.me != player, "Cannot query about your own cards!");
        self.hands[player].iter().map(|&id| self.card(id)).collect()
    }

    pub fn has_card(&self, player: Player, card: &Card) -> bool {
        self.hand(player).contains(card)
    }

    /// Cards of `player` as they stood before `turn` was played.
    pub fn hand_before(&self, turn: u32, player: Player) -> Vec<Card> {
        assert!(self.me != player, "Cannot query about your own cards!");
        self.hand_history[(turn - 1) as usize][player]
            .iter()
            .map(|&id| self.deck[id as usize])
            .collect()
    }

    pub fn knowledge(&self, card_id: CardId) -> &'a CardKnowledge {
        &self.knowledge[card_id as usize]
    }

    pub fn hand_knowledge(&self, player: Player) -> Vec<&'a CardKnowledge> {
        self.hands[player]
            .iter()
            .map(|&id| self.knowledge(id))
            .collect()
    }

    /// Reads the viewer's own cards. Refused when the table is policed.
    pub fn peek_own_hand(&self) -> Result<Vec<Card>, GameError> {
        if self.board.opts.policing {
            return Err(GameError::OwnHandPeek { player: self.me });
        }
        Ok(self.hands[self.me]
            .iter()
            .map(|&id| self.deck[id as usize])
            .collect())
    }
}

// complete game state (known to nobody!)
#[derive(Debug)]
pub struct GameState<'game> {
    pub board: BoardState<'game>,
    pub hands: PerPlayer<Hand>,
    // every card of the round, in draw order, indexed by id
    deck: Cards,
    // indexed by id, for drawn cards only
    knowledge: Vec<CardKnowledge>,
    // all hands before each turn, indexed by turn - 1
    hand_history: Vec<PerPlayer<Hand>>,
}
impl fmt::Display for GameState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("\n")?;
        f.write_str("======\n")?;
        f.write_str("Hands:\n")?;
        f.write_str("======\n")?;
        for player in self.board.get_players() {
            write!(f, "player {}:", player)?;
            for &card_id in &self.hands[player] {
                write!(
                    f,
                    "    {} [{}]",
                    self.deck[card_id as usize], self.knowledge[card_id as usize]
                )?;
            }
            f.write_str("\n")?;
        }
        f.write_str("======\n")?;
        f.write_str("Board:\n")?;
        f.write_str("======\n")?;
        write!(f, "{}", self.board)
    }
}

impl<'game> GameState<'game> {
    /// Deals from the front of `deck`, one full hand per player in turn order.
    pub fn new(opts: &'game GameOptions, deck: Cards) -> GameState<'game> {
        assert_eq!(
            deck.len() as u32,
            opts.total_cards(),
            "deck does not match the variant"
        );
        let board = BoardState::new(opts, deck.len() as u32);
        let mut game = GameState {
            board,
            hands: PerPlayer::new(opts.num_players, |_| Hand::new()),
            deck,
            knowledge: Vec::new(),
            hand_history: Vec::new(),
        };
        for player in game.board.get_players() {
            for _ in 0..opts.hand_size {
                game.draw(player, 0);
            }
        }
        game
    }

    pub fn get_players(&self) -> Range<Player> {
        self.board.get_players()
    }

    pub fn is_over(&self) -> bool {
        self.board.is_over()
    }

    pub fn score(&self) -> Score {
        self.board.score()
    }

    pub fn final_score(&self) -> Score {
        self.board.final_score()
    }

    pub fn card(&self, card_id: CardId) -> Card {
        self.deck[card_id as usize]
    }

    pub fn knowledge(&self, card_id: CardId) -> &CardKnowledge {
        &self.knowledge[card_id as usize]
    }

    // the whole deck in draw order, dealt cards included
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    // get the game state view of a particular player
    pub fn get_view(&self, player: Player) -> PlayerView<'_> {
        PlayerView {
            me: player,
            board: &self.board,
            hands: &self.hands,
            deck: &self.deck,
            knowledge: &self.knowledge,
            hand_history: &self.hand_history,
        }
    }

    fn draw(&mut self, player: Player, turn: u32) {
        if self.board.deck_size == 0 {
            return;
        }
        let card_id = self.deck.len() as CardId - self.board.deck_size;
        self.board.deck_size -= 1;
        self.knowledge.push(CardKnowledge::new(card_id, turn));
        self.hands[player].push(card_id);
        debug!("Drew new card, {}", self.deck[card_id as usize]);
    }

    // takes a card from the player's hand, and replaces it if possible
    fn take_from_hand(&mut self, index: usize) -> Card {
        let player = self.board.player;
        let card_id = self.hands[player].remove(index);
        self.draw(player, self.board.turn);
        self.deck[card_id as usize]
    }

    fn check_slot(&self, index: usize) -> Result<(), GameError> {
        let player = self.board.player;
        if index >= self.hands[player].len() {
            return Err(GameError::illegal(
                player,
                format!(
                    "slot {} does not exist in a hand of {}",
                    index,
                    self.hands[player].len()
                ),
            ));
        }
        Ok(())
    }

    fn check_hint(&self, hint: &Hint) -> Result<(), GameError> {
        let player = self.board.player;
        if self.board.hints_remaining == 0 {
            return Err(GameError::illegal(player, "no hints remaining"));
        }
        if hint.player == player {
            return Err(GameError::illegal(player, "gave a hint to themselves"));
        }
        if hint.player >= self.board.opts.num_players {
            return Err(GameError::illegal(
                player,
                format!("no player {} to hint", hint.player),
            ));
        }
        let valid = match hint.hinted {
            Hinted::Color(color) => self.board.opts.variant.clue_colors().contains(&color),
            Hinted::Value(value) => VALUES.contains(&value),
        };
        if !valid {
            return Err(GameError::illegal(
                player,
                format!("{} cannot be hinted in this variant", hint.hinted),
            ));
        }
        Ok(())
    }

    fn refresh_knowledge(&mut self) -> Result<(), GameError> {
        let variant = self.board.opts.variant;
        let public = self.board.public_counts();
        for player in self.board.get_players() {
            for (slot, &card_id) in self.hands[player].iter().enumerate() {
                let knowledge = &mut self.knowledge[card_id as usize];
                if knowledge.possible_cards(variant, &public).is_empty() {
                    return Err(GameError::EmptyPossibilities {
                        player,
                        card: self.deck[card_id as usize],
                        slot,
                        knowledge: knowledge.to_string(),
                    });
                }
                knowledge.refresh_known(variant, &public);
            }
        }
        Ok(())
    }

    /// Applies one choice of the current player and advances the turn.
    ///
    /// Illegal choices are errors and leave the state untouched. Misplays
    /// are legal: the card goes to the discard pile and a life is lost.
    pub fn process_choice(&mut self, choice: TurnChoice) -> Result<TurnRecord, GameError> {
        let player = self.board.player;
        if self.is_over() {
            return Err(GameError::illegal(player, "the game is already over"));
        }
        match choice {
            TurnChoice::Hint(ref hint) => self.check_hint(hint)?,
            TurnChoice::Discard(index) | TurnChoice::Play(index) => self.check_slot(index)?,
            TurnChoice::Resign => {}
        }

        debug!("Player {}'s move", player);
        self.hand_history.push(self.hands.clone());

        let result = match choice {
            TurnChoice::Hint(ref hint) => {
                self.board.hints_remaining -= 1;
                debug!("Hint to player {}, about {}", hint.player, hint.hinted);

                let variant = self.board.opts.variant;
                let results = self.hands[hint.player]
                    .iter()
                    .map(|&id| self.deck[id as usize].matches(&hint.hinted, variant))
                    .collect::<Vec<_>>();
                if !self.board.opts.allow_empty_hints && !results.contains(&true) {
                    self.hand_history.pop();
                    self.board.hints_remaining += 1;
                    return Err(GameError::illegal(player, "hint touched no cards"));
                }
                for (&id, &matched) in self.hands[hint.player].iter().zip(results.iter()) {
                    self.knowledge[id as usize].mark(hint.hinted, matched);
                }
                TurnResult::Hint(results)
            }
            TurnChoice::Discard(index) => {
                if self.board.hints_remaining == self.board.opts.num_hints {
                    debug!("Discarding with all hints available");
                }
                let card = self.take_from_hand(index);
                debug!("Discard card in position {}, which is {}", index, card);
                self.board.discard.place(card);
                self.board.try_add_hint();
                TurnResult::Discard(card)
            }
            TurnChoice::Play(index) => {
                let card = self.take_from_hand(index);
                debug!("Playing card at position {}, which is {}", index, card);
                let playable = self.board.is_playable(&card);
                if playable {
                    let firework = self
                        .board
                        .fireworks
                        .get_mut(&card.color)
                        .expect("every color has a firework");
                    firework.place(&card);
                    debug!("Successfully played {}!", card);
                    if card.value == FINAL_VALUE {
                        debug!("Firework complete for {}!", card.color);
                        self.board.try_add_hint();
                    }
                } else {
                    self.board.discard.place(card);
                    self.board.lives_remaining -= 1;
                    debug!(
                        "Removing a life! Lives remaining: {}",
                        self.board.lives_remaining
                    );
                }
                TurnResult::Play(card, playable)
            }
            TurnChoice::Resign => {
                debug!("Player {} resigns", player);
                self.board.resigned = true;
                TurnResult::Resign
            }
        };

        self.refresh_knowledge()?;

        let record = TurnRecord {
            turn: self.board.turn,
            player,
            choice,
            result,
        };
        self.board.turn_history.push(record.clone());

        if self.board.deck_size == 0 {
            self.board.deckless_turns_remaining =
                self.board.deckless_turns_remaining.saturating_sub(1);
        }
        self.board.turn += 1;
        self.board.player = self.board.player_to_left(player);
        assert_eq!(
            (self.board.turn - 1) % self.board.opts.num_players,
            self.board.player
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // a deck whose first cards are given, followed by the rest of a full deck
    fn deck_starting_with(variant: Variant, first: &[Card]) -> Cards {
        let mut rest = variant
            .all_cards()
            .flat_map(|card| (0..get_count_for_value(card.value)).map(move |_| card))
            .collect::<Vec<_>>();
        for card in first {
            let index = rest.iter().position(|c| c == card).unwrap();
            rest.remove(index);
        }
        first.iter().copied().chain(rest).collect()
    }

    fn conserved(game: &GameState) -> u32 {
        let in_hands: usize = game.get_players().map(|p| game.hands[p].len()).sum();
        game.board.deck_size + in_hands as u32 + game.board.discard.cards.len() as u32 + game.score()
    }

    #[test]
    fn deals_from_the_front_in_turn_order() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let first = [Card::new('r', 1), Card::new('y', 1), Card::new('g', 1)];
        let game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &first));
        assert_eq!(game.hands[0], vec![0, 1, 2, 3, 4]);
        assert_eq!(game.hands[1], vec![5, 6, 7, 8, 9]);
        assert_eq!(game.card(0), Card::new('r', 1));
        assert_eq!(game.board.deck_size, 40);
        assert_eq!(conserved(&game), 50);
    }

    #[test]
    fn misplay_costs_a_life_and_keeps_progress() {
        let opts = GameOptions::new(4, Variant::NoVariant);
        let first = [Card::new('r', 3)];
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &first));
        let record = game.process_choice(TurnChoice::Play(0)).unwrap();
        assert_eq!(record.result, TurnResult::Play(Card::new('r', 3), false));
        assert_eq!(game.board.mistakes(), 1);
        assert_eq!(game.board.progress('r'), 0);
        assert_eq!(game.hands[0].len(), 4);
        assert!(!game.hands[0].contains(&0));
        assert_eq!(conserved(&game), 50);
    }

    #[test]
    fn playing_a_five_refunds_a_hint_up_to_the_cap() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let first = [
            Card::new('b', 1),
            Card::new('b', 2),
            Card::new('b', 3),
            Card::new('b', 4),
            Card::new('b', 5),
        ];
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &first));
        for _ in 0..4 {
            game.process_choice(TurnChoice::Play(0)).unwrap();
            game.process_choice(TurnChoice::Hint(Hint {
                player: 0,
                hinted: Hinted::Value(1),
            }))
            .unwrap();
        }
        assert_eq!(game.board.hints_remaining, 4);
        game.process_choice(TurnChoice::Play(0)).unwrap();
        assert_eq!(game.board.hints_remaining, 5);
        assert!(game.board.get_firework('b').complete());

        let mut full = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &first));
        full.process_choice(TurnChoice::Discard(4)).unwrap();
        assert_eq!(full.board.hints_remaining, 8);
    }

    #[test]
    fn hints_mark_direct_and_indirect_tokens() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let first = [
            Card::new('r', 1),
            Card::new('r', 2),
            Card::new('y', 1),
            Card::new('g', 3),
            Card::new('b', 4),
            Card::new('r', 4),
            Card::new('w', 1),
            Card::new('w', 2),
            Card::new('y', 3),
            Card::new('g', 5),
        ];
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &first));
        let record = game
            .process_choice(TurnChoice::Hint(Hint {
                player: 1,
                hinted: Hinted::Color('w'),
            }))
            .unwrap();
        assert_eq!(
            record.result,
            TurnResult::Hint(vec![false, true, true, false, false])
        );
        assert_eq!(game.board.hints_remaining, 7);
        assert_eq!(game.knowledge(6).direct(), &[Hinted::Color('w')]);
        assert_eq!(game.knowledge(5).indirect(), &[Hinted::Color('w')]);
    }

    #[test]
    fn illegal_hints_are_rejected() {
        let mut opts = GameOptions::new(3, Variant::Rainbow);
        opts.allow_empty_hints = false;
        let deck = deck_starting_with(Variant::Rainbow, &[]);
        let mut game = GameState::new(&opts, deck);
        let to_self = TurnChoice::Hint(Hint {
            player: 0,
            hinted: Hinted::Value(1),
        });
        assert!(matches!(
            game.process_choice(to_self),
            Err(GameError::IllegalMove { player: 0, .. })
        ));
        let wild = TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Color(RAINBOW),
        });
        assert!(game.process_choice(wild).is_err());
        assert!(game.process_choice(TurnChoice::Play(9)).is_err());
        game.board.hints_remaining = 0;
        let fine_otherwise = TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Value(1),
        });
        assert!(game.process_choice(fine_otherwise).is_err());
        assert_eq!(game.board.turn, 1);
        assert!(game.board.turn_history.is_empty());
    }

    #[test]
    fn deck_exhaustion_gives_each_player_one_more_turn() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        let mut turns_after_empty = 0;
        while !game.is_over() {
            let deck_was_empty = game.board.deck_size == 0;
            game.process_choice(TurnChoice::Discard(0)).unwrap();
            if deck_was_empty {
                turns_after_empty += 1;
            }
            assert!(game.board.hints_remaining <= 8);
            assert_eq!(conserved(&game), 50);
        }
        assert_eq!(turns_after_empty, 2);
        assert_eq!(game.board.turn_history.len() as u32, game.board.turn - 1);
    }

    #[test]
    fn resignation_ends_the_round() {
        let opts = GameOptions::new(4, Variant::NoVariant);
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        game.process_choice(TurnChoice::Resign).unwrap();
        assert!(game.is_over());
        assert!(game.process_choice(TurnChoice::Discard(0)).is_err());
    }

    #[test]
    fn views_hide_own_cards() {
        let mut opts = GameOptions::new(4, Variant::NoVariant);
        let game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        let view = game.get_view(2);
        assert_eq!(view.hand(0).len(), 4);
        assert!(view.peek_own_hand().is_ok());
        opts.policing = true;
        let policed = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        assert!(matches!(
            policed.get_view(2).peek_own_hand(),
            Err(GameError::OwnHandPeek { player: 2 })
        ));
    }

    #[test]
    #[should_panic(expected = "Cannot query about your own cards!")]
    fn reading_own_hand_panics() {
        let opts = GameOptions::new(4, Variant::NoVariant);
        let game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        game.get_view(1).hand(1);
    }

    #[test]
    fn snapshots_record_hands_before_each_turn() {
        let opts = GameOptions::new(4, Variant::NoVariant);
        let mut game = GameState::new(&opts, deck_starting_with(Variant::NoVariant, &[]));
        let before = game.get_view(1).hand(0);
        game.process_choice(TurnChoice::Discard(2)).unwrap();
        let view = game.get_view(1);
        assert_eq!(view.hand_before(1, 0), before);
        assert_ne!(view.hand(0), before);
        assert_eq!(view.history().len(), 1);
    }
}
