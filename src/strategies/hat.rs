use fnv::FnvHashMap;
use std::collections::VecDeque;
use tracing::trace;

use crate::error::GameError;
use crate::game::*;
use crate::helpers::{highest_value_index, Tally};
use crate::strategies::hat_helpers::*;
use crate::strategy::*;

mod conventions;

use self::conventions::*;

pub const NAME: &str = "hat";

// Hat guessing: every clue is read as a number mod 9, the sum of the
// actions it assigns to each other player. Everybody can compute the
// actions of the others, so each player can recover their own share.
//
// Players in 4 and 5 player games only.
pub struct HatConfig;

impl GameStrategyConfig for HatConfig {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_table(&self, opts: &GameOptions, seats: &[&'static str]) -> Result<(), GameError> {
        if !(4..=5).contains(&opts.num_players) {
            return Err(GameError::PlayerCount {
                strategy: NAME,
                min: 4,
                max: 5,
                found: opts.num_players,
            });
        }
        if opts.hand_size != 4 {
            return Err(GameError::BadOption(format!(
                "{} needs hands of 4 cards, not {}",
                NAME, opts.hand_size
            )));
        }
        if let Some((seat, &other)) = seats.iter().enumerate().find(|(_, &name)| name != NAME) {
            return Err(GameError::IncompatiblePlayer {
                strategy: NAME,
                seat: seat as Player,
                other: other.to_string(),
            });
        }
        Ok(())
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(HatStrategy)
    }
}

pub struct HatStrategy;

impl GameStrategy for HatStrategy {
    fn initialize(&self, player: Player, view: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(HatPlayer::new(player, view))
    }
}

// what a player did after a clue that is still waiting in the queue
#[derive(Debug, Clone, Copy)]
struct Response {
    action: HatAction,
    card: Option<Card>,
    turn: u32,
}

#[derive(Debug, Clone)]
struct QueuedClue {
    // the part of the clue not yet accounted for
    value: ModulusInformation,
    cluer: Player,
    responses: FnvHashMap<Player, Response>,
    // discard pile when the clue was given
    discarded: Discard,
}

pub struct HatPlayer {
    me: Player,
    num_players: u32,
    // a card I was told to discard, kept for when I run out of hints
    useless_card: Option<CardId>,
    given_clues: VecDeque<QueuedClue>,

    // Interpretation of the front clue. Reset whenever a clue is initialized.
    next_player_actions: Vec<HatAction>,
    player_to_card_current: FnvHashMap<Player, (usize, Card)>,
    modified_player: Option<Player>,
    expected_discards: FnvHashMap<Player, HatAction>,
    actions_before_modified: Vec<HatAction>,
    will_be_played: Vec<Card>,
    // fireworks once every play instructed so far has landed; never reset
    clued_progress_current: Progress,

    // What earlier clues already instructed.
    clued_progress: Progress,
    card_to_player: FnvHashMap<Card, Player>,
    player_to_card: FnvHashMap<Player, (usize, Card)>,

    tally: Tally,
}

impl HatPlayer {
    pub fn new(me: Player, view: &PlayerView<'_>) -> HatPlayer {
        let empty = view
            .board
            .opts
            .variant
            .colors()
            .iter()
            .map(|&color| (color, 0))
            .collect::<Progress>();
        HatPlayer {
            me,
            num_players: view.board.opts.num_players,
            useless_card: None,
            given_clues: VecDeque::new(),
            next_player_actions: Vec::new(),
            player_to_card_current: FnvHashMap::default(),
            modified_player: None,
            expected_discards: FnvHashMap::default(),
            actions_before_modified: Vec::new(),
            will_be_played: Vec::new(),
            clued_progress_current: empty.clone(),
            clued_progress: empty,
            card_to_player: FnvHashMap::default(),
            player_to_card: FnvHashMap::default(),
            tally: Tally::new(),
        }
    }

    fn left(&self, player: Player) -> Player {
        (player + 1) % self.num_players
    }

    fn right(&self, player: Player) -> Player {
        (player + self.num_players - 1) % self.num_players
    }

    fn cards_of(&self, view: &PlayerView<'_>, player: Player) -> Vec<Card> {
        if player == self.me {
            Vec::new()
        } else {
            view.hand(player)
        }
    }

    fn card_at(&self, view: &PlayerView<'_>, action: HatAction, player: Player) -> Option<Card> {
        let slot = action.slot()?;
        self.cards_of(view, player).get(slot).copied()
    }

    fn interpret(turn_record: &TurnRecord) -> Option<(HatAction, Option<Card>)> {
        match (turn_record.choice, &turn_record.result) {
            (TurnChoice::Hint(_), _) => Some((HatAction::Hint, None)),
            (TurnChoice::Play(slot), &TurnResult::Play(card, _)) => {
                Some((HatAction::Play(slot), Some(card)))
            }
            (TurnChoice::Discard(slot), &TurnResult::Discard(card)) => {
                Some((HatAction::Discard(slot), Some(card)))
            }
            _ => None,
        }
    }

    fn subtract_from_front(&mut self, value: &ModulusInformation) {
        if let Some(front) = self.given_clues.front_mut() {
            front.value.subtract(value);
        }
    }

    // Hand of `player` when the front clue was given.
    fn recover_hand(&self, view: &PlayerView<'_>, player: Player) -> Vec<Card> {
        let response = self
            .given_clues
            .front()
            .and_then(|clue| clue.responses.get(&player));
        match response {
            Some(response) if response.action != HatAction::Hint => {
                view.hand_before(response.turn, player)
            }
            _ => self.cards_of(view, player),
        }
    }

    /// Records that `action` was assigned to `player`; returns its number.
    fn resolve_clue(
        &mut self,
        action: HatAction,
        card: Option<Card>,
        player: Player,
    ) -> ModulusInformation {
        if let (HatAction::Play(slot), Some(card)) = (action, card) {
            self.player_to_card_current.insert(player, (slot, card));
            // a later clue may already have raised this color
            let height = self.clued_progress_current.entry(card.color).or_insert(0);
            if *height < card.value {
                *height = card.value;
            }
        }
        action.info()
    }

    // The action `player` was assigned, given what they actually did.
    fn clued_action(&self, action: HatAction, card: Option<Card>, player: Player) -> HatAction {
        if self.modified_player == Some(player) {
            return action;
        }
        if let (HatAction::Play(_), Some(card)) = (action, card) {
            if progress_of(&self.clued_progress, card.color) + 1 >= card.value {
                return action;
            }
        }
        // told to discard but gave a clue, or playing into a later clue
        match self.expected_discards.get(&player) {
            Some(&expected) => expected,
            None => action,
        }
    }

    fn resolve_action(
        &mut self,
        action: HatAction,
        card: Option<Card>,
        player: Player,
    ) -> ModulusInformation {
        let clued = self.clued_action(action, card, player);
        self.resolve_clue(clued, card, player)
    }

    /// Works through the queue of received clues. On my turn this stops at
    /// the first clue telling me to play; otherwise the queue is emptied.
    fn resolve_given_clues(&mut self, view: &PlayerView<'_>) -> Result<HatAction, GameError> {
        let my_turn = view.board.player == self.me;
        loop {
            let my_action = match self.given_clues.front() {
                Some(clue) => HatAction::from_number(clue.value.value),
                None => return Ok(HatAction::Hint),
            };
            if my_turn {
                match my_action {
                    HatAction::Play(_) => return Ok(my_action),
                    HatAction::Discard(slot) => {
                        self.useless_card = view.hands()[self.me].get(slot).copied();
                    }
                    HatAction::Hint => {}
                }
            }
            self.finalize_given_clue(view);
            self.given_clues.pop_front();
            let cluer = match self.given_clues.front() {
                Some(clue) => clue.cluer,
                None => return Ok(my_action),
            };
            self.initialize_given_clue(cluer, view)?;
        }
    }

    /// Works out what the clue of `cluer` asks of everyone I can see.
    ///
    /// When I am the cluer this returns the sum of every assigned action
    /// except the modified player's, which the caller still has to choose.
    fn initialize_given_clue(
        &mut self,
        cluer: Player,
        view: &PlayerView<'_>,
    ) -> Result<ModulusInformation, GameError> {
        let me = self.me;
        let n = self.num_players;

        let mut modified = self.left(cluer);
        for _ in 0..n {
            if !self.player_to_card.contains_key(&modified) {
                break;
            }
            modified = self.left(modified);
        }
        self.modified_player = Some(modified);

        self.expected_discards = (0..n)
            .filter(|&player| player != me && player != cluer)
            .map(|player| {
                let hand = self.recover_hand(view, player);
                (player, safe_discard(&hand, &self.clued_progress))
            })
            .collect();

        self.next_player_actions.clear();
        self.player_to_card_current.clear();
        self.actions_before_modified.clear();
        self.will_be_played.clear();

        let discard = match self.given_clues.front() {
            Some(clue) if cluer != me => clue.discarded.clone(),
            _ => view.board.discard.clone(),
        };

        // players after me and after the modified player, latest first
        let mut value = ModulusInformation::zero();
        let mut player = self.right(cluer);
        while player != me && player != modified {
            let action = self.standard_action(cluer, player, &discard, view);
            let card = self.card_at(view, action, player);
            value.add(&self.resolve_clue(action, card, player));
            self.next_player_actions.push(action);
            if let (HatAction::Play(_), Some(card)) = (action, card) {
                self.will_be_played.push(card);
            }
            player = self.right(player);
        }
        self.next_player_actions.reverse();

        let mut player = self.left(cluer);
        if cluer != me {
            // actions already taken in response to this clue
            for _ in 0..n {
                let response = match self
                    .given_clues
                    .front()
                    .and_then(|clue| clue.responses.get(&player))
                {
                    Some(&response) => response,
                    None => break,
                };
                value.add(&self.resolve_action(response.action, response.card, player));
                player = self.left(player);
            }
            if player != view.board.player {
                return Err(GameError::protocol(
                    me,
                    format!(
                        "responses to the clue of player {} stop at player {}, but it is player {}'s turn",
                        cluer, player, view.board.player
                    ),
                ));
            }
            if player == me {
                self.subtract_from_front(&value);
                return Ok(value);
            }
        }

        // plays still owed to earlier clues, up to the modified player
        if is_between_inclusive(player, cluer, modified, n)
            && (player == self.left(me) || player == me)
        {
            for _ in 0..n {
                let (slot, card) = match self.player_to_card.get(&player) {
                    Some(&entry) => entry,
                    None => break,
                };
                let action = HatAction::Play(slot);
                value.add(&action.info());
                self.player_to_card_current.insert(player, (slot, card));
                self.actions_before_modified.push(action);
                player = self.left(player);
            }
            if player != modified {
                return Err(GameError::protocol(
                    me,
                    format!(
                        "instructed plays end at player {}, expected the modified player {}",
                        player, modified
                    ),
                ));
            }
        }

        if cluer == me {
            return Ok(value);
        }
        if is_between_inclusive(modified, cluer, me, n) {
            self.subtract_from_front(&value);
            let remaining = self.given_clues.front().map_or(0, |clue| clue.value.value);
            if self.left(me) == view.board.player && remaining != 0 {
                self.tally.record("someone performed the wrong action");
            }
            return Ok(value);
        }

        // I acted already, so the modified player is still to come
        let mut remaining = match self.given_clues.front() {
            Some(clue) => clue.value,
            None => ModulusInformation::zero(),
        };
        remaining.subtract(&value);
        let action = HatAction::from_number(remaining.value);
        let card = self.card_at(view, action, modified);
        self.resolve_clue(action, card, modified);
        self.actions_before_modified.push(action);
        let mut actions = self.actions_before_modified.clone();
        actions.append(&mut self.next_player_actions);
        self.next_player_actions = actions;
        Ok(value)
    }

    fn finalize_given_clue(&mut self, view: &PlayerView<'_>) {
        let n = self.num_players;
        self.clued_progress = self.clued_progress_current.clone();
        let next_cluer = self
            .given_clues
            .get(1)
            .map_or(view.board.player, |clue| clue.cluer);
        self.player_to_card = match self.given_clues.front() {
            // the next cluer was the last one to clue, and told me to play
            Some(clue) if clue.cluer == next_cluer => FnvHashMap::default(),
            Some(clue) => self
                .player_to_card_current
                .iter()
                .filter(|(&player, _)| !is_between_inclusive(player, clue.cluer, next_cluer, n))
                .map(|(&player, &entry)| (player, entry))
                .collect(),
            None => self.player_to_card_current.clone(),
        };
        self.card_to_player = self
            .player_to_card
            .iter()
            .map(|(&player, &(_, card))| (card, player))
            .collect();
    }

    /// The default instruction for `player`: the lowest wanted play, else a
    /// safe discard, else a clue.
    fn standard_action(
        &self,
        cluer: Player,
        player: Player,
        discard: &Discard,
        view: &PlayerView<'_>,
    ) -> HatAction {
        if let Some(&(slot, _)) = self.player_to_card.get(&player) {
            return HatAction::Play(slot);
        }
        let cards = self.cards_of(view, player);
        let wanted = (0..cards.len())
            .filter(|&index| {
                want_to_play(
                    cluer,
                    player,
                    &self.will_be_played,
                    &self.clued_progress,
                    &self.card_to_player,
                    &cards[index],
                    view.board,
                )
            })
            .collect::<Vec<_>>();
        match choose_play(&cards, wanted, &self.clued_progress, discard) {
            Some(index) => HatAction::Play(index),
            None => safe_discard(&cards, &self.clued_progress),
        }
    }

    fn prepare_modified_action(
        &self,
        view: &PlayerView<'_>,
    ) -> Result<ModifiedContext, GameError> {
        let board = view.board;
        let futureplays = self
            .actions_before_modified
            .iter()
            .chain(self.next_player_actions.iter())
            .filter(|action| action.is_play())
            .count();
        let mut modified_hints = board.hints_remaining as i32 - 1;
        let mut modified_progress = board_progress(board);
        let mut modified_dic = FnvHashMap::default();

        let mut player = self.left(self.me);
        for &action in &self.actions_before_modified {
            if let Some(card) = self.card_at(view, action, player) {
                if card.value == FINAL_VALUE {
                    modified_hints += 1;
                }
                modified_progress.insert(card.color, card.value);
                modified_dic.insert(card, player);
            }
            player = self.left(player);
        }
        if Some(player) != self.modified_player {
            return Err(GameError::protocol(
                self.me,
                format!("plays before the modified player end at player {}", player),
            ));
        }

        let mut futurehints = modified_hints;
        let mut min_futurehints = modified_hints;
        player = self.left(player);
        for &action in &self.next_player_actions {
            match action {
                HatAction::Hint => {
                    futurehints -= 1;
                    min_futurehints = min_futurehints.min(futurehints);
                }
                HatAction::Discard(_) => futurehints += 1,
                HatAction::Play(_) => {
                    if let Some(card) = self.card_at(view, action, player) {
                        if card.value == FINAL_VALUE {
                            futurehints += 1;
                        }
                        modified_progress.insert(card.color, card.value);
                        modified_dic.insert(card, player);
                    }
                }
            }
            player = self.left(player);
        }

        Ok(ModifiedContext {
            futureplays,
            endgame: board.deck_size < board.unplayed_playable_count(),
            modified_hints,
            min_futurehints,
            futurehints,
            modified_progress,
            modified_dic,
        })
    }

    /// The refined action I assign to the first player of my own clue.
    fn modified_action(
        &mut self,
        player: Player,
        ctx: &ModifiedContext,
        view: &PlayerView<'_>,
    ) -> HatAction {
        let cluer = self.me;
        let board = view.board;
        let discard = &board.discard;
        let cards = self.cards_of(view, player);
        let standard = self.standard_action(cluer, player, discard, view);

        if let HatAction::Play(slot) = standard {
            let plays_five = cards.get(slot).map_or(false, |card| card.value == FINAL_VALUE);
            if (ctx.min_futurehints < 0 || ctx.futurehints == 0) && !plays_five {
                // a five gives the hint back
                let five = cards.iter().position(|card| {
                    card.value == FINAL_VALUE && is_playable_on(card, &self.clued_progress)
                });
                if let Some(index) = five {
                    self.tally.record("play 5 instead");
                    return HatAction::Play(index);
                }
                self.tally.record("someone cannot clue, but I have a play");
                if !ctx.endgame {
                    let action = safe_discard(&cards, &self.clued_progress);
                    if action.is_discard() {
                        return action;
                    }
                    let action = self.modified_safe_discard(cluer, player, &cards, view);
                    let action = least_bad_discard(action, &cards, &self.clued_progress, discard);
                    if action.is_discard() {
                        return action;
                    }
                }
            }
            return standard;
        }

        if ctx.modified_hints >= board.opts.num_hints as i32 {
            return HatAction::Hint;
        }

        let standard = if standard == HatAction::Hint {
            self.modified_safe_discard(cluer, player, &cards, view)
        } else {
            standard
        };

        // someone would run out of hints
        if ctx.min_futurehints <= 0 || ctx.futurehints <= 1 {
            let action = least_bad_discard(standard, &cards, &self.clued_progress, discard);
            if action == HatAction::Hint && ctx.modified_hints <= 0 {
                return self.critical_discard(&cards);
            }
            return action;
        }

        if ctx.futureplays == (self.num_players - 2) as usize
            && !self.actions_before_modified.is_empty()
            && ctx.futurehints >= 2
        {
            return HatAction::Hint;
        }

        // a clue could give someone idle a new play
        let mut other = self.left(player);
        for &action in &self.next_player_actions {
            if !action.is_play()
                && self.cards_of(view, other).iter().any(|card| {
                    want_to_play(
                        cluer,
                        other,
                        &[],
                        &ctx.modified_progress,
                        &ctx.modified_dic,
                        card,
                        board,
                    )
                })
            {
                return HatAction::Hint;
            }
            other = self.left(other);
        }

        if standard.is_discard() && (!ctx.endgame || ctx.futureplays == 0) {
            return standard;
        }
        if ctx.futureplays <= 1 && !ctx.endgame {
            return least_bad_discard(standard, &cards, &self.clued_progress, discard);
        }
        // stall in the endgame
        HatAction::Hint
    }

    // Discards that cost the modified player nothing.
    fn modified_safe_discard(
        &self,
        cluer: Player,
        player: Player,
        cards: &[Card],
        view: &PlayerView<'_>,
    ) -> HatAction {
        if let Some(index) = cards.iter().position(|card| self.will_be_played.contains(card)) {
            return HatAction::Discard(index);
        }
        let visible = view
            .board
            .get_players()
            .filter(|&other| other != cluer && other != player)
            .flat_map(|other| self.cards_of(view, other))
            .collect::<Vec<_>>();
        match cards.iter().position(|card| visible.contains(card)) {
            Some(index) => HatAction::Discard(index),
            None => HatAction::Hint,
        }
    }

    // Only reached when every card is critical.
    fn critical_discard(&mut self, cards: &[Card]) -> HatAction {
        self.tally.record("instructing to discard critical card");
        match highest_value_index(cards, 0..cards.len()) {
            Some(index) => HatAction::Discard(index),
            None => HatAction::Hint,
        }
    }

    /// Whether to drop my known useless card instead of giving my clue.
    fn want_to_discard(
        &self,
        modified_action: HatAction,
        prev_plays: &[HatAction],
        ctx: &ModifiedContext,
        view: &PlayerView<'_>,
    ) -> Option<HatAction> {
        let board = view.board;
        let modified = self.modified_player?;
        let distance = ((modified + self.num_players - self.me - 1) % self.num_players) as usize;
        // the modified player had nothing left to do from the previous clue
        let modified_was_idle = prev_plays.len() <= distance;
        if board.hints_remaining == board.opts.num_hints {
            return None;
        }
        let useless = self.useless_card?;
        let slot = view.hands()[self.me].iter().position(|&id| id == useless)?;
        let discard = HatAction::Discard(slot);

        if modified_action.is_play() && (ctx.endgame || modified_was_idle) {
            return None;
        }
        let current_plays = self
            .next_player_actions
            .iter()
            .filter(|action| action.is_play())
            .count();
        if ctx.modified_hints == 0
            || !ctx.endgame
            || board.hints_remaining <= 1
            || current_plays == 0
        {
            return Some(discard);
        }
        None
    }

    // Compares what `player` did with what the last clue I interpreted told them.
    fn check_expected_action(&mut self, player: Player, action: HatAction, view: &PlayerView<'_>) {
        let n = self.num_players;
        let offset = ((player + n - self.me - 1) % n) as usize;
        let expected = match self.next_player_actions.get(offset) {
            Some(&expected) => expected,
            None => return,
        };
        if expected == action || (expected.is_discard() && action == HatAction::Hint) {
            return;
        }
        // hints were at 0 before the discard
        if action.is_discard() && expected == HatAction::Hint && view.board.hints_remaining == 1 {
            self.tally.record("wrong action: discard at 0 clues");
        } else {
            trace!(
                "Player {} expected {:?} from player {}, who did {:?}",
                self.me,
                expected,
                player,
                action
            );
            self.tally.record("player did wrong action at >0 clues");
        }
    }

    fn execute(&mut self, choice: TurnChoice) -> TurnChoice {
        if !matches!(choice, TurnChoice::Play(_)) {
            self.next_player_actions.clear();
        }
        choice
    }

    fn give_clue(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let me = self.me;
        let can_discard = self.modified_player != Some(me);
        let prev_plays = self.next_player_actions.clone();

        let mut value = self.initialize_given_clue(me, view)?;
        let ctx = self.prepare_modified_action(view)?;
        let modified = self
            .modified_player
            .ok_or_else(|| GameError::protocol(me, "no modified player for my clue"))?;
        let action = self.modified_action(modified, &ctx, view);
        trace!(
            "Player {} assigns {:?} to modified player {}, others {:?}",
            me,
            action,
            modified,
            self.next_player_actions
        );
        let card = self.card_at(view, action, modified);
        self.resolve_clue(action, card, modified);
        self.actions_before_modified.push(action);
        let mut actions = self.actions_before_modified.clone();
        actions.append(&mut self.next_player_actions);
        self.next_player_actions = actions;

        if can_discard {
            if let Some(discard) = self.want_to_discard(action, &prev_plays, &ctx, view) {
                self.clued_progress_current = self.clued_progress.clone();
                if let HatAction::Discard(slot) = discard {
                    return Ok(self.execute(TurnChoice::Discard(slot)));
                }
            }
        }

        self.finalize_given_clue(view);
        value.add(&action.info());
        let hint = number_to_clue(value.value, view, &mut self.tally)
            .ok_or_else(|| GameError::protocol(me, "nobody has a card to clue"))?;
        trace!("Player {} encodes {} as {:?}", me, value.value, hint);
        Ok(self.execute(TurnChoice::Hint(hint)))
    }
}

impl PlayerStrategy for HatPlayer {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        let me = self.me;
        let board = view.board;

        if !self.given_clues.is_empty() {
            let action = self.resolve_given_clues(view)?;
            trace!("Player {} was told {:?}", me, action);
            match action {
                HatAction::Play(slot) => return Ok(self.execute(TurnChoice::Play(slot))),
                HatAction::Discard(slot)
                    if board.hints_remaining == 0 || self.modified_player == Some(me) =>
                {
                    if board.hints_remaining != board.opts.num_hints {
                        return Ok(self.execute(TurnChoice::Discard(slot)));
                    }
                    self.tally.record("instructed to discard at 8 clues");
                }
                _ => {}
            }
        }

        if board.hints_remaining == 0 {
            if self.modified_player == Some(me) {
                self.tally.record("instructed to clue with 0 clues");
            }
            let hand = &view.hands()[me];
            let known_useless = self
                .useless_card
                .and_then(|id| hand.iter().position(|&card_id| card_id == id));
            let slot = match known_useless {
                Some(slot) => {
                    self.tally.record("safe discard at 0 clues");
                    slot
                }
                None => {
                    self.tally.record("unsafe discard at 0 clues");
                    hand.len().saturating_sub(1).min(3)
                }
            };
            return Ok(self.execute(TurnChoice::Discard(slot)));
        }

        self.give_clue(view)
    }

    fn update(&mut self, turn_record: &TurnRecord, view: &PlayerView<'_>) -> Result<(), GameError> {
        let player = turn_record.player;
        let (action, card) = match Self::interpret(turn_record) {
            Some(interpreted) => interpreted,
            None => return Ok(()),
        };
        let response = Response {
            action,
            card,
            turn: turn_record.turn,
        };
        for clue in self.given_clues.iter_mut().skip(1) {
            clue.responses.insert(player, response);
        }

        if player == self.me {
            if !action.is_play() {
                return Ok(());
            }
            if let TurnResult::Play(_, false) = turn_record.result {
                self.tally.record("I misplayed");
            }
            self.resolve_clue(action, card, player);
            self.resolve_given_clues(view)?;
            return Ok(());
        }

        if !self.given_clues.is_empty() {
            let number = self.resolve_action(action, card, player);
            self.subtract_from_front(&number);
        } else {
            self.check_expected_action(player, action, view);
            if let Some(&(slot, predicted)) = self.player_to_card.get(&player) {
                self.player_to_card.remove(&player);
                self.card_to_player.remove(&predicted);
                if action != HatAction::Play(slot) {
                    self.tally.record(if action.is_play() {
                        "player played wrong card"
                    } else {
                        "player did not play"
                    });
                    let height = view.board.progress(predicted.color);
                    self.clued_progress_current.insert(predicted.color, height);
                    self.clued_progress.insert(predicted.color, height);
                }
            }
        }

        if let (TurnChoice::Hint(hint), TurnResult::Hint(matches)) =
            (turn_record.choice, &turn_record.result)
        {
            let touched_newest = matches.last().copied().unwrap_or(false);
            let value = clue_to_number(
                player,
                hint.player,
                &hint.hinted,
                touched_newest,
                self.num_players,
            );
            trace!(
                "Player {} reads the clue of player {} as {}",
                self.me,
                player,
                value
            );
            self.given_clues.push_back(QueuedClue {
                value: ModulusInformation::new(ACTION_MODULUS, value),
                cluer: player,
                responses: FnvHashMap::default(),
                discarded: view.board.discard.clone(),
            });
            if self.given_clues.len() == 1 {
                self.initialize_given_clue(player, view)?;
            }
        }
        Ok(())
    }

    fn tally(&self) -> Tally {
        self.tally.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::new_deck;

    fn discard_by_player_zero(game: &mut GameState<'_>) -> TurnRecord {
        game.process_choice(TurnChoice::Discard(1)).unwrap()
    }

    #[test]
    fn deviations_from_the_read_clue_are_tallied() {
        let opts = GameOptions::new(4, Variant::NoVariant);

        let mut game = GameState::new(&opts, new_deck(opts.variant, 9));
        game.board.hints_remaining = 0;
        let mut hat = HatPlayer::new(3, &game.get_view(3));
        hat.next_player_actions = vec![HatAction::Hint];
        let record = discard_by_player_zero(&mut game);
        hat.update(&record, &game.get_view(3)).unwrap();
        assert_eq!(hat.tally().get("wrong action: discard at 0 clues"), 1);
        assert_eq!(hat.tally().get("player did wrong action at >0 clues"), 0);

        let mut game = GameState::new(&opts, new_deck(opts.variant, 9));
        game.board.hints_remaining = 4;
        let mut hat = HatPlayer::new(3, &game.get_view(3));
        hat.next_player_actions = vec![HatAction::Play(0), HatAction::Hint];
        let record = discard_by_player_zero(&mut game);
        hat.update(&record, &game.get_view(3)).unwrap();
        assert_eq!(hat.tally().get("player did wrong action at >0 clues"), 1);
        assert_eq!(hat.tally().get("wrong action: discard at 0 clues"), 0);
    }

    #[test]
    fn expected_actions_are_not_tallied() {
        let opts = GameOptions::new(4, Variant::NoVariant);
        let mut game = GameState::new(&opts, new_deck(opts.variant, 9));
        game.board.hints_remaining = 4;
        let mut hat = HatPlayer::new(3, &game.get_view(3));
        // a clue instead of an allowed discard is fine too
        hat.next_player_actions = vec![HatAction::Discard(1)];
        let record = discard_by_player_zero(&mut game);
        hat.update(&record, &game.get_view(3)).unwrap();
        hat.next_player_actions = vec![HatAction::Discard(1), HatAction::Discard(2)];
        hat.check_expected_action(1, HatAction::Hint, &game.get_view(3));
        assert!(hat.tally().is_empty());
    }
}
